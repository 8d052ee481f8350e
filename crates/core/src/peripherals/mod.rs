pub mod divider;
pub mod logic_analyzer;
pub mod pin_config;
