//! Bench manifests: YAML descriptions of how to assemble a bench run —
//! poll budget, model timing and injected faults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_max_poll() -> u32 {
    4096
}

fn default_commit_latency() -> u32 {
    4
}

fn default_divide_latency() -> u32 {
    32
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct PollLimits {
    /// Reads each spin poll may issue before the run is declared stalled.
    #[serde(default = "default_max_poll")]
    pub max_poll_iterations: u32,
}

impl Default for PollLimits {
    fn default() -> Self {
        Self {
            max_poll_iterations: default_max_poll(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Timing {
    /// Bus cycles the pin-config commit takes to auto-clear.
    #[serde(default = "default_commit_latency")]
    pub commit_latency: u32,

    /// Bus cycles from the start pulse to the completion flag.
    #[serde(default = "default_divide_latency")]
    pub divide_latency: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            commit_latency: default_commit_latency(),
            divide_latency: default_divide_latency(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Faults {
    /// LA channel 0 stops mirroring the divisor.
    pub break_default_routing: bool,
    /// The pin-config commit register never auto-clears.
    pub stuck_commit: bool,
    /// The divider never raises its completion flag.
    pub stuck_divider: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct BenchManifest {
    pub schema_version: String,
    #[serde(default)]
    pub limits: PollLimits,
    #[serde(default)]
    pub timing: Timing,
    #[serde(default)]
    pub faults: Faults,
}

impl Default for BenchManifest {
    fn default() -> Self {
        Self {
            schema_version: "1.0".to_string(),
            limits: PollLimits::default(),
            timing: Timing::default(),
            faults: Faults::default(),
        }
    }
}

impl BenchManifest {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open bench manifest at {:?}", path.as_ref()))?;
        let manifest: Self =
            serde_yaml::from_reader(f).context("Failed to parse bench manifest YAML")?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_version != "1.0" {
            anyhow::bail!(
                "Unsupported schema_version '{}'. Supported versions: '1.0'",
                self.schema_version
            );
        }

        if self.limits.max_poll_iterations == 0 {
            anyhow::bail!("Limit 'max_poll_iterations' must be greater than zero");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_manifest() {
        let yaml = r#"
schema_version: "1.0"
limits:
  max_poll_iterations: 256
timing:
  commit_latency: 2
  divide_latency: 16
faults:
  break_default_routing: true
"#;
        let manifest: BenchManifest = serde_yaml::from_str(yaml).unwrap();
        assert!(manifest.validate().is_ok());
        assert_eq!(manifest.limits.max_poll_iterations, 256);
        assert_eq!(manifest.timing.divide_latency, 16);
        assert!(manifest.faults.break_default_routing);
        assert!(!manifest.faults.stuck_commit);
    }

    #[test]
    fn test_sections_default_when_missing() {
        let yaml = r#"
schema_version: "1.0"
"#;
        let manifest: BenchManifest = serde_yaml::from_str(yaml).unwrap();
        assert!(manifest.validate().is_ok());
        assert_eq!(manifest.limits.max_poll_iterations, 4096);
        assert_eq!(manifest.timing.commit_latency, 4);
        assert_eq!(manifest.timing.divide_latency, 32);
        assert!(!manifest.faults.stuck_divider);
    }

    #[test]
    fn test_invalid_version() {
        let yaml = r#"
schema_version: "2.0"
"#;
        let manifest: BenchManifest = serde_yaml::from_str(yaml).unwrap();
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("Unsupported schema_version"));
    }

    #[test]
    fn test_zero_poll_budget() {
        let yaml = r#"
schema_version: "1.0"
limits:
  max_poll_iterations: 0
"#;
        let manifest: BenchManifest = serde_yaml::from_str(yaml).unwrap();
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("max_poll_iterations"));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let yaml = r#"
schema_version: "1.0"
chip: "rv32"
"#;
        assert!(serde_yaml::from_str::<BenchManifest>(yaml).is_err());
    }
}
