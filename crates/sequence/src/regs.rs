//! Register map for the serial divider CSRs and the chip-level blocks the
//! smoke test drives them through.
//!
//! Everything here is a fixed 32-bit-aligned address accessed with full-word
//! reads and writes only. The divider block is defined by this project; the
//! pin-configuration and logic-analyzer blocks belong to the management SoC
//! and are consumed as-is.

use bitflags::bitflags;

// Serial divider CSR block, Wishbone-mapped.
pub const DIVIDEND: u32 = 0x3000_0000;
pub const DIVISOR: u32 = 0x3000_0004;
pub const QUOTIENT: u32 = 0x3000_0008;
pub const REMAINDER: u32 = 0x3000_000C;
pub const DEBUG: u32 = 0x3000_0010;
pub const FINI: u32 = 0x3000_0014;
pub const START: u32 = 0x3000_0018;
pub const SW_BLINKY: u32 = 0x3000_001C;

pub const DIVIDER_BASE: u32 = DIVIDEND;
pub const DIVIDER_SIZE: u32 = 0x20;

// Pin-configuration block: commit register, shared output-data word, then
// one mode register per chip pad.
pub const PIN_CFG_BASE: u32 = 0x2600_0000;
pub const XFER: u32 = PIN_CFG_BASE;
pub const DATAL: u32 = PIN_CFG_BASE + 0x04;
pub const PIN_COUNT: u32 = 38;
pub const PIN_CFG_SIZE: u32 = 0x08 + 4 * PIN_COUNT;

/// Mode-select register for one chip pad.
pub const fn pin_mode(pin: u32) -> u32 {
    PIN_CFG_BASE + 0x08 + 4 * pin
}

// Pad mode encodings understood by the configuration subsystem.
pub const MGMT_STD_OUTPUT: u32 = 0x1809;
pub const USER_STD_OUTPUT: u32 = 0x1808;

// Logic analyzer: four 32-lane channel groups. Data registers first, then
// the enable masks. Enable bit = 1 captures the lane as an input to the
// management core; 0 hands the lane to the core as an output.
pub const LA_BASE: u32 = 0x2500_0000;
pub const LA_CHANNELS: u32 = 4;
pub const LA_SIZE: u32 = 0x20;

pub const fn la_data(channel: u32) -> u32 {
    LA_BASE + 4 * channel
}

pub const fn la_ena(channel: u32) -> u32 {
    LA_BASE + 0x10 + 4 * channel
}

pub const LA_ALL_INPUTS: u32 = 0xFFFF_FFFF;

bitflags! {
    /// Core-driven lanes on LA channel 2 once the smoke test repurposes it:
    /// a software clock and a reset request for the harness clock model.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HarnessLanes: u32 {
        const CLOCK = 1 << 0;
        const RESET = 1 << 1;
    }
}

/// "Harness active" lane on LA channel 1.
pub const ACTIVE_LANE: u32 = 1 << 0;

// Milestone markers the external bench watches for on DATAL.
pub const TEST_START: u32 = 0xAB60_0000;
pub const TEST_PASS: u32 = 0xAB61_0000;

// LED_PERIOD of 10 gives a ~285us blink period on silicon.
pub const LED_PERIOD: u32 = 10;
