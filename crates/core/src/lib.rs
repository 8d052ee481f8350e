//! Host-side bench for the serial divider smoke test.
//!
//! The bench stands in for the simulated SoC: register-accurate models of
//! the divider CSR block, the pin-configuration block and the logic
//! analyzer hang off a dispatching bus, and the unmodified smoke sequence
//! from `serdiv-sequence` runs against them with a budgeted poll so a
//! wedged model fails the test instead of hanging the test process.

pub mod bus;
pub mod peripherals;

use std::any::Any;
use std::sync::atomic::AtomicU32;
use std::sync::Arc;

use serde::Serialize;
use serdiv_config::BenchManifest;
use serdiv_sequence::regs;
use serdiv_sequence::{SmokeTest, Stalled, Verdict};

mod tests;

#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("unmapped register access at {0:#010x}")]
    UnmappedAccess(u32),
    #[error("smoke sequence stalled: {0}")]
    SequenceStalled(Stalled),
}

pub type BenchResult<T> = Result<T, BenchError>;

/// Trait representing a memory-mapped register block.
///
/// The smoke test's bus carries full 32-bit words only, and two of the
/// divider registers have read side effects, so reads take `&mut self`.
pub trait Peripheral: std::fmt::Debug + Send {
    fn read(&mut self, offset: u32) -> u32;
    fn write(&mut self, offset: u32, value: u32);

    /// Advance the model by one bus cycle.
    fn tick(&mut self) {}

    fn as_any(&self) -> Option<&dyn Any> {
        None
    }
    fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        None
    }
}

// Device names used when assembling the bench bus.
pub const DIVIDER_DEV: &str = "serial-divider";
pub const PIN_CFG_DEV: &str = "pin-config";
pub const LA_DEV: &str = "logic-analyzer";

// Model timing out of reset: the configuration subsystem takes a few cycles
// to shift the pad config out, the divider retires one quotient bit per
// clock.
pub const DEFAULT_COMMIT_LATENCY: u32 = 4;
pub const DEFAULT_DIVIDE_LATENCY: u32 = 32;

/// Milestone markers observed on the shared output-data register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    TestStart,
    TestPass,
    Unexpected(u32),
}

impl Milestone {
    fn from_word(word: u32) -> Self {
        match word {
            regs::TEST_START => Milestone::TestStart,
            regs::TEST_PASS => Milestone::TestPass,
            other => Milestone::Unexpected(other),
        }
    }
}

/// What a bench run observed.
#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    pub routing_confirmed: bool,
    pub milestones: Vec<Milestone>,
    pub bus_accesses: usize,
}

pub struct Bench {
    pub bus: bus::BenchBus,
}

impl Bench {
    pub fn new() -> Self {
        Self::with_timing(DEFAULT_COMMIT_LATENCY, DEFAULT_DIVIDE_LATENCY)
    }

    /// Bench with explicit model timing. The routing latch connecting the
    /// divider's DIVISOR output to LA channel 0 is wired here.
    pub fn with_timing(commit_latency: u32, divide_latency: u32) -> Self {
        let routed = Arc::new(AtomicU32::new(0));

        let mut bus = bus::BenchBus::new();
        bus.attach(
            PIN_CFG_DEV,
            regs::PIN_CFG_BASE,
            regs::PIN_CFG_SIZE,
            Box::new(peripherals::pin_config::PinConfigBlock::new(commit_latency)),
        );
        bus.attach(
            LA_DEV,
            regs::LA_BASE,
            regs::LA_SIZE,
            Box::new(peripherals::logic_analyzer::LogicAnalyzer::new(routed.clone())),
        );
        bus.attach(
            DIVIDER_DEV,
            regs::DIVIDER_BASE,
            regs::DIVIDER_SIZE,
            Box::new(peripherals::divider::SerialDivider::new(routed, divide_latency)),
        );

        Self { bus }
    }

    pub fn from_manifest(manifest: &BenchManifest) -> Self {
        let mut bench =
            Self::with_timing(manifest.timing.commit_latency, manifest.timing.divide_latency);
        if manifest.faults.break_default_routing {
            bench.break_default_routing();
        }
        if manifest.faults.stuck_commit {
            bench.stick_commit();
        }
        if manifest.faults.stuck_divider {
            bench.stick_divider();
        }
        bench
    }

    /// Run the smoke sequence once against the models.
    pub fn run_smoke(&mut self, poll_budget: u32) -> BenchResult<BenchReport> {
        tracing::debug!("running smoke sequence, poll budget {poll_budget}");
        let outcome = SmokeTest::with_poll_budget(&mut self.bus, poll_budget).run();

        // An unmapped access during the run outranks the sequence outcome.
        if let Some(fault) = self.bus.take_fault() {
            return Err(fault);
        }

        let verdict = outcome.map_err(BenchError::SequenceStalled)?;
        let report = BenchReport {
            routing_confirmed: verdict == Verdict::RoutingConfirmed,
            milestones: self.milestones(),
            bus_accesses: self.bus.journal().len(),
        };
        tracing::debug!(?report.milestones, "sequence finished");
        Ok(report)
    }

    /// Markers written to DATAL so far, oldest first.
    pub fn milestones(&self) -> Vec<Milestone> {
        self.pin_config()
            .sentinel_log()
            .iter()
            .map(|&word| Milestone::from_word(word))
            .collect()
    }

    // Fault injection.

    /// Sever the default DIVISOR-to-LA0 routing (end-to-end failure path).
    pub fn break_default_routing(&mut self) {
        self.divider_mut().set_route_divisor(false);
    }

    /// The commit register never auto-clears.
    pub fn stick_commit(&mut self) {
        self.pin_config_mut().stick();
    }

    /// The divider never signals completion.
    pub fn stick_divider(&mut self) {
        self.divider_mut().stick();
    }

    // Typed access to the models.

    pub fn divider(&self) -> &peripherals::divider::SerialDivider {
        self.bus.device(DIVIDER_DEV).expect("divider model attached")
    }

    pub fn divider_mut(&mut self) -> &mut peripherals::divider::SerialDivider {
        self.bus.device_mut(DIVIDER_DEV).expect("divider model attached")
    }

    pub fn pin_config(&self) -> &peripherals::pin_config::PinConfigBlock {
        self.bus.device(PIN_CFG_DEV).expect("pin-config model attached")
    }

    pub fn pin_config_mut(&mut self) -> &mut peripherals::pin_config::PinConfigBlock {
        self.bus.device_mut(PIN_CFG_DEV).expect("pin-config model attached")
    }

    pub fn logic_analyzer(&self) -> &peripherals::logic_analyzer::LogicAnalyzer {
        self.bus.device(LA_DEV).expect("LA model attached")
    }
}

impl Default for Bench {
    fn default() -> Self {
        Self::new()
    }
}
