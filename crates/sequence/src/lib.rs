//! Smoke-test protocol for the serial divider peripheral.
//!
//! The sequence is one forward-only pass: configure every chip pad as an
//! output, commit, arm the logic analyzer, flag the start of the test, run
//! one divide through the CSRs, probe the debug write-gate, then confirm the
//! default divisor routing and flag the pass. The only control flow is the
//! two spin polls (pin-config commit, divide completion) and the single
//! branch on the routing check.
//!
//! The driver is generic over [`MmioBus`] so the identical protocol runs on
//! bare metal (volatile pointer accesses, unbounded polls) and under the
//! host-side bench (peripheral models, budgeted polls).

#![no_std]

pub mod regs;

use core::fmt;

use regs::HarnessLanes;

// Operands for the one divide the smoke test issues.
pub const SMOKE_DIVIDEND: u32 = 0x40;
pub const SMOKE_DIVISOR: u32 = 0x8;

// Patterns pushed at the result registers to probe the debug write-gate.
pub const REMAINDER_PROBE: u32 = 0x0101_0101;
pub const QUOTIENT_PROBE: u32 = 0x0202_0202;

// Pattern whose appearance on LA channel 0 confirms the default routing.
pub const ROUTING_PROBE: u32 = 0x0404_0404;

/// Full-word access to the memory-mapped register space.
///
/// Implementations must issue exactly one bus transaction per call; the
/// protocol depends on every access reaching the hardware, in order.
pub trait MmioBus {
    fn read(&mut self, addr: u32) -> u32;
    fn write(&mut self, addr: u32, value: u32);
}

impl<T: MmioBus + ?Sized> MmioBus for &mut T {
    fn read(&mut self, addr: u32) -> u32 {
        (**self).read(addr)
    }

    fn write(&mut self, addr: u32, value: u32) {
        (**self).write(addr, value)
    }
}

/// Which spin poll the sequence was in when its budget ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallPoint {
    ConfigCommit,
    DivideCompletion,
}

/// A budgeted poll exhausted its budget without seeing the awaited value.
///
/// Only bench runs carry a budget; on bare metal a stall is an infinite
/// spin, diagnosed externally by the simulation timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stalled(pub StallPoint);

impl fmt::Display for Stalled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            StallPoint::ConfigCommit => f.write_str("pin-config commit never cleared"),
            StallPoint::DivideCompletion => f.write_str("divider never signalled completion"),
        }
    }
}

/// Outcome of the final routing check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    RoutingConfirmed,
    RoutingMismatch,
}

pub struct SmokeTest<B: MmioBus> {
    bus: B,
    poll_budget: Option<u32>,
}

impl<B: MmioBus> SmokeTest<B> {
    /// Driver with unbounded polls, for the bare-metal path.
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            poll_budget: None,
        }
    }

    /// Driver whose polls give up after `budget` reads, for bench runs
    /// where a wedged peripheral must fail the test instead of hanging the
    /// test process.
    pub fn with_poll_budget(bus: B, budget: u32) -> Self {
        Self {
            bus,
            poll_budget: Some(budget),
        }
    }

    pub fn run(mut self) -> Result<Verdict, Stalled> {
        self.configure_pins();
        self.commit_pin_config()?;
        self.arm_logic_analyzer();

        // Flag start of the test.
        self.bus.write(regs::DATAL, regs::TEST_START);

        self.repurpose_harness_lanes();
        self.divide(SMOKE_DIVIDEND, SMOKE_DIVISOR)?;
        self.probe_debug_gate();

        #[cfg(feature = "sw-blinky")]
        self.blink_heartbeat();

        let verdict = self.check_default_routing();
        if verdict == Verdict::RoutingConfirmed {
            self.bus.write(regs::DATAL, regs::TEST_PASS);
        }
        Ok(verdict)
    }

    /// Every pad is driven as an output so the external bench can watch the
    /// start/pass markers. Pads 37..16 belong to the management core, the
    /// rest to the user project.
    fn configure_pins(&mut self) {
        for pin in (16..regs::PIN_COUNT).rev() {
            self.bus.write(regs::pin_mode(pin), regs::MGMT_STD_OUTPUT);
        }
        for pin in (0..16).rev() {
            self.bus.write(regs::pin_mode(pin), regs::USER_STD_OUTPUT);
        }
    }

    /// Write-1 the commit register, then spin until the subsystem clears it.
    fn commit_pin_config(&mut self) -> Result<(), Stalled> {
        self.bus.write(regs::XFER, 1);
        self.poll_until(regs::XFER, 0, StallPoint::ConfigCommit)
    }

    /// Capture every LA lane as an input to start from a known state.
    fn arm_logic_analyzer(&mut self) {
        for channel in 0..regs::LA_CHANNELS {
            self.bus.write(regs::la_ena(channel), regs::LA_ALL_INPUTS);
        }
    }

    /// Flip lanes 64/65 to core-driven clock/reset-request, raise both, then
    /// assert the active lane on channel 1. This parks the external circuit
    /// in a known state before the CSR traffic starts.
    fn repurpose_harness_lanes(&mut self) {
        self.bus
            .write(regs::la_ena(2), !HarnessLanes::all().bits());
        self.bus
            .write(regs::la_data(2), (HarnessLanes::CLOCK | HarnessLanes::RESET).bits());
        self.bus.write(regs::la_data(1), regs::ACTIVE_LANE);
    }

    /// One divide through the CSRs: load operands, pulse start, spin on the
    /// completion flag, fetch both results.
    fn divide(&mut self, dividend: u32, divisor: u32) -> Result<(), Stalled> {
        self.bus.write(regs::DIVIDEND, dividend);
        self.bus.write(regs::DIVISOR, divisor);
        self.bus.write(regs::START, 1);
        self.poll_until(regs::FINI, 1, StallPoint::DivideCompletion)?;

        // Results are discarded; the reads themselves exercise the CSR path.
        let _ = self.bus.read(regs::QUOTIENT);
        let _ = self.bus.read(regs::REMAINDER);
        Ok(())
    }

    /// Result registers only accept writes while the debug flag is set, and
    /// reading the flag clears it. Push the probe patterns once gated, once
    /// gated-open, then clear the flag by reading it back.
    fn probe_debug_gate(&mut self) {
        // Debug clear: the peripheral drops these.
        self.bus.write(regs::REMAINDER, REMAINDER_PROBE);
        self.bus.write(regs::QUOTIENT, QUOTIENT_PROBE);

        self.bus.write(regs::DEBUG, 1);

        // Debug set: the same writes land.
        self.bus.write(regs::QUOTIENT, QUOTIENT_PROBE);
        self.bus.write(regs::REMAINDER, REMAINDER_PROBE);

        let _ = self.bus.read(regs::DEBUG);
    }

    /// Out of reset the user project routes DIVISOR onto LA channel 0;
    /// push a pattern through and look for it on the capture side.
    fn check_default_routing(&mut self) -> Verdict {
        self.bus.write(regs::DIVISOR, ROUTING_PROBE);
        if self.bus.read(regs::la_data(0)) == ROUTING_PROBE {
            Verdict::RoutingConfirmed
        } else {
            Verdict::RoutingMismatch
        }
    }

    /// Two on/off periods of the software LED, clocking the harness lane in
    /// step. A write to SW_BLINKY lights the LED, a read turns it off; the
    /// toggling also de-asserts the reset request raised earlier.
    #[cfg(feature = "sw-blinky")]
    fn blink_heartbeat(&mut self) {
        let mut clk = 0u32;
        for _ in 0..2 {
            self.bus.write(regs::SW_BLINKY, 1);
            for _ in 0..regs::LED_PERIOD / 2 {
                clk ^= HarnessLanes::CLOCK.bits();
                self.bus.write(regs::la_data(2), clk);
            }

            let _ = self.bus.read(regs::SW_BLINKY);
            for _ in 0..regs::LED_PERIOD / 2 {
                clk ^= HarnessLanes::CLOCK.bits();
                self.bus.write(regs::la_data(2), clk);
            }
        }
    }

    fn poll_until(&mut self, addr: u32, expect: u32, point: StallPoint) -> Result<(), Stalled> {
        match self.poll_budget {
            None => {
                while self.bus.read(addr) != expect {}
                Ok(())
            }
            Some(budget) => {
                for _ in 0..budget {
                    if self.bus.read(addr) == expect {
                        return Ok(());
                    }
                }
                Err(Stalled(point))
            }
        }
    }
}
