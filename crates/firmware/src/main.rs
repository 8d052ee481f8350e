//! Serial divider smoke-test firmware for the management core.
//!
//! Runs the shared smoke sequence once over raw volatile accesses, then
//! parks. All reporting happens through the register traffic itself: the
//! external bench watches DATAL for the start/pass markers and diagnoses a
//! stalled poll via the simulation timeout.

#![no_std]
#![no_main]
#![allow(clippy::empty_loop)]

use panic_halt as _;
use riscv_rt::entry;

use serdiv_sequence::{MmioBus, SmokeTest};

/// Direct access to the SoC register space. Volatile so every call is one
/// real bus transaction, in program order.
struct Mmio;

impl MmioBus for Mmio {
    fn read(&mut self, addr: u32) -> u32 {
        unsafe { core::ptr::read_volatile(addr as *const u32) }
    }

    fn write(&mut self, addr: u32, value: u32) {
        unsafe {
            core::ptr::write_volatile(addr as *mut u32, value);
        }
    }
}

#[entry]
fn main() -> ! {
    // Unbounded polls on this path: with no budget the driver cannot
    // return Stalled, and the verdict is already on the wire as the pass
    // marker (or its absence).
    let _ = SmokeTest::new(Mmio).run();

    // Nothing left to do; idle here until the harness powers down.
    loop {}
}
