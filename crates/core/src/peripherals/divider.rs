//! Model of the serial divider CSR block.
//!
//! Register file behavior mirrors the RTL under test: a divide is kicked by
//! a write to START, retires one quotient bit per bus cycle, and raises
//! FINI when done. QUOTIENT and REMAINDER only accept writes while the
//! debug flag is set, and reading DEBUG clears it. Out of reset the user
//! project routes the DIVISOR value onto LA channel 0; the model publishes
//! it through a shared latch the LA model reads back.

use std::any::Any;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::Peripheral;

#[derive(Debug)]
pub struct SerialDivider {
    dividend: u32,
    divisor: u32,
    quotient: u32,
    remainder: u32,
    debug: u32,
    fini: u32,
    led_on: bool,

    // Cycles left of the in-flight divide; 0 when idle.
    countdown: u32,
    latency: u32,
    stuck: bool,

    route_divisor: bool,
    routed: Arc<AtomicU32>,

    start_pulses: u32,
}

impl SerialDivider {
    pub fn new(routed: Arc<AtomicU32>, latency: u32) -> Self {
        Self {
            dividend: 0,
            divisor: 0,
            quotient: 0,
            remainder: 0,
            debug: 0,
            fini: 0,
            led_on: false,
            countdown: 0,
            latency,
            stuck: false,
            route_divisor: true,
            routed,
            start_pulses: 0,
        }
    }

    fn read_reg(&mut self, offset: u32) -> u32 {
        match offset {
            0x00 => self.dividend,
            0x04 => self.divisor,
            0x08 => self.quotient,
            0x0C => self.remainder,
            0x10 => {
                // Reading the debug flag clears it.
                let value = self.debug;
                self.debug = 0;
                value
            }
            0x14 => self.fini,
            // START is a write-only trigger.
            0x18 => 0,
            0x1C => {
                // Reading the blinky register turns the LED off.
                let value = self.led_on as u32;
                self.led_on = false;
                value
            }
            _ => 0,
        }
    }

    fn write_reg(&mut self, offset: u32, value: u32) {
        match offset {
            0x00 => self.dividend = value,
            0x04 => {
                self.divisor = value;
                if self.route_divisor {
                    self.routed.store(value, Ordering::Relaxed);
                }
            }
            // Result latches are gated by the debug flag.
            0x08 => {
                if self.debug != 0 {
                    self.quotient = value;
                }
            }
            0x0C => {
                if self.debug != 0 {
                    self.remainder = value;
                }
            }
            0x10 => self.debug = value & 1,
            // FINI is read-only.
            0x14 => {}
            0x18 => {
                if value & 1 != 0 {
                    self.fini = 0;
                    self.countdown = self.latency.max(1);
                    self.start_pulses += 1;
                }
            }
            // Any write turns the LED on.
            0x1C => self.led_on = true,
            _ => {}
        }
    }

    fn retire(&mut self) {
        if self.divisor == 0 {
            // Same convention as the management core's own divide unit.
            self.quotient = u32::MAX;
            self.remainder = self.dividend;
        } else {
            self.quotient = self.dividend / self.divisor;
            self.remainder = self.dividend % self.divisor;
        }
        self.fini = 1;
    }

    /// Stop the divide from ever completing.
    pub fn stick(&mut self) {
        self.stuck = true;
    }

    pub fn set_route_divisor(&mut self, route: bool) {
        self.route_divisor = route;
    }

    pub fn quotient(&self) -> u32 {
        self.quotient
    }

    pub fn remainder(&self) -> u32 {
        self.remainder
    }

    pub fn fini(&self) -> u32 {
        self.fini
    }

    pub fn start_pulses(&self) -> u32 {
        self.start_pulses
    }

    pub fn led_on(&self) -> bool {
        self.led_on
    }
}

impl Peripheral for SerialDivider {
    fn read(&mut self, offset: u32) -> u32 {
        self.read_reg(offset)
    }

    fn write(&mut self, offset: u32, value: u32) {
        self.write_reg(offset, value);
    }

    fn tick(&mut self) {
        if self.countdown > 0 && !self.stuck {
            self.countdown -= 1;
            if self.countdown == 0 {
                self.retire();
            }
        }
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(self)
    }

    fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        Some(self)
    }
}
