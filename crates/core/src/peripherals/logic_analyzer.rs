//! Model of the logic-analyzer channel groups.
//!
//! Four 32-lane groups, each with an enable mask and a data register. An
//! enable bit of 1 captures the lane as an input to the management core; 0
//! hands the lane to the core as an output. Reads mix the captured external
//! value on input lanes with the core-driven latch on output lanes. The
//! only externally driven lanes in this bench are channel 0's, fed by the
//! divider's routing latch.

use std::any::Any;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use serdiv_sequence::regs;

use crate::Peripheral;

const CHANNELS: usize = regs::LA_CHANNELS as usize;

#[derive(Debug)]
pub struct LogicAnalyzer {
    ena: [u32; CHANNELS],
    driven: [u32; CHANNELS],
    routed: Arc<AtomicU32>,
}

impl LogicAnalyzer {
    pub fn new(routed: Arc<AtomicU32>) -> Self {
        Self {
            ena: [0; CHANNELS],
            driven: [0; CHANNELS],
            routed,
        }
    }

    fn external(&self, channel: usize) -> u32 {
        // Channel 0 mirrors the user project's divisor output; nothing
        // drives the remaining groups in this bench.
        if channel == 0 {
            self.routed.load(Ordering::Relaxed)
        } else {
            0
        }
    }

    pub fn channel_enable(&self, channel: usize) -> u32 {
        self.ena[channel]
    }

    /// Core-driven output latch for a channel group.
    pub fn driven(&self, channel: usize) -> u32 {
        self.driven[channel]
    }
}

impl Peripheral for LogicAnalyzer {
    fn read(&mut self, offset: u32) -> u32 {
        match offset {
            0x00..=0x0C => {
                let channel = (offset / 4) as usize;
                let ena = self.ena[channel];
                (self.external(channel) & ena) | (self.driven[channel] & !ena)
            }
            0x10..=0x1C => self.ena[((offset - 0x10) / 4) as usize],
            _ => 0,
        }
    }

    fn write(&mut self, offset: u32, value: u32) {
        match offset {
            0x00..=0x0C => self.driven[(offset / 4) as usize] = value,
            0x10..=0x1C => self.ena[((offset - 0x10) / 4) as usize] = value,
            _ => {}
        }
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(self)
    }

    fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        Some(self)
    }
}
