//! Model of the chip's pin-configuration block.
//!
//! Mode writes land in a staging register per pad. A write-1 to the commit
//! register starts the serial transfer out to the pads; the register reads
//! back 1 until the transfer completes, at which point the staged modes
//! become the applied modes. The block also owns the shared output-data
//! word the smoke test uses for its start/pass markers.

use std::any::Any;

use serdiv_sequence::regs;

use crate::Peripheral;

const PINS: usize = regs::PIN_COUNT as usize;

#[derive(Debug)]
pub struct PinConfigBlock {
    staged: [u32; PINS],
    applied: [u32; PINS],
    datal: u32,
    datal_log: Vec<u32>,

    xfer: u32,
    commit_countdown: u32,
    commit_latency: u32,
    stuck: bool,

    // Commit-register reads observed while a transfer was in flight.
    pending_reads: u32,
}

impl PinConfigBlock {
    pub fn new(commit_latency: u32) -> Self {
        Self {
            staged: [0; PINS],
            applied: [0; PINS],
            datal: 0,
            datal_log: Vec::new(),
            xfer: 0,
            commit_countdown: 0,
            commit_latency,
            stuck: false,
            pending_reads: 0,
        }
    }

    fn pin_index(offset: u32) -> Option<usize> {
        if offset >= 0x08 {
            let index = ((offset - 0x08) / 4) as usize;
            (index < PINS).then_some(index)
        } else {
            None
        }
    }

    /// The commit register never auto-clears.
    pub fn stick(&mut self) {
        self.stuck = true;
    }

    /// Modes latched by the last completed commit.
    pub fn applied_modes(&self) -> &[u32; PINS] {
        &self.applied
    }

    pub fn staged_modes(&self) -> &[u32; PINS] {
        &self.staged
    }

    /// Every value written to DATAL, oldest first.
    pub fn sentinel_log(&self) -> &[u32] {
        &self.datal_log
    }

    pub fn datal(&self) -> u32 {
        self.datal
    }

    pub fn pending_commit_reads(&self) -> u32 {
        self.pending_reads
    }
}

impl Peripheral for PinConfigBlock {
    fn read(&mut self, offset: u32) -> u32 {
        match offset {
            0x00 => {
                if self.xfer == 1 {
                    self.pending_reads += 1;
                }
                self.xfer
            }
            0x04 => self.datal,
            _ => Self::pin_index(offset).map_or(0, |index| self.staged[index]),
        }
    }

    fn write(&mut self, offset: u32, value: u32) {
        match offset {
            0x00 => {
                if value & 1 != 0 {
                    self.xfer = 1;
                    self.commit_countdown = self.commit_latency.max(1);
                }
            }
            0x04 => {
                self.datal = value;
                self.datal_log.push(value);
            }
            _ => {
                if let Some(index) = Self::pin_index(offset) {
                    self.staged[index] = value;
                }
            }
        }
    }

    fn tick(&mut self) {
        if self.xfer == 1 && !self.stuck {
            self.commit_countdown -= 1;
            if self.commit_countdown == 0 {
                self.xfer = 0;
                self.applied = self.staged;
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
