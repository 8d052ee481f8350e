//! Address-dispatching register bus with a full access journal.

use serde::Serialize;

use serdiv_sequence::MmioBus;

use crate::{BenchError, BenchResult, Peripheral};

pub struct PeripheralEntry {
    pub name: String,
    pub base: u32,
    pub size: u32,
    pub dev: Box<dyn Peripheral>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessKind {
    Read,
    Write,
}

/// One bus transaction. For reads, `value` is what came back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BusAccess {
    pub kind: AccessKind,
    pub addr: u32,
    pub value: u32,
}

pub struct BenchBus {
    pub peripherals: Vec<PeripheralEntry>,
    journal: Vec<BusAccess>,
    fault: Option<BenchError>,
}

impl BenchBus {
    pub fn new() -> Self {
        Self {
            peripherals: Vec::new(),
            journal: Vec::new(),
            fault: None,
        }
    }

    pub fn attach(&mut self, name: &str, base: u32, size: u32, dev: Box<dyn Peripheral>) {
        self.peripherals.push(PeripheralEntry {
            name: name.to_string(),
            base,
            size,
            dev,
        });
    }

    /// Side-door access for tests and tooling: dispatches without
    /// journaling or advancing model time.
    pub fn try_read(&mut self, addr: u32) -> BenchResult<u32> {
        let entry = self.entry_mut(addr)?;
        Ok(entry.dev.read(addr - entry.base))
    }

    pub fn try_write(&mut self, addr: u32, value: u32) -> BenchResult<()> {
        let entry = self.entry_mut(addr)?;
        entry.dev.write(addr - entry.base, value);
        Ok(())
    }

    /// Advance every model by one bus cycle.
    pub fn tick(&mut self) {
        for entry in &mut self.peripherals {
            entry.dev.tick();
        }
    }

    pub fn journal(&self) -> &[BusAccess] {
        &self.journal
    }

    pub fn take_fault(&mut self) -> Option<BenchError> {
        self.fault.take()
    }

    /// Downcast a named model for inspection.
    pub fn device<T: 'static>(&self, name: &str) -> Option<&T> {
        self.peripherals
            .iter()
            .find(|p| p.name == name)?
            .dev
            .as_any()?
            .downcast_ref::<T>()
    }

    pub fn device_mut<T: 'static>(&mut self, name: &str) -> Option<&mut T> {
        self.peripherals
            .iter_mut()
            .find(|p| p.name == name)?
            .dev
            .as_any_mut()?
            .downcast_mut::<T>()
    }

    fn entry_mut(&mut self, addr: u32) -> BenchResult<&mut PeripheralEntry> {
        self.peripherals
            .iter_mut()
            .find(|p| addr >= p.base && addr < p.base + p.size)
            .ok_or(BenchError::UnmappedAccess(addr))
    }
}

impl Default for BenchBus {
    fn default() -> Self {
        Self::new()
    }
}

// The bus the smoke sequence runs on. Every access is journaled and costs
// one model tick; unmapped addresses read as zero and latch a fault for the
// bench to surface after the run.
impl MmioBus for BenchBus {
    fn read(&mut self, addr: u32) -> u32 {
        let value = match self.try_read(addr) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{err}");
                self.fault.get_or_insert(err);
                0
            }
        };
        tracing::trace!("rd [{addr:#010x}] -> {value:#010x}");
        self.journal.push(BusAccess {
            kind: AccessKind::Read,
            addr,
            value,
        });
        self.tick();
        value
    }

    fn write(&mut self, addr: u32, value: u32) {
        if let Err(err) = self.try_write(addr, value) {
            tracing::warn!("{err}");
            self.fault.get_or_insert(err);
        }
        tracing::trace!("wr [{addr:#010x}] <- {value:#010x}");
        self.journal.push(BusAccess {
            kind: AccessKind::Write,
            addr,
            value,
        });
        self.tick();
    }
}
