// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-weather-modbus project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Lock-guarded holding register storage
//!
//! The register map is the only state shared between the Modbus connection
//! handlers and the scheduler thread of the slave. Every logical get or set,
//! including the two-word float accessors, happens under one acquisition of the
//! inner `RwLock`, so a reader never observes a float made of an old high word
//! and a new low word.

use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::debug;
use thiserror::Error;

use super::codec::{float_to_registers, registers_to_float};

/// Number of holding registers owned by a map. Addresses past
/// [`SERVED_REGISTERS`] are reserved and always read as zero.
pub const REGISTER_CAPACITY: usize = 10;

/// Start address of the temperature register pair.
pub const TEMPERATURE_ADDR: u16 = 0;

/// Start address of the humidity register pair.
pub const HUMIDITY_ADDR: u16 = 2;

/// Address of the device status register.
pub const STATUS_ADDR: u16 = 4;

/// Number of registers visible to remote callers (addresses `0..SERVED_REGISTERS`).
pub const SERVED_REGISTERS: u16 = 5;

/// Raw status value meaning the device is stopped.
pub const STATUS_STOPPED: u16 = 0;

/// Raw status value meaning the device is running.
pub const STATUS_RUNNING: u16 = 1;

/// Errors raised by register accesses
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("{count} register(s) starting at address {addr} are outside the register map")]
    OutOfRange { addr: u16, count: u16 },

    #[error("register {0} is read-only for remote callers")]
    ReadOnly(u16),

    #[error("status value {0} is not one of 0 (stopped) or 1 (running)")]
    InvalidStatus(u16),
}

/// Decoded value of the status register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    Stopped,
    Running,
    /// Any raw value other than 0 or 1, kept as read.
    Unknown(u16),
}

impl DeviceStatus {
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            STATUS_STOPPED => DeviceStatus::Stopped,
            STATUS_RUNNING => DeviceStatus::Running,
            other => DeviceStatus::Unknown(other),
        }
    }

    pub fn raw(&self) -> u16 {
        match self {
            DeviceStatus::Stopped => STATUS_STOPPED,
            DeviceStatus::Running => STATUS_RUNNING,
            DeviceStatus::Unknown(raw) => *raw,
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceStatus::Stopped => write!(f, "STOPPED"),
            DeviceStatus::Running => write!(f, "RUNNING"),
            DeviceStatus::Unknown(_) => write!(f, "UNKNOWN"),
        }
    }
}

/// Fixed-size holding register map with typed accessors.
///
/// ### Layout
///
/// | Address | Meaning | Remote access |
/// |---------|---------|---------------|
/// | 0-1 | Temperature, `f32` high word first | read-only |
/// | 2-3 | Humidity, `f32` high word first | read-only |
/// | 4 | Device status (0 = stopped, 1 = running) | read-write |
/// | 5-9 | Reserved | none |
///
/// The local accessors (`set`, `set_float`, ...) are used by the slave, which is
/// the sole writer of the sensor registers. The `*_remote` accessors apply the
/// access rules of the table above and back the Modbus service.
#[derive(Debug, Default)]
pub struct RegisterMap {
    registers: RwLock<[u16; REGISTER_CAPACITY]>,
}

impl RegisterMap {
    /// Create a map with every register zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, [u16; REGISTER_CAPACITY]> {
        self.registers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, [u16; REGISTER_CAPACITY]> {
        self.registers.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_range(addr: u16, count: u16, limit: usize) -> Result<(), RegisterError> {
        let end = addr as usize + count as usize;
        if count == 0 || end > limit {
            return Err(RegisterError::OutOfRange { addr, count });
        }
        Ok(())
    }

    /// Read one register.
    pub fn get(&self, addr: u16) -> Result<u16, RegisterError> {
        Self::check_range(addr, 1, REGISTER_CAPACITY)?;
        Ok(self.read_guard()[addr as usize])
    }

    /// Write one register.
    pub fn set(&self, addr: u16, value: u16) -> Result<(), RegisterError> {
        Self::check_range(addr, 1, REGISTER_CAPACITY)?;
        self.write_guard()[addr as usize] = value;
        Ok(())
    }

    /// Read `count` consecutive registers starting at `addr`.
    pub fn read(&self, addr: u16, count: u16) -> Result<Vec<u16>, RegisterError> {
        Self::check_range(addr, count, REGISTER_CAPACITY)?;
        let start = addr as usize;
        Ok(self.read_guard()[start..start + count as usize].to_vec())
    }

    /// Write consecutive registers starting at `addr`. Either every value is
    /// written or none is.
    pub fn write(&self, addr: u16, values: &[u16]) -> Result<(), RegisterError> {
        let count = u16::try_from(values.len()).map_err(|_| RegisterError::OutOfRange {
            addr,
            count: u16::MAX,
        })?;
        Self::check_range(addr, count, REGISTER_CAPACITY)?;
        let start = addr as usize;
        self.write_guard()[start..start + values.len()].copy_from_slice(values);
        Ok(())
    }

    /// Store a float in the register pair starting at `addr`.
    pub fn set_float(&self, addr: u16, value: f32) -> Result<(), RegisterError> {
        Self::check_range(addr, 2, REGISTER_CAPACITY)?;
        let [hi, lo] = float_to_registers(value);
        let mut regs = self.write_guard();
        regs[addr as usize] = hi;
        regs[addr as usize + 1] = lo;
        Ok(())
    }

    /// Read the float stored in the register pair starting at `addr`,
    /// rounded to two decimals.
    pub fn get_float(&self, addr: u16) -> Result<f32, RegisterError> {
        Self::check_range(addr, 2, REGISTER_CAPACITY)?;
        let (hi, lo) = {
            let regs = self.read_guard();
            (regs[addr as usize], regs[addr as usize + 1])
        };
        Ok(registers_to_float(hi, lo))
    }

    pub fn temperature(&self) -> f32 {
        self.get_float(TEMPERATURE_ADDR).unwrap_or_default()
    }

    pub fn set_temperature(&self, value: f32) {
        let [hi, lo] = float_to_registers(value);
        let mut regs = self.write_guard();
        regs[TEMPERATURE_ADDR as usize] = hi;
        regs[TEMPERATURE_ADDR as usize + 1] = lo;
    }

    pub fn humidity(&self) -> f32 {
        self.get_float(HUMIDITY_ADDR).unwrap_or_default()
    }

    pub fn set_humidity(&self, value: f32) {
        let [hi, lo] = float_to_registers(value);
        let mut regs = self.write_guard();
        regs[HUMIDITY_ADDR as usize] = hi;
        regs[HUMIDITY_ADDR as usize + 1] = lo;
    }

    /// Decode the status register. Values outside {0, 1} are reported as
    /// [`DeviceStatus::Unknown`], never coerced.
    pub fn get_status(&self) -> DeviceStatus {
        DeviceStatus::from_raw(self.read_guard()[STATUS_ADDR as usize])
    }

    /// Write the status register. Only 0 and 1 are accepted.
    pub fn set_status(&self, flag: u16) -> Result<(), RegisterError> {
        if flag != STATUS_STOPPED && flag != STATUS_RUNNING {
            return Err(RegisterError::InvalidStatus(flag));
        }
        self.write_guard()[STATUS_ADDR as usize] = flag;
        Ok(())
    }

    /// Copy of the whole register array.
    pub fn snapshot(&self) -> [u16; REGISTER_CAPACITY] {
        *self.read_guard()
    }

    /// Read on behalf of a remote caller. Only addresses below
    /// [`SERVED_REGISTERS`] are visible.
    pub fn read_remote(&self, addr: u16, count: u16) -> Result<Vec<u16>, RegisterError> {
        Self::check_range(addr, count, SERVED_REGISTERS as usize)?;
        self.read(addr, count)
    }

    /// Write on behalf of a remote caller. Only the status register accepts
    /// remote writes, and only with a value of 0 or 1.
    pub fn write_remote(&self, addr: u16, values: &[u16]) -> Result<(), RegisterError> {
        let count = u16::try_from(values.len()).unwrap_or(u16::MAX);
        Self::check_range(addr, count, SERVED_REGISTERS as usize)?;

        // Sensor registers belong to the slave.
        if let Some(offset) = (addr..addr + count).position(|a| a != STATUS_ADDR) {
            return Err(RegisterError::ReadOnly(addr + offset as u16));
        }
        let flag = values[0];
        self.set_status(flag)?;
        debug!("Remote write of status register: {}", flag);
        Ok(())
    }
}
