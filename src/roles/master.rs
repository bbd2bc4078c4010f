// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-weather-modbus project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Master role: polls a remote register map
//!
//! Every operation is one connect / request / disconnect unit of work, so a
//! slave restart between two ticks never leaves the master with a dead socket.
//!
//! The status toggle is tracked locally: the master flips the value it last
//! wrote and never reads the remote status back first. If the slave's status is
//! changed by someone else, the master keeps alternating from its own last
//! write and may disagree with the remote state until its next toggle.

use std::fmt;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{error, info};

use crate::modbus::{RegisterTransport, TransportError};
use crate::registers::{
    registers_to_float, DeviceStatus, HUMIDITY_ADDR, STATUS_ADDR, STATUS_RUNNING,
    STATUS_STOPPED, TEMPERATURE_ADDR,
};
use crate::scheduler::{Scheduler, SchedulerError, TaskHandle};

/// Decoded content of the remote register map
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub temperature: f32,
    pub humidity: f32,
    pub status: DeviceStatus,
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Temp: {}°C | Hum: {}% | Status: {}",
            self.temperature, self.humidity, self.status
        )
    }
}

pub struct MasterRole<T: RegisterTransport> {
    transport: Mutex<T>,
    status_toggle: AtomicU16,
}

impl<T: RegisterTransport> MasterRole<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Mutex::new(transport),
            status_toggle: AtomicU16::new(STATUS_STOPPED),
        }
    }

    fn transport(&self) -> MutexGuard<'_, T> {
        self.transport.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Last status value written (or about to be written) by this master.
    pub fn last_written_status(&self) -> DeviceStatus {
        DeviceStatus::from_raw(self.status_toggle.load(Ordering::SeqCst))
    }

    fn fetch_reading(transport: &mut T) -> Result<SensorReading, TransportError> {
        let sensors = transport.read(TEMPERATURE_ADDR, 4)?;
        let status = transport.read(STATUS_ADDR, 1)?;
        let (Some(sensors), Some(&status)) = (sensors.get(..4), status.first()) else {
            return Err(TransportError::ShortResponse {
                expected: 5,
                actual: sensors.len() + status.len(),
            });
        };
        let t = TEMPERATURE_ADDR as usize;
        let h = HUMIDITY_ADDR as usize;
        Ok(SensorReading {
            temperature: registers_to_float(sensors[t], sensors[t + 1]),
            humidity: registers_to_float(sensors[h], sensors[h + 1]),
            status: DeviceStatus::from_raw(status),
        })
    }

    /// Read and log the remote sensor registers and device status.
    ///
    /// Returns `None` when the slave cannot be reached or answers with an error.
    pub fn read_sensor_data(&self) -> Option<SensorReading> {
        let mut transport = self.transport();
        if let Err(e) = transport.connect() {
            error!("Failed to connect to Modbus server: {}", e);
            return None;
        }

        let result = Self::fetch_reading(&mut transport);
        transport.disconnect();

        match result {
            Ok(reading) => {
                info!("{}", reading);
                Some(reading)
            }
            Err(e) => {
                error!("Error reading sensor data: {}", e);
                None
            }
        }
    }

    /// Flip the locally tracked status and write it to the remote status register.
    ///
    /// The toggle flips even when the write fails, so the next call tries the
    /// other value.
    pub fn toggle_device_status(&self) -> Result<DeviceStatus, TransportError> {
        let previous = self
            .status_toggle
            .fetch_xor(STATUS_RUNNING, Ordering::SeqCst);
        let new_status = DeviceStatus::from_raw(previous ^ STATUS_RUNNING);

        let mut transport = self.transport();
        if let Err(e) = transport.connect() {
            error!("Failed to connect to Modbus server for control: {}", e);
            return Err(e);
        }
        let result = transport.write(STATUS_ADDR, new_status.raw());
        transport.disconnect();

        match result {
            Ok(()) => {
                info!("Device status toggled to: {}", new_status);
                Ok(new_status)
            }
            Err(e) => {
                error!("Failed to toggle device status to {}: {}", new_status, e);
                Err(e)
            }
        }
    }

    /// Release the connection, if any.
    pub fn disconnect(&self) {
        self.transport().disconnect();
    }
}

impl<T: RegisterTransport + 'static> MasterRole<T> {
    /// Register the polling and toggling tasks.
    pub fn register_tasks(
        self: &Arc<Self>,
        scheduler: &mut Scheduler,
        read_interval: Duration,
        toggle_interval: Duration,
    ) -> Result<(TaskHandle, TaskHandle), SchedulerError> {
        let role = Arc::clone(self);
        let read = scheduler.add_named_task("read_sensor_data", read_interval, move || {
            role.read_sensor_data();
            Ok(())
        })?;

        let role = Arc::clone(self);
        let toggle = scheduler.add_named_task("toggle_device_status", toggle_interval, move || {
            // Failures are already logged by the role.
            role.toggle_device_status().ok();
            Ok(())
        })?;

        Ok((read, toggle))
    }
}
