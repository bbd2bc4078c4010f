// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-weather-modbus project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Slave role: owner of the canonical register map
//!
//! The slave copies the latest weather sample into the sensor registers and
//! watches the status register, which remote masters may write at any time.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use log::{error, info, warn};

use crate::acquisition::WeatherSource;
use crate::registers::{DeviceStatus, RegisterMap};
use crate::scheduler::{Scheduler, SchedulerError, TaskHandle};

/// Transition of the status register observed by the slave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: DeviceStatus,
    pub to: DeviceStatus,
}

pub struct SlaveRole {
    registers: Arc<RegisterMap>,
    source: Mutex<Box<dyn WeatherSource>>,
    last_status: Mutex<DeviceStatus>,
}

impl SlaveRole {
    pub fn new(registers: Arc<RegisterMap>, source: Box<dyn WeatherSource>) -> Self {
        let last_status = registers.get_status();
        Self {
            registers,
            source: Mutex::new(source),
            last_status: Mutex::new(last_status),
        }
    }

    pub fn registers(&self) -> &Arc<RegisterMap> {
        &self.registers
    }

    /// Copy the latest weather sample into registers 0-3.
    ///
    /// Returns `true` when the registers were updated. A missing sample and a
    /// source failure both leave the registers untouched.
    pub fn update_weather_data(&self) -> bool {
        let mut source = self.source.lock().unwrap_or_else(PoisonError::into_inner);
        match source.latest_sample() {
            Ok(Some(sample)) => {
                self.registers.set_temperature(sample.temperature);
                self.registers.set_humidity(sample.humidity);
                info!(
                    "Weather data updated: Temp={}°C, Hum={}%",
                    sample.temperature, sample.humidity
                );
                true
            }
            Ok(None) => {
                warn!("No weather sample available from {}", source.describe());
                false
            }
            Err(e) => {
                error!("Error updating weather data: {}", e);
                false
            }
        }
    }

    /// Scheduled weather refresh. Never fails.
    pub fn update_weather_task(&self) -> bool {
        let updated = self.update_weather_data();
        if updated {
            info!("Weather data updated successfully");
        } else {
            warn!("Failed to update weather data");
        }
        updated
    }

    /// Compare the status register with the last observed value and report
    /// the transition, if any.
    pub fn check_status_changes(&self) -> Option<StatusChange> {
        let current = self.registers.get_status();
        let mut last = self.last_status.lock().unwrap_or_else(PoisonError::into_inner);
        if current == *last {
            return None;
        }
        let change = StatusChange {
            from: *last,
            to: current,
        };
        *last = current;
        info!("Device status changed to: {}", current);
        Some(change)
    }

    /// Register the weather refresh and status watch tasks.
    pub fn register_tasks(
        self: &Arc<Self>,
        scheduler: &mut Scheduler,
        update_interval: Duration,
        status_interval: Duration,
    ) -> Result<(TaskHandle, TaskHandle), SchedulerError> {
        let role = Arc::clone(self);
        let update = scheduler.add_named_task("update_weather", update_interval, move || {
            role.update_weather_task();
            Ok(())
        })?;

        let role = Arc::clone(self);
        let status = scheduler.add_named_task("check_status", status_interval, move || {
            role.check_status_changes();
            Ok(())
        })?;

        Ok((update, status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::{SourceError, WeatherSample};
    use std::collections::VecDeque;

    struct ScriptedSource(VecDeque<Result<Option<WeatherSample>, SourceError>>);

    impl WeatherSource for ScriptedSource {
        fn latest_sample(&mut self) -> Result<Option<WeatherSample>, SourceError> {
            self.0.pop_front().unwrap_or(Ok(None))
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    fn slave(script: Vec<Result<Option<WeatherSample>, SourceError>>) -> SlaveRole {
        SlaveRole::new(
            Arc::new(RegisterMap::new()),
            Box::new(ScriptedSource(script.into())),
        )
    }

    #[test]
    fn test_update_writes_sensor_registers() {
        let role = slave(vec![Ok(Some(WeatherSample {
            temperature: 23.456,
            humidity: 65.0,
        }))]);

        assert!(role.update_weather_task());
        assert_eq!(role.registers().temperature(), 23.46);
        assert_eq!(role.registers().humidity(), 65.0);
        assert_eq!(role.registers().get_status(), DeviceStatus::Stopped);
    }

    #[test]
    fn test_missing_or_broken_samples_keep_previous_values() {
        let role = slave(vec![
            Ok(Some(WeatherSample {
                temperature: 30.0,
                humidity: 50.0,
            })),
            Ok(None),
            Err(SourceError::Malformed("truncated".into())),
        ]);

        assert!(role.update_weather_task());
        assert!(!role.update_weather_task());
        assert!(!role.update_weather_task());
        assert_eq!(role.registers().temperature(), 30.0);
        assert_eq!(role.registers().humidity(), 50.0);
    }

    #[test]
    fn test_status_changes_are_reported_once() {
        let role = slave(vec![]);
        assert_eq!(role.check_status_changes(), None);

        role.registers().write_remote(4, &[1]).unwrap();
        assert_eq!(
            role.check_status_changes(),
            Some(StatusChange {
                from: DeviceStatus::Stopped,
                to: DeviceStatus::Running,
            })
        );
        assert_eq!(role.check_status_changes(), None);

        role.registers().set(4, 9).unwrap();
        assert_eq!(
            role.check_status_changes(),
            Some(StatusChange {
                from: DeviceStatus::Running,
                to: DeviceStatus::Unknown(9),
            })
        );
    }

    #[test]
    fn test_registered_tasks_drive_the_role() {
        let role = Arc::new(slave(vec![Ok(Some(WeatherSample {
            temperature: 18.0,
            humidity: 90.0,
        }))]));
        let mut scheduler = Scheduler::new();
        let (update, status) = role
            .register_tasks(&mut scheduler, Duration::from_secs(5), Duration::from_secs(1))
            .unwrap();

        assert_eq!(scheduler.run_pending(std::time::Instant::now()), 2);
        assert_eq!(role.registers().temperature(), 18.0);
        assert_eq!(scheduler.task_info(&update).unwrap().name, "update_weather");
        assert_eq!(scheduler.task_info(&status).unwrap().interval, Duration::from_secs(1));
    }
}
