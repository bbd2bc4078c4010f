// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-weather-modbus project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Scheduler and role configuration
//!
//! Task intervals are expressed in seconds and may be fractional. They are
//! converted to durations with [`crate::scheduler::interval_from_secs`], which
//! rejects non-positive values.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::scheduler::{interval_from_secs, SchedulerError, DEFAULT_QUANTUM};
use crate::utility::DEFAULT_UTC_OFFSET_HOURS;

/// Control loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Sleep between two passes of the control loop, in milliseconds.
    pub quantum_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            quantum_ms: DEFAULT_QUANTUM.as_millis() as u64,
        }
    }
}

impl SchedulerConfig {
    pub fn quantum(&self) -> Duration {
        Duration::from_millis(self.quantum_ms)
    }
}

/// Settings of the register-owning role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlaveConfig {
    /// JSON file the weather poller appends its samples to.
    pub data_file: String,

    /// Generate samples instead of reading `data_file`.
    pub simulate: bool,

    /// Seconds between two weather register refreshes.
    pub update_interval_secs: f64,

    /// Seconds between two checks of the status register.
    pub status_check_interval_secs: f64,
}

impl Default for SlaveConfig {
    fn default() -> Self {
        Self {
            data_file: "log/data_weather.json".to_string(),
            simulate: false,
            update_interval_secs: 5.0,
            status_check_interval_secs: 1.0,
        }
    }
}

impl SlaveConfig {
    pub fn update_interval(&self) -> Result<Duration, SchedulerError> {
        interval_from_secs(self.update_interval_secs)
    }

    pub fn status_check_interval(&self) -> Result<Duration, SchedulerError> {
        interval_from_secs(self.status_check_interval_secs)
    }
}

/// Settings of the polling role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterConfig {
    /// Seconds between two reads of the remote registers.
    pub read_interval_secs: f64,

    /// Seconds between two toggles of the remote status register.
    pub toggle_interval_secs: f64,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            read_interval_secs: 5.0,
            toggle_interval_secs: 30.0,
        }
    }
}

impl MasterConfig {
    pub fn read_interval(&self) -> Result<Duration, SchedulerError> {
        interval_from_secs(self.read_interval_secs)
    }

    pub fn toggle_interval(&self) -> Result<Duration, SchedulerError> {
        interval_from_secs(self.toggle_interval_secs)
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Offset from UTC, in hours, of the timestamps written in log lines.
    pub utc_offset_hours: i32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
        }
    }
}
