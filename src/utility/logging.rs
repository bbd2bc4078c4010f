// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-weather-modbus project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Logger setup
//!
//! Log lines carry a wall-clock timestamp in a fixed UTC offset (GMT+7 unless
//! configured otherwise), followed by the level, the target and the message:
//!
//! ```text
//! 2025-06-01 17:00:05 [INFO ] rust_weather_modbus::roles::master - Temp: 29.87°C | Hum: 74% | Status: RUNNING
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicI32, Ordering};

use chrono::{DateTime, FixedOffset, Offset, Utc};
use log::{LevelFilter, SetLoggerError};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Offset applied to log timestamps until the configuration is loaded.
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 7;

static LOG_UTC_OFFSET_HOURS: AtomicI32 = AtomicI32::new(DEFAULT_UTC_OFFSET_HOURS);

/// Change the offset of log timestamps. Takes effect on the next log line.
pub fn set_utc_offset(hours: i32) {
    LOG_UTC_OFFSET_HOURS.store(hours, Ordering::Relaxed);
}

/// Offset currently applied to log timestamps.
pub fn utc_offset() -> i32 {
    LOG_UTC_OFFSET_HOURS.load(Ordering::Relaxed)
}

/// Fixed offset for `hours` east of UTC, or UTC if out of range.
pub fn fixed_offset(hours: i32) -> FixedOffset {
    FixedOffset::east_opt(hours.saturating_mul(3600)).unwrap_or_else(|| Utc.fix())
}

/// Format `instant` in the given UTC offset.
pub fn format_timestamp(instant: DateTime<Utc>, utc_offset_hours: i32) -> String {
    instant
        .with_timezone(&fixed_offset(utc_offset_hours))
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// Current time formatted in the given UTC offset.
pub fn current_timestamp(utc_offset_hours: i32) -> String {
    format_timestamp(Utc::now(), utc_offset_hours)
}

/// Install the global logger.
///
/// The level defaults to `info` and can be changed through `RUST_LOG`; an
/// explicit `level` takes precedence over both. Timestamps use
/// `utc_offset_hours` until [`set_utc_offset`] is called.
pub fn init_logger(utc_offset_hours: i32, level: Option<LevelFilter>) -> Result<(), SetLoggerError> {
    set_utc_offset(utc_offset_hours);
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{:<5}] {} - {}",
                current_timestamp(utc_offset()),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init()
}
