// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-weather-modbus project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration loading failures must reach the log

use std::fs;
use std::sync::Mutex;

use anyhow::Result;
use log::{Level, LevelFilter, Log, Metadata, Record};
use rust_weather_modbus::config::Config;
use tempfile::tempdir;

struct CapturingLogger {
    lines: Mutex<Vec<(Level, String)>>,
}

impl Log for CapturingLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

static LOGGER: CapturingLogger = CapturingLogger {
    lines: Mutex::new(Vec::new()),
};

#[test]
fn test_rejected_config_is_logged_with_sample_location() -> Result<()> {
    log::set_logger(&LOGGER).expect("logger already installed");
    log::set_max_level(LevelFilter::Debug);

    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("bad.yaml");
    fs::write(&config_path, "modbus:\n  port: \"abc\"\n")?;

    assert!(Config::from_file(&config_path).is_err());

    let lines = LOGGER.lines.lock().unwrap_or_else(|e| e.into_inner());
    let errors: Vec<&String> = lines
        .iter()
        .filter(|(level, _)| *level == Level::Error)
        .map(|(_, line)| line)
        .collect();
    assert!(
        errors
            .iter()
            .any(|line| line.contains("Sample configuration file created at")
                && line.contains("bad.sample.yaml")),
        "missing sample location in {:?}",
        errors
    );
    assert!(errors
        .iter()
        .any(|line| line.contains("Configuration validation error")));
    Ok(())
}
