// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-weather-modbus project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::Result;
use rust_weather_modbus::config::{Config, ModbusConfig, SlaveConfig};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn test_config_load_and_save() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");

    let config = Config {
        modbus: ModbusConfig {
            address: "192.168.1.10".to_string(),
            port: 1502,
            unit_id: 3,
            timeout_ms: 500,
        },
        slave: SlaveConfig {
            data_file: "weather.json".to_string(),
            simulate: true,
            update_interval_secs: 2.5,
            status_check_interval_secs: 0.5,
        },
        ..Config::default()
    };

    config.save_to_file(&config_path)?;
    let loaded_config = Config::from_file(&config_path)?;
    assert_eq!(loaded_config, config);
    assert_eq!(
        loaded_config.slave.update_interval()?,
        Duration::from_millis(2500)
    );

    // A missing file is created with the defaults
    let non_existent_path = temp_dir.path().join("non_existent.yaml");
    let default_config = Config::from_file(&non_existent_path)?;
    assert!(non_existent_path.exists());
    assert_eq!(default_config, Config::default());

    Ok(())
}

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.modbus.address, "127.0.0.1");
    assert_eq!(config.modbus.port, 5020);
    assert_eq!(config.scheduler.quantum(), Duration::from_millis(100));
    assert_eq!(config.slave.data_file, "log/data_weather.json");
    assert_eq!(config.slave.update_interval_secs, 5.0);
    assert_eq!(config.slave.status_check_interval_secs, 1.0);
    assert_eq!(config.master.read_interval_secs, 5.0);
    assert_eq!(config.master.toggle_interval_secs, 30.0);
    assert_eq!(config.logging.utc_offset_hours, 7);
}

#[test]
fn test_partial_file_uses_defaults() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(
        &config_path,
        "modbus:\n  port: 1502\nmaster:\n  toggle_interval_secs: 10\n",
    )?;

    let config = Config::from_file(&config_path)?;
    assert_eq!(config.modbus.port, 1502);
    assert_eq!(config.modbus.address, "127.0.0.1");
    assert_eq!(config.master.toggle_interval(), Ok(Duration::from_secs(10)));
    assert_eq!(config.master.read_interval_secs, 5.0);
    Ok(())
}

#[test]
fn test_apply_args() {
    let mut config = Config::default();

    config.apply_args(None, None, None, None);
    assert_eq!(config, Config::default());

    config.apply_args(
        Some("0.0.0.0".to_string()),
        Some(502),
        Some(PathBuf::from("/tmp/weather.json")),
        Some(true),
    );
    assert_eq!(config.modbus.address, "0.0.0.0");
    assert_eq!(config.modbus.port, 502);
    assert_eq!(config.slave.data_file, "/tmp/weather.json");
    assert!(config.slave.simulate);
}

#[test]
fn test_config_validation() {
    assert!(Config::default().validate().is_ok());

    let mut invalid_port = Config::default();
    invalid_port.modbus.port = 0;
    assert!(invalid_port.validate().is_err());

    let mut invalid_interval = Config::default();
    invalid_interval.master.read_interval_secs = -1.0;
    assert!(invalid_interval.validate().is_err());

    let mut invalid_offset = Config::default();
    invalid_offset.logging.utc_offset_hours = 20;
    assert!(invalid_offset.validate().is_err());
}
