// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-weather-modbus project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration utilities
//!
//! This module provides utility functions for working with configuration
//! settings, including validation and schema management.

use anyhow::{Context, Result};
use log::debug;

use super::{Config, CONFIG_SCHEMA};

/// Output the embedded JSON schema to the console.
///
/// This function is called when the `--show-config-schema` flag is provided
/// on the command line.
///
/// # Example
///
/// ```bash
/// ./rust_weather_modbus --show-config-schema > config_schema.json
/// ```
pub fn output_config_schema() -> Result<()> {
    let schema: serde_json::Value =
        serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;

    let formatted_schema =
        serde_json::to_string_pretty(&schema).context("Failed to format JSON schema")?;

    println!("{}", formatted_schema);

    Ok(())
}

/// Check if a string is a valid IP address
///
/// Validates that a string represents a valid IPv4 or IPv6 address,
/// or is one of the special values like "localhost" or "0.0.0.0".
pub fn is_valid_ip_address(addr: &str) -> bool {
    if addr.parse::<std::net::IpAddr>().is_ok() {
        return true;
    }

    // Special cases
    matches!(addr, "localhost" | "::" | "::0" | "0.0.0.0")
}

/// Validates the configuration against additional rules that aren't covered by the JSON schema.
///
/// # Validation Rules
///
/// - **Port Range**: the Modbus port must be within 1-65535
/// - **Task Intervals**: every interval must be a positive, finite number of seconds
/// - **Quantum**: the scheduler quantum must be positive
/// - **UTC Offset**: the log timestamp offset must be within -12..=14 hours
/// - **IP Address Format**: a hostname is accepted but logged
pub fn validate_specific_rules(config: &Config) -> Result<()> {
    debug!("Performing additional validation checks");

    if config.modbus.port == 0 {
        anyhow::bail!("Invalid Modbus port number: {}", config.modbus.port);
    }

    if config.modbus.timeout_ms == 0 {
        anyhow::bail!("Modbus timeout must be greater than 0 ms");
    }

    if config.scheduler.quantum_ms == 0 {
        anyhow::bail!("Scheduler quantum must be greater than 0 ms");
    }

    config
        .slave
        .update_interval()
        .context("Invalid slave update_interval_secs")?;
    config
        .slave
        .status_check_interval()
        .context("Invalid slave status_check_interval_secs")?;
    config
        .master
        .read_interval()
        .context("Invalid master read_interval_secs")?;
    config
        .master
        .toggle_interval()
        .context("Invalid master toggle_interval_secs")?;

    if !(-12..=14).contains(&config.logging.utc_offset_hours) {
        anyhow::bail!(
            "Invalid UTC offset: {} hours",
            config.logging.utc_offset_hours
        );
    }

    if !is_valid_ip_address(&config.modbus.address) {
        debug!(
            "Potentially invalid address format: {}",
            config.modbus.address
        );
        // Hostnames are resolved at connection time
    }

    Ok(())
}
