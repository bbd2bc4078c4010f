// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-weather-modbus project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Modbus TCP configuration
//!
//! This module defines the network settings shared by both roles: the slave
//! binds its server to them and the master connects to them.

use serde::{Deserialize, Serialize};

/// Configuration for the Modbus TCP link.
///
/// # Fields
///
/// * `address` - Address the slave binds to and the master connects to (default: 127.0.0.1)
/// * `port` - TCP port (default: 5020)
/// * `unit_id` - Unit identifier sent by the master (default: 1)
/// * `timeout_ms` - Connect and request timeout of the master, in milliseconds (default: 3000)
///
/// # Example
///
/// ```
/// use rust_weather_modbus::config::ModbusConfig;
///
/// let modbus_config = ModbusConfig {
///     address: "0.0.0.0".to_string(),
///     port: 502,
///     ..Default::default()
/// };
/// assert_eq!(modbus_config.unit_id, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModbusConfig {
    /// Network address of the Modbus server.
    ///
    /// Can be an IPv4/IPv6 address or a hostname. Use "0.0.0.0" on the slave to
    /// bind to all IPv4 interfaces.
    pub address: String,

    /// The TCP port of the Modbus server. Valid range is 1-65535.
    pub port: u16,

    /// Modbus unit identifier used by the master.
    pub unit_id: u8,

    /// Timeout applied by the master to connections and requests.
    pub timeout_ms: u64,
}

impl Default for ModbusConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 5020,
            unit_id: 1,
            timeout_ms: 3000,
        }
    }
}
