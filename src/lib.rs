// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-weather-modbus project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Rust Weather Modbus library
//!
//! Publishes weather readings over Modbus TCP and polls them back:
//!
//! - [`registers`]: the holding register map and its float codec
//! - [`scheduler`]: a cooperative scheduler running periodic tasks
//! - [`roles`]: the slave and master task sets
//! - [`modbus`]: the Modbus TCP server and the master's register transports
//! - [`acquisition`]: weather sample sources feeding the slave
//! - [`daemon`]: wiring of a role into running services

pub mod acquisition;
pub mod config;
pub mod daemon;
pub mod modbus;
pub mod registers;
pub mod roles;
pub mod scheduler;
pub mod utility;

pub use registers::{DeviceStatus, RegisterMap};
pub use roles::{MasterRole, SlaveRole};
pub use scheduler::{Scheduler, StopHandle, TaskHandle};
