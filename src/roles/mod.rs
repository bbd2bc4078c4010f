// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-weather-modbus project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Slave and master roles
//!
//! - `SlaveRole` owns the register map, refreshes the sensor registers from a
//!   weather source and reports status changes made by remote masters.
//! - `MasterRole` polls a remote register map through a `RegisterTransport` and
//!   periodically toggles the remote status register.

pub mod master;
pub mod slave;

pub use master::{MasterRole, SensorReading};
pub use slave::{SlaveRole, StatusChange};
