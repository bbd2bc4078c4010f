// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-weather-modbus project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Register data model
//!
//! This module provides the in-process holding register map shared by the
//! slave role and its Modbus service, together with the float codec used to
//! spread sensor values across register pairs.
//!
//! ## Register Map
//!
//! | Address | Description | Remote access | Encoding |
//! |---------|-------------|---------------|----------|
//! | 0 | Temperature, high word | read-only | IEEE-754 `f32`, big-endian, paired with 1 |
//! | 1 | Temperature, low word | read-only | - |
//! | 2 | Humidity, high word | read-only | IEEE-754 `f32`, big-endian, paired with 3 |
//! | 3 | Humidity, low word | read-only | - |
//! | 4 | Device status | read-write | 0 = stopped, 1 = running |

pub mod codec;
pub mod map;

pub use codec::{float_to_registers, registers_to_float, round_to_hundredths};
pub use map::{
    DeviceStatus, RegisterError, RegisterMap, HUMIDITY_ADDR, REGISTER_CAPACITY,
    SERVED_REGISTERS, STATUS_ADDR, STATUS_RUNNING, STATUS_STOPPED, TEMPERATURE_ADDR,
};
