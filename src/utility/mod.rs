// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-weather-modbus project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Utility module for common utilities used throughout the project

pub mod logging;

pub use logging::{current_timestamp, init_logger, set_utc_offset, DEFAULT_UTC_OFFSET_HOURS};
