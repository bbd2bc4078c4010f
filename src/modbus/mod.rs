// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-weather-modbus project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Modbus communication module
//!
//! This module provides the Modbus TCP server that exposes the weather register
//! map, and the client side transports used by the master role to reach it.
//!
//! ## Key Components
//!
//! - `WeatherModbusServer`: the service answering Modbus requests from the
//!   shared register map.
//! - `serve_registers`: runs the TCP server on a bound listener.
//! - `RegisterTransport`: connect / read / write / disconnect contract used by
//!   the master, implemented by `TcpTransport` and `LocalTransport`.

pub mod modbus_server;
pub mod transport;

pub use modbus_server::{exception_for, serve_registers, WeatherModbusServer};
pub use transport::{LocalTransport, RegisterTransport, TcpTransport, TransportError};

#[cfg(test)]
pub use transport::MockRegisterTransport;
