// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-weather-modbus project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Modbus server exposing the weather register map
//!
//! For avoiding confusion with the Modbus master/slave terminology, this module uses
//! the terms "server" and "client" instead. The server is the device that provides data,
//! while the client is the device that requests data.
//!
//! The Modbus master is the device that requests data, while the Modbus slave is the device
//! that provides data. In other words, the Modbus master is here the client and the
//! Modbus slave is here the server.
//!
//! ## Register Map
//!
//! ### Holding Registers
//!
//! | Register Address | Description | Access | Encoding |
//! |-----------------|-------------|--------|----------|
//! | 0 | Temperature (High Word) | read-only | `f32` big-endian, paired with 1 |
//! | 1 | Temperature (Low Word) | read-only | - |
//! | 2 | Humidity (High Word) | read-only | `f32` big-endian, paired with 3 |
//! | 3 | Humidity (Low Word) | read-only | - |
//! | 4 | Device Status | read-write | 0=stopped, 1=running |
//!
//! The input registers mirror the same layout, read-only.
//!
//! ## Exceptions
//!
//! - Reads past register 4 and writes to registers 0-3: `IllegalDataAddress`
//! - Status writes other than 0 or 1: `IllegalDataValue`
//! - Any other function code: `IllegalFunction`

use std::{future, io, net::SocketAddr, sync::Arc};

use log::{debug, error, info};
use tokio::net::TcpListener;
use tokio_modbus::{
    prelude::*,
    server::tcp::{accept_tcp_connection, Server},
};

use crate::registers::{RegisterError, RegisterMap};

/// A Modbus TCP service backed by a shared [`RegisterMap`].
///
/// One service instance is created per client connection; all of them share the
/// same map, whose internal lock serializes the accesses.
#[derive(Debug, Clone)]
pub struct WeatherModbusServer {
    registers: Arc<RegisterMap>,
}

impl tokio_modbus::server::Service for WeatherModbusServer {
    type Request = Request<'static>;
    type Response = Response;
    type Exception = ExceptionCode;
    type Future = future::Ready<Result<Self::Response, Self::Exception>>;

    /// Process a Modbus request and provide a response
    ///
    /// This method handles the following function codes:
    /// - 0x03: Read Holding Registers
    /// - 0x04: Read Input Registers
    /// - 0x06: Write Single Register
    /// - 0x10: Write Multiple Registers
    fn call(&self, req: Self::Request) -> Self::Future {
        debug!("Received Modbus request: {:?}", req);

        let res = match req {
            Request::ReadHoldingRegisters(addr, cnt) => self
                .registers
                .read_remote(addr, cnt)
                .map(Response::ReadHoldingRegisters)
                .map_err(exception_for),
            Request::ReadInputRegisters(addr, cnt) => self
                .registers
                .read_remote(addr, cnt)
                .map(Response::ReadInputRegisters)
                .map_err(exception_for),
            Request::WriteSingleRegister(addr, value) => self
                .registers
                .write_remote(addr, std::slice::from_ref(&value))
                .map(|_| Response::WriteSingleRegister(addr, value))
                .map_err(exception_for),
            Request::WriteMultipleRegisters(addr, values) => self
                .registers
                .write_remote(addr, &values)
                .map(|_| Response::WriteMultipleRegisters(addr, values.len() as u16))
                .map_err(exception_for),
            _ => {
                error!(
                    "Exception::IllegalFunction - Unimplemented function code in request: {req:?}"
                );
                Err(ExceptionCode::IllegalFunction)
            }
        };

        if let Err(e) = &res {
            error!("Modbus request error: {:?}", e);
        }

        future::ready(res)
    }
}

impl WeatherModbusServer {
    pub fn new(registers: Arc<RegisterMap>) -> Self {
        Self { registers }
    }

    pub fn registers(&self) -> &Arc<RegisterMap> {
        &self.registers
    }
}

/// Map a register access failure onto the Modbus exception sent to the client.
pub fn exception_for(err: RegisterError) -> ExceptionCode {
    debug!("Rejected register access: {}", err);
    match err {
        RegisterError::OutOfRange { .. } | RegisterError::ReadOnly(_) => {
            ExceptionCode::IllegalDataAddress
        }
        RegisterError::InvalidStatus(_) => ExceptionCode::IllegalDataValue,
    }
}

/// Serve `registers` on an already bound listener until the future is dropped
/// or the listener fails.
pub async fn serve_registers(listener: TcpListener, registers: Arc<RegisterMap>) -> io::Result<()> {
    let local_addr = listener.local_addr()?;
    info!("Modbus server listening on {}", local_addr);

    let server = Server::new(listener);
    let on_connected = move |stream, socket_addr: SocketAddr| {
        let registers = Arc::clone(&registers);
        async move {
            debug!("Modbus client connected from {}", socket_addr);
            accept_tcp_connection(stream, socket_addr, move |_socket_addr| {
                Ok(Some(WeatherModbusServer::new(Arc::clone(&registers))))
            })
        }
    };
    let on_process_error = |err| {
        error!("Modbus server error: {err}");
    };

    server.serve(&on_connected, on_process_error).await
}
