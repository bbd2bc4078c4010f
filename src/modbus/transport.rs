// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-weather-modbus project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Client side access to a remote register map
//!
//! The master role talks to the slave through the [`RegisterTransport`] trait:
//! connect, read, write, disconnect, with every failure surfaced as a
//! [`TransportError`]. Two implementations are provided:
//!
//! - [`TcpTransport`]: blocking Modbus TCP client built on the synchronous API of
//!   `tokio-modbus`. It must not be used from inside a tokio runtime.
//! - [`LocalTransport`]: in-process access to a shared [`RegisterMap`] with the
//!   same access rules as the Modbus service.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use thiserror::Error;
use tokio_modbus::client::sync::{self as modbus_sync, Reader, Writer};
use tokio_modbus::{ExceptionCode, Slave};

use crate::config::ModbusConfig;
use crate::modbus::modbus_server::exception_for;
use crate::registers::RegisterMap;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("not connected")]
    NotConnected,

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("exception response: {0}")]
    Exception(ExceptionCode),

    #[error("unexpected response: expected {expected} register(s), got {actual}")]
    ShortResponse { expected: usize, actual: usize },
}

/// Request/response access to a remote register map
#[cfg_attr(test, mockall::automock)]
pub trait RegisterTransport: Send {
    fn connect(&mut self) -> Result<(), TransportError>;

    /// Read `count` registers starting at `addr`.
    fn read(&mut self, addr: u16, count: u16) -> Result<Vec<u16>, TransportError>;

    /// Write a single register.
    fn write(&mut self, addr: u16, value: u16) -> Result<(), TransportError>;

    /// Close the connection. Does nothing when not connected.
    fn disconnect(&mut self);
}

/// Blocking Modbus TCP client
pub struct TcpTransport {
    address: String,
    port: u16,
    slave: Slave,
    timeout: Duration,
    ctx: Option<modbus_sync::Context>,
}

impl TcpTransport {
    pub fn new(address: impl Into<String>, port: u16, unit_id: u8, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            port,
            slave: Slave(unit_id),
            timeout,
            ctx: None,
        }
    }

    pub fn from_config(config: &ModbusConfig) -> Self {
        Self::new(
            config.address.clone(),
            config.port,
            config.unit_id,
            Duration::from_millis(config.timeout_ms),
        )
    }

    fn target(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    fn resolve(&self) -> io::Result<SocketAddr> {
        (self.address.as_str(), self.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "address did not resolve"))
    }

    fn context(&mut self) -> Result<&mut modbus_sync::Context, TransportError> {
        self.ctx.as_mut().ok_or(TransportError::NotConnected)
    }
}

impl RegisterTransport for TcpTransport {
    fn connect(&mut self) -> Result<(), TransportError> {
        if self.ctx.is_some() {
            return Ok(());
        }
        let target = self.target();
        let socket_addr = self.resolve().map_err(|source| TransportError::Connect {
            target: target.clone(),
            source,
        })?;
        let ctx = modbus_sync::tcp::connect_slave_with_timeout(
            socket_addr,
            self.slave,
            Some(self.timeout),
        )
        .map_err(|source| TransportError::Connect { target, source })?;
        debug!("Connected to Modbus server at {}", socket_addr);
        self.ctx = Some(ctx);
        Ok(())
    }

    fn read(&mut self, addr: u16, count: u16) -> Result<Vec<u16>, TransportError> {
        let values = self
            .context()?
            .read_holding_registers(addr, count)
            .map_err(|e| TransportError::Transport(e.to_string()))?
            .map_err(TransportError::Exception)?;
        if values.len() != count as usize {
            return Err(TransportError::ShortResponse {
                expected: count as usize,
                actual: values.len(),
            });
        }
        Ok(values)
    }

    fn write(&mut self, addr: u16, value: u16) -> Result<(), TransportError> {
        self.context()?
            .write_single_register(addr, value)
            .map_err(|e| TransportError::Transport(e.to_string()))?
            .map_err(TransportError::Exception)
    }

    fn disconnect(&mut self) {
        // Dropping the context closes the socket.
        if self.ctx.take().is_some() {
            debug!("Disconnected from {}", self.target());
        }
    }
}

/// In-process transport over a shared register map
#[derive(Debug, Clone)]
pub struct LocalTransport {
    registers: Arc<RegisterMap>,
    connected: bool,
}

impl LocalTransport {
    pub fn new(registers: Arc<RegisterMap>) -> Self {
        Self {
            registers,
            connected: false,
        }
    }
}

impl RegisterTransport for LocalTransport {
    fn connect(&mut self) -> Result<(), TransportError> {
        self.connected = true;
        Ok(())
    }

    fn read(&mut self, addr: u16, count: u16) -> Result<Vec<u16>, TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.registers
            .read_remote(addr, count)
            .map_err(|e| TransportError::Exception(exception_for(e)))
    }

    fn write(&mut self, addr: u16, value: u16) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.registers
            .write_remote(addr, &[value])
            .map_err(|e| TransportError::Exception(exception_for(e)))
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }
}
