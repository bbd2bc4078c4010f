// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-weather-modbus project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use clap::Parser;
use std::error::Error;
use std::net::SocketAddr;
use tokio::time::Duration;
use tokio_modbus::prelude::*;

use rust_weather_modbus::registers::{
    registers_to_float, DeviceStatus, HUMIDITY_ADDR, SERVED_REGISTERS, STATUS_ADDR,
    TEMPERATURE_ADDR,
};

/// One-shot Modbus client printing the weather registers of a slave
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Modbus server address
    #[clap(long, default_value = "127.0.0.1")]
    address: String,

    /// Modbus server port
    #[clap(long, default_value = "5020")]
    port: u16,

    /// Modbus unit identifier
    #[clap(long, default_value = "1")]
    unit_id: u8,

    /// Read the input register mirror instead of the holding registers
    #[clap(long)]
    input: bool,

    /// Write this value to the status register before reading
    #[clap(long)]
    set_status: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    let args = Args::parse();

    let socket_addr: SocketAddr = format!("{}:{}", args.address, args.port).parse()?;
    println!("Connecting to Modbus server at {}", socket_addr);

    let mut ctx = tcp::connect_slave(socket_addr, Slave(args.unit_id)).await?;
    let timeout = Duration::from_secs(1);

    if let Some(status) = args.set_status {
        println!("Writing {} to status register {}", status, STATUS_ADDR);
        tokio::time::timeout(timeout, ctx.write_single_register(STATUS_ADDR, status)).await???;
    }

    let response = if args.input {
        tokio::time::timeout(timeout, ctx.read_input_registers(0, SERVED_REGISTERS)).await???
    } else {
        tokio::time::timeout(timeout, ctx.read_holding_registers(0, SERVED_REGISTERS)).await???
    };
    println!("Raw register values: {:?}", response);

    if response.len() < SERVED_REGISTERS as usize {
        return Err(format!(
            "expected {} registers, got {}",
            SERVED_REGISTERS,
            response.len()
        )
        .into());
    }

    let t = TEMPERATURE_ADDR as usize;
    let h = HUMIDITY_ADDR as usize;
    println!(
        "Registers {}-{}: Temperature = {} °C",
        t,
        t + 1,
        registers_to_float(response[t], response[t + 1])
    );
    println!(
        "Registers {}-{}: Humidity = {} %",
        h,
        h + 1,
        registers_to_float(response[h], response[h + 1])
    );
    let status = response[STATUS_ADDR as usize];
    println!(
        "Register {}: Device Status = {} ({})",
        STATUS_ADDR,
        status,
        DeviceStatus::from_raw(status)
    );

    ctx.disconnect().await?;
    Ok(())
}
