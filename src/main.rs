// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-weather-modbus project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Main entry point for the weather Modbus slave and master
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::PathBuf;
use tokio::signal;

use rust_weather_modbus::config::{self, Config};
use rust_weather_modbus::daemon::launch_daemon::Daemon;
use rust_weather_modbus::utility::{init_logger, set_utc_offset, DEFAULT_UTC_OFFSET_HOURS};

/// Weather station exposed over Modbus TCP
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file (YAML format)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to a configuration to validate and exit
    #[arg(long)]
    validate_config: Option<PathBuf>,

    /// Output the configuration schema as JSON and exit
    #[arg(long)]
    show_config_schema: bool,

    /// Modbus server address
    #[arg(long)]
    modbus_address: Option<String>,

    /// Modbus server port
    #[arg(long)]
    modbus_port: Option<u16>,

    /// Enable verbose logging (debug level)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Disable all logging output
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    #[command(subcommand)]
    role: Option<Role>,
}

#[derive(Debug, Subcommand)]
enum Role {
    /// Serve the latest weather sample on the Modbus registers
    Slave {
        /// JSON weather data file
        #[arg(long)]
        data_file: Option<PathBuf>,

        /// Generate weather samples instead of reading the data file
        #[arg(long)]
        simulate: bool,
    },
    /// Poll the slave registers and toggle its status
    Master,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Installed before the configuration is read so that loading errors are
    // logged; the configured offset is applied once known.
    let log_level = if args.quiet {
        Some(log::LevelFilter::Off)
    } else if args.verbose {
        Some(log::LevelFilter::Debug)
    } else {
        None
    };
    init_logger(DEFAULT_UTC_OFFSET_HOURS, log_level)?;

    if args.show_config_schema {
        return config::output_config_schema();
    }

    if let Some(validate_path) = args.validate_config {
        if !validate_path.exists() {
            return Err(anyhow::anyhow!(
                "Configuration file does not exist: {}",
                validate_path.display()
            ));
        }

        Config::from_file(&validate_path)
            .map_err(|err| anyhow::anyhow!("Configuration validation failed: {:#}", err))?;
        println!("Configuration file is valid: {}", validate_path.display());
        return Ok(());
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("config.yaml"));
    let mut config = Config::from_file(&config_path).inspect_err(|err| {
        error!(
            "Failed to load configuration from {}: {:#}",
            config_path.display(),
            err
        )
    })?;

    let (data_file, simulate) = match &args.role {
        Some(Role::Slave {
            data_file,
            simulate,
        }) => (data_file.clone(), simulate.then_some(true)),
        _ => (None, None),
    };
    config.apply_args(
        args.modbus_address.clone(),
        args.modbus_port,
        data_file,
        simulate,
    );
    config.validate()?;

    set_utc_offset(config.logging.utc_offset_hours);

    let mut daemon = Daemon::new();
    match args.role {
        Some(Role::Master) => {
            info!("Starting Modbus master");
            daemon.launch_master(&config)?;
        }
        Some(Role::Slave { .. }) | None => {
            info!("Starting Modbus slave");
            daemon.launch_slave(&config).await?;
        }
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal, terminating"),
        Err(err) => eprintln!("Error waiting for shutdown signal: {}", err),
    }
    daemon.shutdown();
    daemon.join().await?;

    Ok(())
}
