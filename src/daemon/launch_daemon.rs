// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-weather-modbus project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time;

use crate::acquisition::{JsonFileSource, SimulatedSource, WeatherSource};
use crate::config::Config;
use crate::modbus::{serve_registers, TcpTransport};
use crate::registers::{RegisterMap, HUMIDITY_ADDR, STATUS_ADDR, TEMPERATURE_ADDR};
use crate::roles::{MasterRole, SlaveRole};
use crate::scheduler::{Scheduler, StopHandle};

/// Runs the background services of one role and shuts them down in order.
///
/// The Modbus listener runs as a tokio task; each scheduler runs on its own OS
/// thread since its control loop blocks.
pub struct Daemon {
    tasks: Vec<JoinHandle<Result<()>>>,
    scheduler_threads: Vec<thread::JoinHandle<()>>,
    stop_handles: Vec<StopHandle>,
    running: Arc<AtomicBool>,
    modbus_addr: Option<SocketAddr>,
    registers: Option<Arc<RegisterMap>>,
}

impl Default for Daemon {
    fn default() -> Self {
        Self::new()
    }
}

impl Daemon {
    /// Create a new daemon instance
    pub fn new() -> Self {
        Daemon {
            tasks: Vec::new(),
            scheduler_threads: Vec::new(),
            stop_handles: Vec::new(),
            running: Arc::new(AtomicBool::new(true)),
            modbus_addr: None,
            registers: None,
        }
    }

    /// Address the Modbus server is bound to, once the slave is launched.
    pub fn modbus_local_addr(&self) -> Option<SocketAddr> {
        self.modbus_addr
    }

    /// Register map served by the slave, once launched.
    pub fn registers(&self) -> Option<&Arc<RegisterMap>> {
        self.registers.as_ref()
    }

    /// Launch the slave: Modbus server plus the weather and status tasks.
    pub async fn launch_slave(&mut self, config: &Config) -> Result<()> {
        let registers = Arc::new(RegisterMap::new());
        let source = weather_source(config);
        info!("Weather samples read from {}", source.describe());

        let role = Arc::new(SlaveRole::new(Arc::clone(&registers), source));
        let mut scheduler = Scheduler::with_quantum(config.scheduler.quantum())?;
        role.register_tasks(
            &mut scheduler,
            config.slave.update_interval()?,
            config.slave.status_check_interval()?,
        )?;

        // Sources may block on file I/O, keep them off the runtime threads.
        info!("Running initial weather data update...");
        let initial = Arc::clone(&role);
        tokio::task::spawn_blocking(move || initial.update_weather_task())
            .await
            .context("Initial weather data update panicked")?;

        self.start_modbus_server(config, Arc::clone(&registers)).await?;
        self.start_scheduler("slave-scheduler", scheduler, |mut scheduler| scheduler.run())?;
        self.registers = Some(registers);
        Ok(())
    }

    /// Launch the master: sensor polling and status toggling tasks.
    pub fn launch_master(&mut self, config: &Config) -> Result<()> {
        info!(
            "Polling Modbus server at {}:{}",
            config.modbus.address, config.modbus.port
        );
        let role = Arc::new(MasterRole::new(TcpTransport::from_config(&config.modbus)));
        let mut scheduler = Scheduler::with_quantum(config.scheduler.quantum())?;
        role.register_tasks(
            &mut scheduler,
            config.master.read_interval()?,
            config.master.toggle_interval()?,
        )?;

        // The transport is blocking and must stay off the tokio runtime, so the
        // initial read and the final disconnect happen on the scheduler thread.
        self.start_scheduler("master-scheduler", scheduler, move |mut scheduler| {
            info!("Running initial sensor read...");
            role.read_sensor_data();
            scheduler.run();
            role.disconnect();
            debug!("Master connection released");
        })?;
        Ok(())
    }

    /// Bind the Modbus listener and serve `registers` until shutdown.
    ///
    /// # Errors
    ///
    /// Fails if the address cannot be resolved or bound.
    async fn start_modbus_server(&mut self, config: &Config, registers: Arc<RegisterMap>) -> Result<()> {
        info!(
            "Starting Modbus TCP server on {}:{}",
            config.modbus.address, config.modbus.port
        );
        info!("Holding Registers:");
        info!("{}-{}: Temperature (float, read-only)", TEMPERATURE_ADDR, TEMPERATURE_ADDR + 1);
        info!("{}-{}: Humidity (float, read-only)", HUMIDITY_ADDR, HUMIDITY_ADDR + 1);
        info!("{}: Device Status (int, read-write)", STATUS_ADDR);

        let listener = TcpListener::bind((config.modbus.address.as_str(), config.modbus.port))
            .await
            .with_context(|| {
                format!(
                    "Failed to bind Modbus server to {}:{}",
                    config.modbus.address, config.modbus.port
                )
            })?;
        self.modbus_addr = Some(listener.local_addr()?);

        let running = self.running.clone();
        let task = tokio::spawn(async move {
            let server_handle = tokio::spawn(async move {
                if let Err(e) = serve_registers(listener, registers).await {
                    error!("Modbus server error: {}", e);
                }
            });

            while running.load(Ordering::SeqCst) {
                time::sleep(Duration::from_millis(200)).await;
            }

            info!("Shutting down Modbus server...");
            server_handle.abort();
            match time::timeout(Duration::from_secs(5), server_handle).await {
                Ok(_) => info!("Modbus server shut down successfully"),
                Err(_) => warn!("Modbus server shutdown timed out, forcing termination"),
            }
            Ok(())
        });

        self.tasks.push(task);
        Ok(())
    }

    /// Hand `scheduler` to `body` on a dedicated thread.
    fn start_scheduler<F>(&mut self, name: &str, scheduler: Scheduler, body: F) -> Result<()>
    where
        F: FnOnce(Scheduler) + Send + 'static,
    {
        self.stop_handles.push(scheduler.stop_handle());
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || body(scheduler))
            .with_context(|| format!("Failed to spawn {} thread", name))?;
        self.scheduler_threads.push(handle);
        Ok(())
    }

    /// Stop all running tasks
    pub fn shutdown(&self) {
        info!("Shutting down daemon tasks");
        self.running.store(false, Ordering::SeqCst);
        for stop in &self.stop_handles {
            stop.stop();
        }
    }

    /// Wait for all tasks and scheduler threads to complete
    pub async fn join(self) -> Result<()> {
        for task in self.tasks {
            match task.await {
                Ok(Err(e)) => error!("Task failed: {:#}", e),
                Err(e) => error!("Task panicked: {}", e),
                Ok(Ok(())) => {}
            }
        }

        let threads = self.scheduler_threads;
        tokio::task::spawn_blocking(move || {
            for handle in threads {
                if handle.join().is_err() {
                    error!("Scheduler thread panicked");
                }
            }
        })
        .await?;
        Ok(())
    }
}

fn weather_source(config: &Config) -> Box<dyn WeatherSource> {
    if config.slave.simulate {
        Box::new(SimulatedSource::default())
    } else {
        Box::new(JsonFileSource::new(Path::new(&config.slave.data_file)))
    }
}
