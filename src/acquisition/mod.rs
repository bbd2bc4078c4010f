// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-weather-modbus project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Weather sample acquisition
//!
//! This module handles the acquisition of the weather samples that the slave
//! copies into its sensor registers. The samples are produced by an external
//! weather poller; the slave only needs the most recent one.

pub mod json_file;
pub mod simulated;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use json_file::JsonFileSource;
pub use simulated::SimulatedSource;

/// One weather observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    /// Temperature in °C
    pub temperature: f32,
    /// Relative humidity in %
    pub humidity: f32,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read weather data from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed weather data: {0}")]
    Malformed(String),
}

/// Represents a provider of weather samples
pub trait WeatherSource: Send {
    /// Return the most recent sample, or `None` when no sample is available yet.
    fn latest_sample(&mut self) -> Result<Option<WeatherSample>, SourceError>;

    /// Human readable description used in log messages
    fn describe(&self) -> String;
}
