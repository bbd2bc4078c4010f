// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-weather-modbus project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Weather samples read from the JSON log of the weather poller
//!
//! The poller appends one record per observation to a JSON array:
//!
//! ```json
//! [
//!   { "temperature": 29.87, "humidity": 74, "city": "Jakarta", "timestamp": "2025-06-01 10:00:00" }
//! ]
//! ```
//!
//! Only the last record is used. `city` and `timestamp` are optional.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use super::{SourceError, WeatherSample, WeatherSource};

#[derive(Debug, Deserialize)]
struct WeatherRecord {
    temperature: f32,
    humidity: f32,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
}

/// Source reading the last record of a JSON array file
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WeatherSource for JsonFileSource {
    fn latest_sample(&mut self) -> Result<Option<WeatherSample>, SourceError> {
        if !self.path.exists() {
            debug!("Weather data file {:?} does not exist yet", self.path);
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.display().to_string(),
            source,
        })?;

        let records: Vec<serde_json::Value> = serde_json::from_str(&contents)
            .map_err(|e| SourceError::Malformed(format!("{}: {}", self.path.display(), e)))?;

        let Some(last) = records.last() else {
            return Ok(None);
        };

        let record: WeatherRecord = serde_json::from_value(last.clone())
            .map_err(|e| SourceError::Malformed(format!("last record: {}", e)))?;

        debug!(
            "Latest weather record: city={:?} timestamp={:?}",
            record.city, record.timestamp
        );

        Ok(Some(WeatherSample {
            temperature: record.temperature,
            humidity: record.humidity,
        }))
    }

    fn describe(&self) -> String {
        format!("JSON file {}", self.path.display())
    }
}
