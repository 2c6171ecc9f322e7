//! Service configuration
//!
//! Layered with the `config` crate:
//! 1. built-in defaults
//! 2. an optional TOML file
//! 3. `PARKGATE__<SECTION>__<KEY>` environment variables
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0"
//! port = 8080
//!
//! [data]
//! slots_path = "data/slots.json"
//! distances_path = "data/parking_distances.json"
//!
//! [[pricing]]
//! vehicle_type = "CAR"
//! free_minutes = 60
//! rate_per_hour = 40
//! ```

use crate::error::{Error, Result};
use crate::pricing::{default_rules, PricingRule};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "PARKGATE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default = "default_rules")]
    pub pricing: Vec<PricingRule>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            data: DataSettings::default(),
            pricing: default_rules(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
    pub port: u16,
    pub enable_cors: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8080,
            enable_cors: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// JSON array of slot definitions loaded at startup
    pub slots_path: PathBuf,
    /// JSON array of (gate, slot, distance) records
    pub distances_path: PathBuf,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            slots_path: PathBuf::from("data/slots.json"),
            distances_path: PathBuf::from("data/parking_distances.json"),
        }
    }
}

impl Settings {
    /// Load settings, reading `file` if given
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(::config::File::from(path).required(true));
        }
        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .and_then(|cfg| cfg.try_deserialize::<Settings>())
            .map_err(|e| Error::Config(e.to_string()))
    }

    /// Render the effective settings as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}
