// Routeguard
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Configuration management for the permissions API

use crate::error::{ApiError, ApiResult};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::error;

/// Grant store backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Process-local store, lost on restart
    Memory,
    /// One JSON document per role under the data directory
    File,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreKind::Memory),
            "file" => Ok(StoreKind::File),
            other => Err(format!("Unknown store kind '{}', expected 'memory' or 'file'", other)),
        }
    }
}

/// Configuration for the permissions API
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the HTTP server to
    pub bind_address: String,

    /// Seed file describing the route catalog and roles
    pub seed_path: PathBuf,

    /// Grant store backend
    pub store: StoreKind,

    /// Directory of the file-backed grant store
    pub data_dir: PathBuf,

    /// Maximum request body size in bytes
    pub max_body_size: usize,

    /// Number of commit audit entries kept in memory
    pub audit_capacity: usize,

    /// Serve the generated OpenAPI document
    pub openapi_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            seed_path: PathBuf::from("config/routeguard.toml"),
            store: StoreKind::File,
            data_dir: PathBuf::from("data/grants"),
            max_body_size: 1024 * 1024, // 1MB
            audit_capacity: 1000,
            openapi_enabled: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> ApiResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from a variable lookup, failing on unparsable values
    pub fn from_lookup<F>(lookup: F) -> ApiResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            bind_address: lookup("ROUTEGUARD_BIND_ADDRESS").unwrap_or(defaults.bind_address),

            seed_path: lookup("ROUTEGUARD_SEED_PATH").map(PathBuf::from).unwrap_or(defaults.seed_path),

            store: parse_var(&lookup, "ROUTEGUARD_STORE")?.unwrap_or(defaults.store),

            data_dir: lookup("ROUTEGUARD_DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),

            max_body_size: parse_var(&lookup, "ROUTEGUARD_MAX_BODY_SIZE")?.unwrap_or(defaults.max_body_size),

            audit_capacity: parse_var(&lookup, "ROUTEGUARD_AUDIT_CAPACITY")?.unwrap_or(defaults.audit_capacity),

            openapi_enabled: parse_var(&lookup, "ROUTEGUARD_OPENAPI_ENABLED")?.unwrap_or(defaults.openapi_enabled),
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> ApiResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map(Some).map_err(|e: T::Err| {
            error!("Invalid value for {}: {}", name, e);
            ApiError::ValidationError {
                message: format!("Invalid value '{}' for {}: {}", raw, name, e),
            }
        }),
        None => Ok(None),
    }
}
