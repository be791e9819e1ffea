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

//! Error taxonomy for the permission tree engine

use thiserror::Error;

/// Errors raised by the engine and its collaborators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The referenced role is not known to the role directory
    #[error("Role not found: {role_id}")]
    NotFound { role_id: String },

    /// The target selection referenced keys that are not leaf routes of the catalog
    #[error("Invalid route keys: {}", keys.join(", "))]
    InvalidRoute { keys: Vec<String> },

    /// The grant store could not be reached or returned an unexpected shape
    #[error("Grant store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// Malformed input
    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

impl CoreError {
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        CoreError::StoreUnavailable { message: message.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::ValidationError { message: message.into() }
    }

    /// Short identifier used in logs and metrics labels
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::NotFound { .. } => "not_found",
            CoreError::InvalidRoute { .. } => "invalid_route",
            CoreError::StoreUnavailable { .. } => "store_unavailable",
            CoreError::ValidationError { .. } => "validation_error",
        }
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::store_unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::store_unavailable(format!("Malformed grant document: {}", err))
    }
}

impl From<toml::de::Error> for CoreError {
    fn from(err: toml::de::Error) -> Self {
        CoreError::validation(format!("Malformed seed file: {}", err))
    }
}

/// Result type for engine operations
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_route_lists_keys() {
        let err = CoreError::InvalidRoute {
            keys: vec!["hr".to_string(), "nope".to_string()],
        };
        assert_eq!(err.to_string(), "Invalid route keys: hr, nope");
        assert_eq!(err.kind(), "invalid_route");
    }

    #[test]
    fn test_io_error_is_store_unavailable() {
        let err: CoreError = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, CoreError::StoreUnavailable { .. }));
    }
}
