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

//! Error handling for the permissions API
//! Implements RFC 7807 Problem Details format

use http_body_util::Full;
use hyper::{Response, StatusCode, body::Bytes};
use routeguard_core::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{error, warn};

const PROBLEM_BASE_URI: &str = "https://routeguard.synerthink.dev/problems";

/// API error types following REST conventions
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Method not allowed: {message}")]
    MethodNotAllowed { message: String },

    #[error("Invalid route keys: {}", keys.join(", "))]
    InvalidRoute { keys: Vec<String> },

    #[error("Payload too large: {message}")]
    PayloadTooLarge { message: String },

    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    #[error("Serde JSON error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    HttpError(String),
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::InvalidRoute { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type identifier
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::BadRequest { .. } => "bad_request",
            ApiError::ValidationError { .. } => "validation_error",
            ApiError::NotFound { .. } => "not_found",
            ApiError::MethodNotAllowed { .. } => "method_not_allowed",
            ApiError::InvalidRoute { .. } => "invalid_route",
            ApiError::PayloadTooLarge { .. } => "payload_too_large",
            ApiError::ServiceUnavailable { .. } => "store_unavailable",
            ApiError::SerdeJsonError(_) => "json_error",
            ApiError::IoError(_) => "io_error",
            ApiError::HttpError(_) => "http_error",
        }
    }

    /// Render the error as a problem details response for `instance`
    pub fn into_response(self, instance: &str) -> Response<Full<Bytes>> {
        let status_code = self.status_code();
        let problem_details = ProblemDetails::new(&self, instance.to_string());

        if status_code.is_server_error() {
            error!("API Error: {} - {}", status_code, self);
        } else {
            warn!("API Error: {} - {}", status_code, self);
        }

        let json = match serde_json::to_string(&problem_details) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize error response: {}", e);
                format!(
                    r#"{{"type":"{}/internal_server_error","title":"Internal Server Error","status":500,"detail":"An internal error occurred","instance":"/"}}"#,
                    PROBLEM_BASE_URI
                )
            }
        };

        Response::builder()
            .status(status_code)
            .header("content-type", "application/problem+json")
            .header("cache-control", "no-cache")
            .body(Full::new(Bytes::from(json)))
            .unwrap_or_else(|e| {
                error!("Failed to build error response: {}", e);
                let mut response = Response::new(Full::new(Bytes::from("Internal Server Error")));
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                response
            })
    }
}

/// RFC 7807 Problem Details response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// A URI reference that identifies the problem type
    #[serde(rename = "type")]
    pub problem_type: String,

    /// A short, human-readable summary of the problem type
    pub title: String,

    /// The HTTP status code generated by the origin server
    pub status: u16,

    /// A human-readable explanation specific to this occurrence
    pub detail: String,

    /// A URI reference that identifies the specific occurrence
    pub instance: String,

    /// Additional extension members
    #[serde(flatten)]
    pub extensions: HashMap<String, serde_json::Value>,
}

impl ProblemDetails {
    /// Create a new problem details response
    pub fn new(error: &ApiError, instance: String) -> Self {
        let status_code = error.status_code();

        let mut problem = Self {
            problem_type: format!("{}/{}", PROBLEM_BASE_URI, error.error_type()),
            title: status_code.canonical_reason().unwrap_or("Unknown Error").to_string(),
            status: status_code.as_u16(),
            detail: error.to_string(),
            instance,
            extensions: HashMap::new(),
        };

        if let ApiError::InvalidRoute { keys } = error {
            problem = problem.with_extension("invalidKeys".to_string(), serde_json::json!(keys));
        }

        problem
    }

    /// Add extension data to the problem details
    pub fn with_extension(mut self, key: String, value: serde_json::Value) -> Self {
        self.extensions.insert(key, value);
        self
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { role_id } => ApiError::NotFound {
                message: format!("Role '{}' not found", role_id),
            },
            CoreError::InvalidRoute { keys } => ApiError::InvalidRoute { keys },
            CoreError::StoreUnavailable { message } => ApiError::ServiceUnavailable { message },
            CoreError::ValidationError { message } => ApiError::ValidationError { message },
        }
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// From implementations for common errors
impl From<hyper::http::Error> for ApiError {
    fn from(err: hyper::http::Error) -> Self {
        ApiError::HttpError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn test_core_errors_map_to_status_codes() {
        let cases = vec![
            (CoreError::NotFound { role_id: "r9".to_string() }, StatusCode::NOT_FOUND),
            (CoreError::InvalidRoute { keys: vec!["x".to_string()] }, StatusCode::UNPROCESSABLE_ENTITY),
            (CoreError::store_unavailable("down"), StatusCode::SERVICE_UNAVAILABLE),
            (CoreError::validation("bad"), StatusCode::BAD_REQUEST),
        ];

        for (core, expected) in cases {
            assert_eq!(ApiError::from(core).status_code(), expected);
        }
    }

    #[tokio::test]
    async fn test_invalid_route_problem_lists_keys() {
        let error = ApiError::InvalidRoute {
            keys: vec!["hr".to_string(), "ghost".to_string()],
        };
        let response = error.into_response("/api/v1/permissions/role/r1");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.headers()["content-type"], "application/problem+json");

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let problem: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(problem["status"], 422);
        assert_eq!(problem["instance"], "/api/v1/permissions/role/r1");
        assert_eq!(problem["invalidKeys"], serde_json::json!(["hr", "ghost"]));
        assert!(problem["type"].as_str().unwrap().ends_with("/invalid_route"));
    }
}
