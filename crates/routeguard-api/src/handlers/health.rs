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

//! Health check handlers

use crate::error::ApiResult;
use crate::handlers::json_response;
use crate::models::HealthResponse;
use chrono::Utc;
use http_body_util::Full;
use hyper::{Response, StatusCode, body::Bytes};
use routeguard_core::PermissionEngine;
use tracing::info;

/// Health check handler
/// GET /api/v1/health
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Grant store unreachable", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health_check(engine: &PermissionEngine) -> ApiResult<Response<Full<Bytes>>> {
    info!("Processing health check request");

    let store_healthy = engine.health_check().await;

    let health_response = HealthResponse {
        status: if store_healthy { "healthy".to_string() } else { "unhealthy".to_string() },
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: if store_healthy { "reachable".to_string() } else { "unreachable".to_string() },
    };

    let status_code = if store_healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    json_response(status_code, &health_response)
}
