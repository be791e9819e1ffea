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

//! HTTP routing for the permissions API

use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::handlers::{health, permissions};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response, StatusCode};
use percent_encoding::percent_decode_str;
use routeguard_core::PermissionEngine;
use std::collections::HashMap;
use tracing::{info, warn};
use utoipa::OpenApi;

/// HTTP router for the permissions API
pub struct Router {
    engine: PermissionEngine,
    max_body_size: usize,
    openapi_spec: Option<String>,
}

impl Router {
    /// Create a new router
    pub fn new(engine: PermissionEngine, config: &Config) -> Self {
        let openapi_spec = config.openapi_enabled.then(generate_openapi_spec);

        Self {
            engine,
            max_body_size: config.max_body_size,
            openapi_spec,
        }
    }

    /// Route a request and render failures as problem details
    pub async fn handle<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let path = req.uri().path().to_string();
        match self.route(req).await {
            Ok(response) => response,
            Err(e) => e.into_response(&path),
        }
    }

    /// Route a request to the appropriate handler
    pub async fn route<B>(&self, req: Request<B>) -> ApiResult<Response<Full<Bytes>>>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let path = req.uri().path().to_string();
        let method = req.method().clone();
        let query = parse_query_params(req.uri().query().unwrap_or(""));
        let path_segments: Vec<&str> = path.split('/').collect();

        info!("Routing request: {} {}", method, path);

        match (&method, path_segments.as_slice()) {
            // Health
            (&Method::GET, ["", "api", "v1", "health"]) => health::health_check(&self.engine).await,

            // Catalog and summary
            (&Method::GET, ["", "api", "v1", "permissions", "routes"]) => permissions::list_routes(&self.engine).await,
            (&Method::GET, ["", "api", "v1", "permissions", "summary"]) => permissions::get_summary(&self.engine).await,

            // No role selected
            (&Method::GET, ["", "api", "v1", "permissions", "role"]) | (&Method::GET, ["", "api", "v1", "permissions", "role", ""]) => {
                permissions::get_role_tree(&self.engine, None).await
            }

            // Role trees and selections
            (&Method::GET, ["", "api", "v1", "permissions", "role", role_id]) => permissions::get_role_tree(&self.engine, Some(decode_segment(role_id)?)).await,
            (&Method::PUT, ["", "api", "v1", "permissions", "role", role_id]) => {
                let role_id = decode_segment(role_id)?;
                let body = self.read_body(req).await?;
                permissions::put_role_selection(&self.engine, role_id, body).await
            }
            (&Method::DELETE, ["", "api", "v1", "permissions", "role", role_id]) => permissions::delete_role_selection(&self.engine, decode_segment(role_id)?).await,

            // Audit
            (&Method::GET, ["", "api", "v1", "permissions", "role", role_id, "audit"]) => {
                permissions::get_role_audit(&self.engine, decode_segment(role_id)?, query.get("limit").map(String::as_str)).await
            }

            // Documentation
            (&Method::GET, ["", "openapi.json"]) if self.openapi_spec.is_some() => self.serve_openapi_spec(),

            (_, ["", "api", "v1", "permissions", "role", _]) | (_, ["", "api", "v1", "permissions", "role", _, "audit"]) => Err(ApiError::MethodNotAllowed {
                message: format!("{} is not supported on {}", method, path),
            }),

            _ => {
                warn!("Route not found: {} {}", method, path);
                Err(ApiError::NotFound {
                    message: format!("Route not found: {} {}", method, path),
                })
            }
        }
    }

    /// Collect a request body, enforcing the configured size limit
    async fn read_body<B>(&self, req: Request<B>) -> ApiResult<Bytes>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        match Limited::new(req.into_body(), self.max_body_size).collect().await {
            Ok(collected) => Ok(collected.to_bytes()),
            Err(e) if e.is::<LengthLimitError>() => Err(ApiError::PayloadTooLarge {
                message: format!("Request body exceeds {} bytes", self.max_body_size),
            }),
            Err(e) => Err(ApiError::BadRequest {
                message: format!("Failed to read request body: {}", e),
            }),
        }
    }

    /// Serve OpenAPI specification
    fn serve_openapi_spec(&self) -> ApiResult<Response<Full<Bytes>>> {
        let spec = self.openapi_spec.clone().unwrap_or_default();
        Ok(Response::builder()
            .status(StatusCode::OK)
            .header("content-type", "application/json")
            .body(Full::new(Bytes::from(spec)))?)
    }

    /// Get the OpenAPI specification
    pub fn openapi_spec(&self) -> Option<&str> {
        self.openapi_spec.as_deref()
    }
}

/// Percent-decode a path segment
fn decode_segment(segment: &str) -> ApiResult<String> {
    percent_decode_str(segment).decode_utf8().map(|decoded| decoded.into_owned()).map_err(|_| ApiError::BadRequest {
        message: "Invalid path segment encoding".to_string(),
    })
}

/// Parse query parameters
fn parse_query_params(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    for pair in query.split('&') {
        if let Some((key, value)) = pair.split_once('=') {
            let key = percent_decode_str(key).decode_utf8().unwrap_or_default().to_string();
            let value = percent_decode_str(value).decode_utf8().unwrap_or_default().to_string();
            params.insert(key, value);
        }
    }

    params
}

/// Generate OpenAPI specification
fn generate_openapi_spec() -> String {
    #[derive(OpenApi)]
    #[openapi(
        paths(
            // Health endpoints
            health::health_check,

            // Permission endpoints
            permissions::list_routes,
            permissions::get_role_tree,
            permissions::put_role_selection,
            permissions::delete_role_selection,
            permissions::get_role_audit,
            permissions::get_summary,
        ),
        components(
            schemas(
                routeguard_core::Route,
                routeguard_core::RouteGroup,
                routeguard_core::GrantSet,
                routeguard_core::TreeLeaf,
                routeguard_core::TreeGroup,
                routeguard_core::PermissionTree,
                routeguard_core::PermissionSummary,
                routeguard_core::CommitResult,
                routeguard_core::AuditEntry,
                crate::models::SelectionRequest,
                crate::models::HealthResponse,
            )
        ),
        tags(
            (name = "Health", description = "Health check endpoint"),
            (name = "Permissions", description = "Route catalog, per-role permission trees and grant summaries")
        )
    )]
    struct ApiDoc;

    ApiDoc::openapi().to_pretty_json().unwrap_or_else(|_| "{}".to_string())
}
