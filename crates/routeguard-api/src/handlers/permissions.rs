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

//! Permission tree handlers

use crate::error::{ApiError, ApiResult};
use crate::handlers::json_response;
use crate::models::SelectionRequest;
use http_body_util::Full;
use hyper::{Response, StatusCode, body::Bytes};
use routeguard_core::{AuditEntry, CommitResult, PermissionEngine, PermissionSummary, PermissionTree, RouteGroup};
use std::collections::BTreeSet;
use tracing::info;

/// Default number of audit entries returned
pub const DEFAULT_AUDIT_LIMIT: usize = 50;

/// List the route catalog
/// GET /api/v1/permissions/routes
#[utoipa::path(
    get,
    path = "/api/v1/permissions/routes",
    responses(
        (status = 200, description = "Route catalog in display order", body = [RouteGroup]),
        (status = 503, description = "Catalog unavailable")
    ),
    tag = "Permissions"
)]
pub async fn list_routes(engine: &PermissionEngine) -> ApiResult<Response<Full<Bytes>>> {
    info!("Processing list routes request");

    let groups = engine.list_catalog().await?;

    info!("Retrieved {} route groups", groups.len());

    json_response(StatusCode::OK, &groups)
}

/// Get the permission tree of a role
/// GET /api/v1/permissions/role/{roleId}
#[utoipa::path(
    get,
    path = "/api/v1/permissions/role/{roleId}",
    params(
        ("roleId" = String, Path, description = "Role identifier, empty for no role selected")
    ),
    responses(
        (status = 200, description = "Permission tree", body = PermissionTree),
        (status = 404, description = "Role not found"),
        (status = 503, description = "Grant store unavailable")
    ),
    tag = "Permissions"
)]
pub async fn get_role_tree(engine: &PermissionEngine, role_id: Option<String>) -> ApiResult<Response<Full<Bytes>>> {
    info!("Processing get permission tree request: {:?}", role_id);

    let tree = engine.build_tree(role_id.as_deref()).await?;

    json_response(StatusCode::OK, &tree)
}

/// Replace the selection of a role
/// PUT /api/v1/permissions/role/{roleId}
#[utoipa::path(
    put,
    path = "/api/v1/permissions/role/{roleId}",
    params(
        ("roleId" = String, Path, description = "Role identifier")
    ),
    request_body = SelectionRequest,
    responses(
        (status = 200, description = "Selection committed", body = CommitResult),
        (status = 400, description = "Malformed body"),
        (status = 404, description = "Role not found"),
        (status = 422, description = "Selection references unknown or group keys"),
        (status = 503, description = "Grant store unavailable")
    ),
    tag = "Permissions"
)]
pub async fn put_role_selection(engine: &PermissionEngine, role_id: String, body: Bytes) -> ApiResult<Response<Full<Bytes>>> {
    info!("Processing commit selection request: {}", role_id);

    let request: SelectionRequest = serde_json::from_slice(&body).map_err(|e| ApiError::ValidationError {
        message: format!("Expected {{\"childRoutes\": [string, ...]}}: {}", e),
    })?;
    let target: BTreeSet<String> = request.child_routes.into_iter().collect();

    let result = engine.commit_selection(&role_id, target).await?;

    json_response(StatusCode::OK, &result)
}

/// Revoke every grant of a role
/// DELETE /api/v1/permissions/role/{roleId}
#[utoipa::path(
    delete,
    path = "/api/v1/permissions/role/{roleId}",
    params(
        ("roleId" = String, Path, description = "Role identifier")
    ),
    responses(
        (status = 200, description = "All grants revoked, empty grant set stored", body = CommitResult),
        (status = 404, description = "Role not found"),
        (status = 503, description = "Grant store unavailable")
    ),
    tag = "Permissions"
)]
pub async fn delete_role_selection(engine: &PermissionEngine, role_id: String) -> ApiResult<Response<Full<Bytes>>> {
    info!("Processing revoke all request: {}", role_id);

    let result = engine.revoke_all(&role_id).await?;

    json_response(StatusCode::OK, &result)
}

/// Recent committed changes of a role
/// GET /api/v1/permissions/role/{roleId}/audit
#[utoipa::path(
    get,
    path = "/api/v1/permissions/role/{roleId}/audit",
    params(
        ("roleId" = String, Path, description = "Role identifier"),
        ("limit" = Option<usize>, Query, description = "Maximum number of entries, newest first")
    ),
    responses(
        (status = 200, description = "Audit entries", body = [AuditEntry]),
        (status = 400, description = "Invalid limit"),
        (status = 404, description = "Role not found")
    ),
    tag = "Permissions"
)]
pub async fn get_role_audit(engine: &PermissionEngine, role_id: String, limit: Option<&str>) -> ApiResult<Response<Full<Bytes>>> {
    info!("Processing audit history request: {}", role_id);

    let limit = match limit {
        Some(raw) => raw.parse::<usize>().map_err(|_| ApiError::ValidationError {
            message: format!("Invalid limit '{}'", raw),
        })?,
        None => DEFAULT_AUDIT_LIMIT,
    };

    let entries = engine.audit_history(&role_id, limit).await?;

    json_response(StatusCode::OK, &entries)
}

/// Grant statistics for every role
/// GET /api/v1/permissions/summary
#[utoipa::path(
    get,
    path = "/api/v1/permissions/summary",
    responses(
        (status = 200, description = "Per-role summaries ordered by role name", body = [PermissionSummary]),
        (status = 503, description = "Grant store unavailable")
    ),
    tag = "Permissions"
)]
pub async fn get_summary(engine: &PermissionEngine) -> ApiResult<Response<Full<Bytes>>> {
    info!("Processing permission summary request");

    let summaries = engine.summarize().await?;

    json_response(StatusCode::OK, &summaries)
}
