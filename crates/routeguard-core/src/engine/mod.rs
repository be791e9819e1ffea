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

//! Permission tree engine
//!
//! Joins the route catalog with the grant store to build per-role
//! permission trees, reconciles submitted selections into atomic grant set
//! replacements, and aggregates grant statistics across roles. The engine
//! holds no per-role state of its own: every call reads its collaborators
//! fresh.

pub mod reconcile;
pub mod summary;
pub mod tree;

pub use tree::assemble_tree;

use crate::audit::{AuditEntry, AuditLog};
use crate::catalog::RouteCatalog;
use crate::error::{CoreError, CoreResult};
use crate::models::RouteGroup;
use crate::roles::RoleDirectory;
use crate::store::GrantStore;
use std::sync::Arc;
use tracing::{instrument, warn};

/// Entry point for tree assembly, selection commits and summaries
#[derive(Clone)]
pub struct PermissionEngine {
    catalog: Arc<dyn RouteCatalog>,
    roles: Arc<dyn RoleDirectory>,
    store: Arc<dyn GrantStore>,
    audit_log: Arc<AuditLog>,
}

impl PermissionEngine {
    /// Create an engine over the given collaborators
    pub fn new(catalog: Arc<dyn RouteCatalog>, roles: Arc<dyn RoleDirectory>, store: Arc<dyn GrantStore>) -> Self {
        Self {
            catalog,
            roles,
            store,
            audit_log: Arc::new(AuditLog::default()),
        }
    }

    /// Replace the audit log, e.g. to change its capacity
    pub fn with_audit_log(mut self, audit_log: Arc<AuditLog>) -> Self {
        self.audit_log = audit_log;
        self
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit_log
    }

    /// Full route catalog, passed through unchanged
    #[instrument(skip(self))]
    pub async fn list_catalog(&self) -> CoreResult<Vec<RouteGroup>> {
        self.catalog.list_groups().await
    }

    /// Recent committed changes for a role, newest first
    #[instrument(skip(self))]
    pub async fn audit_history(&self, role_id: &str, limit: usize) -> CoreResult<Vec<AuditEntry>> {
        self.ensure_role(role_id).await?;
        Ok(self.audit_log.recent(Some(role_id), limit))
    }

    /// Whether the grant store is reachable
    pub async fn health_check(&self) -> bool {
        self.store.health_check().await
    }

    async fn ensure_role(&self, role_id: &str) -> CoreResult<()> {
        if self.roles.role_exists(role_id).await? {
            Ok(())
        } else {
            warn!("Unknown role: {}", role_id);
            Err(CoreError::NotFound { role_id: role_id.to_string() })
        }
    }
}

impl std::fmt::Debug for PermissionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionEngine").field("audit_entries", &self.audit_log.len()).finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::catalog::tests::group;
    use crate::models::Role;
    use crate::roles::StaticRoleDirectory;
    use crate::store::MemoryGrantStore;

    pub(crate) fn role(id: &str, name: &str) -> Role {
        Role {
            role_id: id.to_string(),
            name: name.to_string(),
        }
    }

    /// HR and payroll groups plus an empty settings group
    pub(crate) fn catalog() -> StaticCatalog {
        StaticCatalog::new(vec![
            group("hr", &["hr.view", "hr.edit"]),
            group("pay", &["pay.view", "pay.run"]),
            group("settings", &[]),
        ])
        .unwrap()
    }

    pub(crate) fn roles() -> StaticRoleDirectory {
        StaticRoleDirectory::new(vec![role("r1", "Recruiter"), role("r2", "auditor")]).unwrap()
    }

    pub(crate) fn engine_with(store: Arc<dyn GrantStore>) -> PermissionEngine {
        PermissionEngine::new(Arc::new(catalog()), Arc::new(roles()), store)
    }

    pub(crate) fn engine() -> (PermissionEngine, Arc<MemoryGrantStore>) {
        let store = Arc::new(MemoryGrantStore::new());
        (engine_with(store.clone()), store)
    }

    pub(crate) fn keys(items: &[&str]) -> std::collections::BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[tokio::test]
    async fn test_list_catalog_passes_through() {
        let (engine, _) = engine();
        let groups = engine.list_catalog().await.unwrap();
        let keys: Vec<_> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["hr", "pay", "settings"]);
    }

    #[tokio::test]
    async fn test_audit_history_requires_known_role() {
        let (engine, _) = engine();
        let result = engine.audit_history("ghost", 10).await;
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
        assert!(engine.audit_history("r1", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_health_check_delegates_to_store() {
        let (engine, _) = engine();
        assert!(engine.health_check().await);
    }
}
