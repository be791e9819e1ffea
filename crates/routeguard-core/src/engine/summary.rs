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

//! Summary aggregation across all roles

use super::PermissionEngine;
use crate::catalog::CatalogIndex;
use crate::error::CoreResult;
use crate::models::{GrantSet, PermissionSummary, Role};
use std::collections::HashMap;
use tracing::instrument;

/// Order summaries by role name (case-insensitive), then role id
pub fn sort_summaries(summaries: &mut [PermissionSummary]) {
    summaries.sort_by(|a, b| {
        a.role_name
            .to_lowercase()
            .cmp(&b.role_name.to_lowercase())
            .then_with(|| a.role_id.cmp(&b.role_id))
    });
}

fn summarize_role(role: &Role, grant_set: Option<&GrantSet>, index: &CatalogIndex) -> PermissionSummary {
    PermissionSummary {
        role_id: role.role_id.clone(),
        role_name: role.name.clone(),
        allowed_routes: grant_set.map(|gs| gs.granted_keys.iter().filter(|key| index.is_leaf(key)).count()).unwrap_or(0),
        total_routes: index.leaf_count(),
        last_updated: grant_set.map(|gs| gs.last_updated),
    }
}

impl PermissionEngine {
    /// Grant statistics for every known role
    ///
    /// Totals reflect the catalog as it is now; stale grants are not counted.
    /// Grant sets whose role no longer exists are ignored.
    #[instrument(skip(self))]
    pub async fn summarize(&self) -> CoreResult<Vec<PermissionSummary>> {
        let roles = self.roles.list_roles().await?;
        let groups = self.catalog.list_groups().await?;
        let index = CatalogIndex::new(&groups);

        let grant_sets: HashMap<String, GrantSet> = self
            .store
            .list_all_grant_sets()
            .await?
            .into_iter()
            .map(|grant_set| (grant_set.role_id.clone(), grant_set))
            .collect();

        let mut summaries: Vec<PermissionSummary> = roles.iter().map(|role| summarize_role(role, grant_sets.get(&role.role_id), &index)).collect();
        sort_summaries(&mut summaries);

        Ok(summaries)
    }
}
