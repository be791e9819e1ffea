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

//! Tree assembly: catalog joined with one role's grant set

use super::PermissionEngine;
use crate::error::CoreResult;
use crate::models::{PermissionTree, RouteGroup, TreeGroup, TreeLeaf};
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// Build a permission tree from catalog groups and a granted key set
///
/// Groups and leaves keep catalog order. Granted keys that no longer exist in
/// the catalog are omitted, and groups with no routes are still emitted.
pub fn assemble_tree(role_id: Option<&str>, groups: &[RouteGroup], granted: &BTreeSet<String>) -> PermissionTree {
    let groups = groups
        .iter()
        .map(|group| TreeGroup {
            key: group.key.clone(),
            title: group.title.clone(),
            children: group
                .routes
                .iter()
                .map(|route| TreeLeaf {
                    key: route.key.clone(),
                    title: route.title.clone(),
                    path: route.path.clone(),
                    selected: granted.contains(&route.key),
                })
                .collect(),
        })
        .collect();

    PermissionTree {
        role_id: role_id.map(str::to_string),
        groups,
    }
}

impl PermissionEngine {
    /// Build the permission tree for a role
    ///
    /// `None` (or a blank id) means no role is selected and yields an empty
    /// tree. A role without a stored grant set gets a tree with nothing
    /// selected.
    #[instrument(skip(self))]
    pub async fn build_tree(&self, role_id: Option<&str>) -> CoreResult<PermissionTree> {
        let Some(role_id) = role_id.filter(|id| !id.trim().is_empty()) else {
            debug!("No role selected, returning empty tree");
            return Ok(PermissionTree::empty());
        };

        self.ensure_role(role_id).await?;

        let groups = self.catalog.list_groups().await?;
        let granted = self.store.get_grant_set(role_id).await?.map(|grant_set| grant_set.granted_keys).unwrap_or_default();

        let tree = assemble_tree(Some(role_id), &groups, &granted);

        let selected = tree.leaves().filter(|leaf| leaf.selected).count();
        if selected < granted.len() {
            debug!("Omitted {} stale grant(s) for role {}", granted.len() - selected, role_id);
        }

        Ok(tree)
    }
}
