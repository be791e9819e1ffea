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

//! Data model for routes, roles, grants and the derived permission views

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use utoipa::ToSchema;

// ====== Catalog Models ======

/// A single gate-able application route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    /// Stable, unique route key
    pub key: String,

    /// Display name
    pub title: String,

    /// URL path the route gates
    pub path: String,

    /// Key of the group the route belongs to
    #[serde(default)]
    pub group_key: String,
}

/// A named, ordered collection of routes used for display grouping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteGroup {
    /// Group key, shares the key space with route keys
    pub key: String,

    /// Display name
    pub title: String,

    /// Member routes in display order
    #[serde(default)]
    pub routes: Vec<Route>,
}

// ====== Role Models ======

/// A role as known to the role directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    /// Opaque role identifier
    #[serde(alias = "id")]
    pub role_id: String,

    /// Role name
    pub name: String,
}

// ====== Grant Models ======

/// The complete set of routes granted to one role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrantSet {
    /// Role the grants belong to
    pub role_id: String,

    /// Granted route keys
    #[schema(value_type = Vec<String>)]
    pub granted_keys: BTreeSet<String>,

    /// Time of the last successful commit
    pub last_updated: DateTime<Utc>,
}

impl GrantSet {
    pub fn new(role_id: impl Into<String>, granted_keys: BTreeSet<String>) -> Self {
        Self {
            role_id: role_id.into(),
            granted_keys,
            last_updated: Utc::now(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.granted_keys.contains(key)
    }
}

// ====== Derived Views ======

/// Leaf node of the permission tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TreeLeaf {
    pub key: String,
    pub title: String,
    pub path: String,
    /// Whether the role currently holds a grant for this route
    pub selected: bool,
}

/// Group node of the permission tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TreeGroup {
    pub key: String,
    pub title: String,
    pub children: Vec<TreeLeaf>,
}

/// Catalog joined with one role's grants, recomputed on every read
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionTree {
    /// Role the tree was built for, absent when no role was selected
    pub role_id: Option<String>,

    /// Groups in catalog order
    pub groups: Vec<TreeGroup>,
}

impl PermissionTree {
    /// Empty tree returned when no role is selected
    pub fn empty() -> Self {
        Self::default()
    }

    /// Iterate over every leaf in display order
    pub fn leaves(&self) -> impl Iterator<Item = &TreeLeaf> {
        self.groups.iter().flat_map(|group| group.children.iter())
    }

    /// Keys of all selected leaves
    pub fn selected_keys(&self) -> BTreeSet<String> {
        self.leaves().filter(|leaf| leaf.selected).map(|leaf| leaf.key.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Per-role grant statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSummary {
    pub role_id: String,
    pub role_name: String,

    /// Granted routes that still exist in the catalog
    pub allowed_routes: usize,

    /// Current catalog size
    pub total_routes: usize,

    /// Last commit time, absent for roles that were never committed
    pub last_updated: Option<DateTime<Utc>>,
}

/// Outcome of a committed selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommitResult {
    /// Grant set as persisted
    pub grant_set: GrantSet,

    /// Keys granted by this commit
    #[schema(value_type = Vec<String>)]
    pub added: BTreeSet<String>,

    /// Keys revoked by this commit
    #[schema(value_type = Vec<String>)]
    pub removed: BTreeSet<String>,

    /// Permission tree after the commit
    pub tree: PermissionTree,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_group_wire_format() {
        let json = serde_json::json!({
            "key": "hr",
            "title": "HR",
            "routes": [
                { "key": "hr.view", "title": "View", "path": "/hr", "groupKey": "hr" }
            ]
        });

        let group: RouteGroup = serde_json::from_value(json).unwrap();
        assert_eq!(group.routes[0].group_key, "hr");

        let value = serde_json::to_value(&group).unwrap();
        assert_eq!(value["routes"][0]["groupKey"], "hr");
    }

    #[test]
    fn test_summary_serializes_null_timestamp() {
        let summary = PermissionSummary {
            role_id: "r2".to_string(),
            role_name: "Auditor".to_string(),
            allowed_routes: 0,
            total_routes: 20,
            last_updated: None,
        };

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["allowedRoutes"], 0);
        assert!(value["lastUpdated"].is_null());
    }

    #[test]
    fn test_selected_keys() {
        let tree = PermissionTree {
            role_id: Some("r1".to_string()),
            groups: vec![TreeGroup {
                key: "hr".to_string(),
                title: "HR".to_string(),
                children: vec![
                    TreeLeaf {
                        key: "hr.view".to_string(),
                        title: "View".to_string(),
                        path: "/hr".to_string(),
                        selected: true,
                    },
                    TreeLeaf {
                        key: "hr.edit".to_string(),
                        title: "Edit".to_string(),
                        path: "/hr/edit".to_string(),
                        selected: false,
                    },
                ],
            }],
        };

        assert_eq!(tree.selected_keys(), BTreeSet::from(["hr.view".to_string()]));
        assert_eq!(tree.leaves().count(), 2);
    }
}
