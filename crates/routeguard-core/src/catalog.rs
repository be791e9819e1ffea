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

//! Route catalog collaborator and per-request catalog index

use crate::error::{CoreError, CoreResult};
use crate::models::RouteGroup;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

/// Source of the ordered route catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RouteCatalog: Send + Sync {
    /// List every group with its routes, in display order
    async fn list_groups(&self) -> CoreResult<Vec<RouteGroup>>;
}

/// Catalog held in process, validated on construction
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    groups: Vec<RouteGroup>,
}

impl StaticCatalog {
    /// Create a catalog, rejecting blank or duplicate keys and misfiled routes
    pub fn new(groups: Vec<RouteGroup>) -> CoreResult<Self> {
        let mut group_keys = HashSet::new();
        for group in &groups {
            if group.key.trim().is_empty() {
                return Err(CoreError::validation(format!("Group '{}' has an empty key", group.title)));
            }
            if !group_keys.insert(group.key.as_str()) {
                return Err(CoreError::validation(format!("Duplicate group key '{}'", group.key)));
            }
        }

        let mut route_keys = HashSet::new();
        for group in &groups {
            for route in &group.routes {
                if route.key.trim().is_empty() {
                    return Err(CoreError::validation(format!("Route '{}' in group '{}' has an empty key", route.title, group.key)));
                }
                if route.group_key != group.key {
                    return Err(CoreError::validation(format!(
                        "Route '{}' declares group '{}' but is listed under '{}'",
                        route.key, route.group_key, group.key
                    )));
                }
                if group_keys.contains(route.key.as_str()) {
                    return Err(CoreError::validation(format!("Key '{}' is used by both a group and a route", route.key)));
                }
                if !route_keys.insert(route.key.as_str()) {
                    return Err(CoreError::validation(format!("Route '{}' appears more than once in the catalog", route.key)));
                }
            }
        }

        Ok(Self { groups })
    }

    pub fn groups(&self) -> &[RouteGroup] {
        &self.groups
    }
}

#[async_trait]
impl RouteCatalog for StaticCatalog {
    async fn list_groups(&self) -> CoreResult<Vec<RouteGroup>> {
        Ok(self.groups.clone())
    }
}

/// Kind of node a key resolves to in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Group,
    Leaf,
}

/// Lookup snapshot over one `list_groups` result
#[derive(Debug, Clone)]
pub struct CatalogIndex {
    kinds: HashMap<String, KeyKind>,
    leaf_count: usize,
}

impl CatalogIndex {
    pub fn new(groups: &[RouteGroup]) -> Self {
        let mut kinds = HashMap::new();
        let mut leaf_count = 0;

        for group in groups {
            kinds.insert(group.key.clone(), KeyKind::Group);
        }
        for route in groups.iter().flat_map(|group| group.routes.iter()) {
            // A key that also names a group stays classified as a group
            if !kinds.contains_key(&route.key) {
                kinds.insert(route.key.clone(), KeyKind::Leaf);
                leaf_count += 1;
            }
        }

        Self { kinds, leaf_count }
    }

    pub fn kind(&self, key: &str) -> Option<KeyKind> {
        self.kinds.get(key).copied()
    }

    pub fn is_leaf(&self, key: &str) -> bool {
        self.kind(key) == Some(KeyKind::Leaf)
    }

    pub fn is_group(&self, key: &str) -> bool {
        self.kind(key) == Some(KeyKind::Group)
    }

    /// Number of distinct grantable routes
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    pub fn leaf_keys(&self) -> impl Iterator<Item = &str> {
        self.kinds.iter().filter(|(_, kind)| **kind == KeyKind::Leaf).map(|(key, _)| key.as_str())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::Route;

    pub(crate) fn route(group: &str, key: &str) -> Route {
        Route {
            key: key.to_string(),
            title: key.to_string(),
            path: format!("/{}", key.replace('.', "/")),
            group_key: group.to_string(),
        }
    }

    pub(crate) fn group(key: &str, leaves: &[&str]) -> RouteGroup {
        RouteGroup {
            key: key.to_string(),
            title: key.to_uppercase(),
            routes: leaves.iter().map(|leaf| route(key, leaf)).collect(),
        }
    }

    #[test]
    fn test_static_catalog_accepts_valid_groups() {
        let catalog = StaticCatalog::new(vec![group("hr", &["hr.view", "hr.edit"]), group("empty", &[])]).unwrap();
        assert_eq!(catalog.groups().len(), 2);
    }

    #[test]
    fn test_static_catalog_rejects_route_in_two_groups() {
        let result = StaticCatalog::new(vec![group("hr", &["shared"]), group("pay", &["shared"])]);
        assert!(matches!(result, Err(CoreError::ValidationError { .. })));
    }

    #[test]
    fn test_static_catalog_rejects_misfiled_route() {
        let mut hr = group("hr", &["hr.view"]);
        hr.routes[0].group_key = "pay".to_string();
        assert!(StaticCatalog::new(vec![hr]).is_err());
    }

    #[test]
    fn test_static_catalog_rejects_group_key_reused_as_route() {
        let result = StaticCatalog::new(vec![group("hr", &["pay"]), group("pay", &["pay.view"])]);
        assert!(result.is_err());
    }

    #[test]
    fn test_static_catalog_rejects_blank_route_key() {
        let result = StaticCatalog::new(vec![group("hr", &["hr.view", ""])]);
        assert!(matches!(result, Err(CoreError::ValidationError { .. })));

        let result = StaticCatalog::new(vec![group("hr", &["hr.view", "   "])]);
        assert!(matches!(result, Err(CoreError::ValidationError { .. })));
    }

    #[test]
    fn test_static_catalog_rejects_blank_group_key() {
        let result = StaticCatalog::new(vec![group("hr", &["hr.view"]), group(" ", &[])]);
        assert!(matches!(result, Err(CoreError::ValidationError { .. })));
    }

    #[test]
    fn test_catalog_index_classifies_keys() {
        let groups = vec![group("hr", &["hr.view", "hr.edit"]), group("pay", &["pay.run"])];
        let index = CatalogIndex::new(&groups);

        assert!(index.is_leaf("hr.view"));
        assert!(index.is_group("hr"));
        assert!(!index.is_leaf("hr"));
        assert_eq!(index.kind("missing"), None);
        assert_eq!(index.leaf_count(), 3);

        let mut keys: Vec<_> = index.leaf_keys().collect();
        keys.sort();
        assert_eq!(keys, vec!["hr.edit", "hr.view", "pay.run"]);
    }
}
