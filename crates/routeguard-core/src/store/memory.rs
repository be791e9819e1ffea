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

//! In-memory grant store

use crate::error::CoreResult;
use crate::models::GrantSet;
use crate::store::GrantStore;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeSet;
use tracing::debug;

/// Grant store backed by a concurrent map, one entry per role
#[derive(Debug, Default)]
pub struct MemoryGrantStore {
    grants: DashMap<String, GrantSet>,
}

impl MemoryGrantStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a grant set without going through a commit
    pub fn insert(&self, grant_set: GrantSet) {
        self.grants.insert(grant_set.role_id.clone(), grant_set);
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

#[async_trait]
impl GrantStore for MemoryGrantStore {
    async fn get_grant_set(&self, role_id: &str) -> CoreResult<Option<GrantSet>> {
        Ok(self.grants.get(role_id).map(|entry| entry.value().clone()))
    }

    async fn replace_grant_set(&self, role_id: &str, keys: BTreeSet<String>) -> CoreResult<GrantSet> {
        let grant_set = GrantSet::new(role_id, keys);
        self.grants.insert(role_id.to_string(), grant_set.clone());
        debug!("Replaced grant set for role {} ({} keys)", role_id, grant_set.granted_keys.len());
        Ok(grant_set)
    }

    async fn list_all_grant_sets(&self) -> CoreResult<Vec<GrantSet>> {
        Ok(self.grants.iter().map(|entry| entry.value().clone()).collect())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn keys(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_replace_and_get() {
        let store = MemoryGrantStore::new();
        assert!(store.get_grant_set("r1").await.unwrap().is_none());

        let stored = store.replace_grant_set("r1", keys(&["a", "b"])).await.unwrap();
        assert_eq!(stored.granted_keys, keys(&["a", "b"]));

        let fetched = store.get_grant_set("r1").await.unwrap().unwrap();
        assert_eq!(fetched, stored);
    }

    #[tokio::test]
    async fn test_replace_is_not_a_merge() {
        let store = MemoryGrantStore::new();
        store.replace_grant_set("r1", keys(&["a", "b"])).await.unwrap();
        store.replace_grant_set("r1", keys(&["c"])).await.unwrap();

        let fetched = store.get_grant_set("r1").await.unwrap().unwrap();
        assert_eq!(fetched.granted_keys, keys(&["c"]));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_replaces_never_mix() {
        let store = Arc::new(MemoryGrantStore::new());
        let set_a = keys(&["a1", "a2", "a3"]);
        let set_b = keys(&["b1", "b2"]);

        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            let target = if i % 2 == 0 { set_a.clone() } else { set_b.clone() };
            handles.push(tokio::spawn(async move { store.replace_grant_set("r1", target).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = store.get_grant_set("r1").await.unwrap().unwrap().granted_keys;
        assert!(stored == set_a || stored == set_b);
    }
}
