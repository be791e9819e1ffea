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

//! Selection reconciliation: full replacement of a role's grant set

use super::{PermissionEngine, assemble_tree};
use crate::audit::AuditEntry;
use crate::catalog::CatalogIndex;
use crate::error::{CoreError, CoreResult};
use crate::models::CommitResult;
use std::collections::BTreeSet;
use tracing::{error, info, instrument, warn};

/// Keys of `target` that are not grantable leaves, sorted and de-duplicated
pub fn invalid_keys(index: &CatalogIndex, target: &BTreeSet<String>) -> Vec<String> {
    target.iter().filter(|key| key.trim().is_empty() || !index.is_leaf(key)).cloned().collect()
}

/// Split a replacement into the keys it grants and the keys it revokes
pub fn diff(current: &BTreeSet<String>, target: &BTreeSet<String>) -> (BTreeSet<String>, BTreeSet<String>) {
    let added = target.difference(current).cloned().collect();
    let removed = current.difference(target).cloned().collect();
    (added, removed)
}

impl PermissionEngine {
    /// Replace a role's grant set with `target`
    ///
    /// `target` is the complete desired set of leaf route keys, not a delta.
    /// Any key that is unknown to the catalog or names a group aborts the
    /// commit with `InvalidRoute` before the store is touched.
    #[instrument(skip(self, target), fields(target_len = target.len()))]
    pub async fn commit_selection(&self, role_id: &str, target: BTreeSet<String>) -> CoreResult<CommitResult> {
        if role_id.trim().is_empty() {
            return Err(CoreError::validation("Role id must not be empty"));
        }

        self.ensure_role(role_id).await?;

        let groups = self.catalog.list_groups().await?;
        let index = CatalogIndex::new(&groups);

        let invalid = invalid_keys(&index, &target);
        if !invalid.is_empty() {
            warn!("Rejected selection for role {}: invalid keys {:?}", role_id, invalid);
            metrics::counter!("routeguard_commits_rejected_total", 1);
            return Err(CoreError::InvalidRoute { keys: invalid });
        }

        let current = self.store.get_grant_set(role_id).await?.map(|grant_set| grant_set.granted_keys).unwrap_or_default();
        let (added, removed) = diff(&current, &target);

        let grant_set = self.store.replace_grant_set(role_id, target).await.map_err(|e| {
            error!("Failed to commit grant set for role {}: {}", role_id, e);
            e
        })?;

        self.audit_log
            .record(AuditEntry::new(role_id.to_string(), added.clone(), removed.clone(), grant_set.last_updated));
        metrics::counter!("routeguard_commits_total", 1);

        info!("Committed {} grant(s) for role {} (+{} / -{})", grant_set.granted_keys.len(), role_id, added.len(), removed.len());

        let tree = assemble_tree(Some(role_id), &groups, &grant_set.granted_keys);

        Ok(CommitResult { grant_set, added, removed, tree })
    }

    /// Revoke every grant of a role by committing an empty selection
    ///
    /// The role keeps a (now empty) grant set record; nothing is deleted.
    pub async fn revoke_all(&self, role_id: &str) -> CoreResult<CommitResult> {
        self.commit_selection(role_id, BTreeSet::new()).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use crate::catalog::MockRouteCatalog;
    use crate::models::GrantSet;
    use crate::store::{GrantStore, MockGrantStore};
    use proptest::prelude::*;
    use proptest::sample::subsequence;
    use std::sync::Arc;

    const LEAVES: [&str; 4] = ["hr.view", "hr.edit", "pay.view", "pay.run"];

    #[tokio::test]
    async fn test_end_to_end_grant_and_revoke() {
        let (engine, _) = engine();

        engine.commit_selection("r1", keys(&["hr.view"])).await.unwrap();
        let tree = engine.build_tree(Some("r1")).await.unwrap();
        let hr = &tree.groups[0];
        assert!(hr.children.iter().find(|l| l.key == "hr.view").unwrap().selected);
        assert!(!hr.children.iter().find(|l| l.key == "hr.edit").unwrap().selected);

        engine.commit_selection("r1", keys(&[])).await.unwrap();
        let tree = engine.build_tree(Some("r1")).await.unwrap();
        assert!(tree.leaves().all(|leaf| !leaf.selected));
    }

    #[tokio::test]
    async fn test_commit_is_idempotent() {
        let (engine, store) = engine();

        let first = engine.commit_selection("r1", keys(&["hr.view", "pay.run"])).await.unwrap();
        let second = engine.commit_selection("r1", keys(&["hr.view", "pay.run"])).await.unwrap();

        assert_eq!(first.grant_set.granted_keys, second.grant_set.granted_keys);
        assert!(second.added.is_empty());
        assert!(second.removed.is_empty());
        assert_eq!(store.get_grant_set("r1").await.unwrap().unwrap().granted_keys, keys(&["hr.view", "pay.run"]));
    }

    #[tokio::test]
    async fn test_commit_reports_diff_and_tree() {
        let (engine, _) = engine();
        engine.commit_selection("r1", keys(&["hr.view", "hr.edit"])).await.unwrap();

        let result = engine.commit_selection("r1", keys(&["hr.edit", "pay.view"])).await.unwrap();
        assert_eq!(result.added, keys(&["pay.view"]));
        assert_eq!(result.removed, keys(&["hr.view"]));
        assert_eq!(result.tree.selected_keys(), keys(&["hr.edit", "pay.view"]));
        assert_eq!(result.tree.role_id.as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_unknown_key_rejected_without_write() {
        let (engine, store) = engine();
        engine.commit_selection("r1", keys(&["hr.view"])).await.unwrap();
        let before = store.get_grant_set("r1").await.unwrap();

        let result = engine.commit_selection("r1", keys(&["hr.edit", "no.such.route"])).await;
        assert_eq!(
            result,
            Err(CoreError::InvalidRoute {
                keys: vec!["no.such.route".to_string()]
            })
        );
        assert_eq!(store.get_grant_set("r1").await.unwrap(), before);
        assert_eq!(engine.audit_log().len(), 1);
    }

    #[tokio::test]
    async fn test_group_key_rejected() {
        let (engine, store) = engine();

        let result = engine.commit_selection("r1", keys(&["hr", "hr.view", "settings"])).await;
        assert_eq!(
            result,
            Err(CoreError::InvalidRoute {
                keys: vec!["hr".to_string(), "settings".to_string()]
            })
        );
        assert!(store.get_grant_set("r1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blank_key_rejected_as_invalid_route() {
        let (engine, _) = engine();
        let result = engine.commit_selection("r1", keys(&[""])).await;
        assert!(matches!(result, Err(CoreError::InvalidRoute { .. })));
    }

    #[tokio::test]
    async fn test_blank_key_rejected_even_if_catalog_lists_it() {
        let mut catalog = MockRouteCatalog::new();
        catalog
            .expect_list_groups()
            .returning(|| Ok(vec![crate::catalog::tests::group("hr", &["hr.view", ""])]));
        let store = Arc::new(crate::store::MemoryGrantStore::new());
        let engine = PermissionEngine::new(Arc::new(catalog), Arc::new(roles()), store.clone());

        match engine.commit_selection("r1", keys(&["", "hr.view"])).await {
            Err(CoreError::InvalidRoute { keys }) => assert_eq!(keys, vec![String::new()]),
            other => panic!("expected InvalidRoute, got {:?}", other),
        }
        assert!(store.get_grant_set("r1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_and_blank_roles() {
        let (engine, _) = engine();

        let result = engine.commit_selection("ghost", keys(&["hr.view"])).await;
        assert!(matches!(result, Err(CoreError::NotFound { .. })));

        let result = engine.commit_selection(" ", keys(&["hr.view"])).await;
        assert!(matches!(result, Err(CoreError::ValidationError { .. })));
    }

    #[tokio::test]
    async fn test_commit_replaces_stale_keys() {
        let (engine, store) = engine();
        store.insert(GrantSet::new("r1", keys(&["hr.view", "retired.route"])));

        let result = engine.commit_selection("r1", keys(&["hr.view"])).await.unwrap();
        assert_eq!(result.removed, keys(&["retired.route"]));
        assert_eq!(store.get_grant_set("r1").await.unwrap().unwrap().granted_keys, keys(&["hr.view"]));
    }

    #[tokio::test]
    async fn test_revoke_all_keeps_empty_record() {
        let (engine, store) = engine();
        engine.commit_selection("r2", keys(&["pay.view", "pay.run"])).await.unwrap();

        let result = engine.revoke_all("r2").await.unwrap();
        assert!(result.grant_set.granted_keys.is_empty());
        assert_eq!(result.removed, keys(&["pay.run", "pay.view"]));

        let stored = store.get_grant_set("r2").await.unwrap().unwrap();
        assert!(stored.granted_keys.is_empty());
    }

    #[tokio::test]
    async fn test_commit_records_audit_entry() {
        let (engine, _) = engine();
        engine.commit_selection("r1", keys(&["hr.view"])).await.unwrap();

        let history = engine.audit_history("r1", 10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].added, keys(&["hr.view"]));
        assert!(history[0].removed.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_on_replace_leaves_no_audit() {
        let mut store = MockGrantStore::new();
        store.expect_get_grant_set().returning(|_| Ok(None));
        store.expect_replace_grant_set().times(1).returning(|_, _| Err(CoreError::store_unavailable("disk full")));
        let engine = engine_with(Arc::new(store));

        let result = engine.commit_selection("r1", keys(&["hr.view"])).await;
        assert!(matches!(result, Err(CoreError::StoreUnavailable { .. })));
        assert!(engine.audit_log().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_selection_never_reaches_store() {
        let mut store = MockGrantStore::new();
        store.expect_get_grant_set().never();
        store.expect_replace_grant_set().never();
        let engine = engine_with(Arc::new(store));

        let result = engine.commit_selection("r1", keys(&["bogus"])).await;
        assert!(matches!(result, Err(CoreError::InvalidRoute { .. })));
    }

    #[tokio::test]
    async fn test_catalog_failure_is_surfaced() {
        let mut catalog = MockRouteCatalog::new();
        catalog.expect_list_groups().returning(|| Err(CoreError::store_unavailable("catalog offline")));
        let engine = PermissionEngine::new(Arc::new(catalog), Arc::new(roles()), Arc::new(crate::store::MemoryGrantStore::new()));

        let result = engine.commit_selection("r1", keys(&["hr.view"])).await;
        assert!(matches!(result, Err(CoreError::StoreUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_commits_store_exactly_one_selection() {
        let (engine, store) = engine();
        let set_a = keys(&["hr.view", "hr.edit"]);
        let set_b = keys(&["pay.view"]);

        let (a, b) = futures::join!(engine.commit_selection("r1", set_a.clone()), engine.commit_selection("r1", set_b.clone()));
        a.unwrap();
        b.unwrap();

        let stored = store.get_grant_set("r1").await.unwrap().unwrap().granted_keys;
        assert!(stored == set_a || stored == set_b);

        let tree = engine.build_tree(Some("r1")).await.unwrap();
        assert_eq!(tree.selected_keys(), stored);
    }

    #[test]
    fn test_diff() {
        let (added, removed) = diff(&keys(&["a", "b"]), &keys(&["b", "c"]));
        assert_eq!(added, keys(&["c"]));
        assert_eq!(removed, keys(&["a"]));
    }

    proptest! {
        #[test]
        fn prop_last_commit_defines_selection(
            first in subsequence(LEAVES.to_vec(), 0..=LEAVES.len()),
            second in subsequence(LEAVES.to_vec(), 0..=LEAVES.len()),
        ) {
            let first: BTreeSet<String> = first.into_iter().map(str::to_string).collect();
            let second: BTreeSet<String> = second.into_iter().map(str::to_string).collect();

            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let (tree_after_first, stored_after_second, tree_after_second) = runtime.block_on(async {
                let (engine, store) = engine();
                engine.commit_selection("r1", first.clone()).await.unwrap();
                let tree_after_first = engine.build_tree(Some("r1")).await.unwrap();
                engine.commit_selection("r1", second.clone()).await.unwrap();
                let stored = store.get_grant_set("r1").await.unwrap().unwrap().granted_keys;
                let tree_after_second = engine.build_tree(Some("r1")).await.unwrap();
                (tree_after_first, stored, tree_after_second)
            });

            prop_assert_eq!(tree_after_first.selected_keys(), first);
            prop_assert_eq!(&stored_after_second, &second);
            prop_assert_eq!(tree_after_second.selected_keys(), second);
            prop_assert_eq!(tree_after_second.leaves().count(), LEAVES.len());
        }
    }
}
