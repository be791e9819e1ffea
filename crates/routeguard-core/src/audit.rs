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

//! Audit trail of committed grant changes

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use tracing::info;
use utoipa::ToSchema;

/// Default number of entries kept in memory
pub const DEFAULT_AUDIT_CAPACITY: usize = 1000;

/// One committed change to a role's grant set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// Unique entry ID
    pub id: String,

    /// Role whose grants changed
    pub role_id: String,

    /// Keys granted by the commit
    #[schema(value_type = Vec<String>)]
    pub added: BTreeSet<String>,

    /// Keys revoked by the commit
    #[schema(value_type = Vec<String>)]
    pub removed: BTreeSet<String>,

    /// Commit timestamp
    pub committed_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(role_id: String, added: BTreeSet<String>, removed: BTreeSet<String>, committed_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role_id,
            added,
            removed,
            committed_at,
        }
    }
}

/// Bounded in-memory audit log, oldest entries evicted first
#[derive(Debug)]
pub struct AuditLog {
    entries: RwLock<VecDeque<AuditEntry>>,
    capacity: usize,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIT_CAPACITY)
    }
}

impl AuditLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity.min(DEFAULT_AUDIT_CAPACITY))),
            capacity,
        }
    }

    /// Record a committed change
    pub fn record(&self, entry: AuditEntry) {
        info!(
            audit_id = %entry.id,
            role_id = %entry.role_id,
            added = entry.added.len(),
            removed = entry.removed.len(),
            "Grant set committed"
        );

        let mut entries = self.entries.write();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Most recent entries first, optionally restricted to one role
    pub fn recent(&self, role_id: Option<&str>, limit: usize) -> Vec<AuditEntry> {
        let entries = self.entries.read();
        entries
            .iter()
            .rev()
            .filter(|entry| role_id.is_none_or(|id| entry.role_id == id))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(role_id: &str, added: &[&str]) -> AuditEntry {
        AuditEntry::new(role_id.to_string(), added.iter().map(|s| s.to_string()).collect(), BTreeSet::new(), Utc::now())
    }

    #[test]
    fn test_recent_is_newest_first_and_filtered() {
        let log = AuditLog::new(10);
        log.record(entry("r1", &["a"]));
        log.record(entry("r2", &["b"]));
        log.record(entry("r1", &["c"]));

        let r1 = log.recent(Some("r1"), 10);
        assert_eq!(r1.len(), 2);
        assert!(r1[0].added.contains("c"));
        assert!(r1[1].added.contains("a"));

        assert_eq!(log.recent(None, 2).len(), 2);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let log = AuditLog::new(2);
        log.record(entry("r1", &["a"]));
        log.record(entry("r1", &["b"]));
        log.record(entry("r1", &["c"]));

        assert_eq!(log.len(), 2);
        let recent = log.recent(None, 10);
        assert!(recent.iter().all(|e| !e.added.contains("a")));
    }
}
