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

//! Grant store: persisted mapping from role id to its granted route keys
//!
//! Implementations must apply `replace_grant_set` as a single atomic
//! operation keyed by role id. Two replaces for the same role serialize with
//! the later one winning in full; readers observe either the previous or the
//! new set, never a mixture.

pub mod file;
pub mod memory;

pub use file::FileGrantStore;
pub use memory::MemoryGrantStore;

use crate::error::CoreResult;
use crate::models::GrantSet;
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Grant storage trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// Get the grant set of a role, `None` if the role was never committed
    async fn get_grant_set(&self, role_id: &str) -> CoreResult<Option<GrantSet>>;

    /// Replace the grant set of a role and stamp it with the current time
    async fn replace_grant_set(&self, role_id: &str, keys: BTreeSet<String>) -> CoreResult<GrantSet>;

    /// List every stored grant set
    async fn list_all_grant_sets(&self) -> CoreResult<Vec<GrantSet>>;

    /// Check whether the backing storage is reachable
    async fn health_check(&self) -> bool {
        self.list_all_grant_sets().await.is_ok()
    }
}
