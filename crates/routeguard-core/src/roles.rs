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

//! Role directory collaborator

use crate::error::{CoreError, CoreResult};
use crate::models::Role;
use async_trait::async_trait;
use std::collections::HashSet;

/// Source of truth for which roles exist
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    /// Check whether a role id is known
    async fn role_exists(&self, role_id: &str) -> CoreResult<bool>;

    /// List every known role
    async fn list_roles(&self) -> CoreResult<Vec<Role>>;
}

/// Role directory held in process
#[derive(Debug, Clone, Default)]
pub struct StaticRoleDirectory {
    roles: Vec<Role>,
    ids: HashSet<String>,
}

impl StaticRoleDirectory {
    pub fn new(roles: Vec<Role>) -> CoreResult<Self> {
        let mut ids = HashSet::with_capacity(roles.len());
        for role in &roles {
            if role.role_id.trim().is_empty() {
                return Err(CoreError::validation(format!("Role '{}' has an empty id", role.name)));
            }
            if !ids.insert(role.role_id.clone()) {
                return Err(CoreError::validation(format!("Duplicate role id '{}'", role.role_id)));
            }
        }

        Ok(Self { roles, ids })
    }
}

#[async_trait]
impl RoleDirectory for StaticRoleDirectory {
    async fn role_exists(&self, role_id: &str) -> CoreResult<bool> {
        Ok(self.ids.contains(role_id))
    }

    async fn list_roles(&self) -> CoreResult<Vec<Role>> {
        Ok(self.roles.clone())
    }
}
