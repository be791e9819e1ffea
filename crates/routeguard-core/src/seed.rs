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

//! Seed file describing the route catalog and role directory

use crate::catalog::StaticCatalog;
use crate::error::{CoreError, CoreResult};
use crate::models::{Role, RouteGroup};
use crate::roles::StaticRoleDirectory;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Parsed seed file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub groups: Vec<RouteGroup>,

    #[serde(default)]
    pub roles: Vec<Role>,
}

impl Seed {
    /// Parse a seed document, filling each route's group key from its group
    pub fn parse(content: &str) -> CoreResult<Self> {
        let mut seed: Seed = toml::from_str(content)?;
        for group in &mut seed.groups {
            for route in &mut group.routes {
                if route.group_key.is_empty() {
                    route.group_key = group.key.clone();
                }
            }
        }
        Ok(seed)
    }

    /// Load a seed file from disk
    pub async fn load<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CoreError::validation(format!("Failed to read seed file {}: {}", path.display(), e)))?;
        let seed = Self::parse(&content)?;
        info!("Loaded seed {}: {} group(s), {} role(s)", path.display(), seed.groups.len(), seed.roles.len());
        Ok(seed)
    }

    /// Build the in-process collaborators described by the seed
    pub fn into_parts(self) -> CoreResult<(StaticCatalog, StaticRoleDirectory)> {
        Ok((StaticCatalog::new(self.groups)?, StaticRoleDirectory::new(self.roles)?))
    }
}
