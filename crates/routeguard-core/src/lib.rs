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

//! Routeguard core
//!
//! Role-based route access: builds per-role permission trees over a route
//! catalog, reconciles submitted selections into atomic grant set
//! replacements, and reports grant statistics across roles.

pub mod audit;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod models;
pub mod roles;
pub mod seed;
pub mod store;

pub use audit::{AuditEntry, AuditLog};
pub use catalog::{CatalogIndex, RouteCatalog, StaticCatalog};
pub use engine::PermissionEngine;
pub use error::{CoreError, CoreResult};
pub use models::*;
pub use roles::{RoleDirectory, StaticRoleDirectory};
pub use seed::Seed;
pub use store::{FileGrantStore, GrantStore, MemoryGrantStore};
