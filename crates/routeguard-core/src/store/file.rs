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

//! File-backed grant store, one JSON document per role

use crate::error::{CoreError, CoreResult};
use crate::models::GrantSet;
use crate::store::GrantStore;
use async_trait::async_trait;
use percent_encoding::{NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, warn};
use uuid::Uuid;

const DOCUMENT_EXTENSION: &str = "json";

/// Grant store persisting each role's grant set as `<data_dir>/<role>.json`
///
/// A replace writes a uniquely named temporary file next to the target and
/// renames it into place, so readers see either the old or the new document.
#[derive(Debug, Clone)]
pub struct FileGrantStore {
    data_dir: PathBuf,
}

impl FileGrantStore {
    /// Open a store rooted at `data_dir`, creating the directory if needed
    pub async fn open<P: AsRef<Path>>(data_dir: P) -> CoreResult<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir).await.map_err(|e| {
            error!("Failed to create grant directory {}: {}", data_dir.display(), e);
            CoreError::store_unavailable(format!("Failed to create {}: {}", data_dir.display(), e))
        })?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn document_path(&self, role_id: &str) -> PathBuf {
        let file_name = format!("{}.{}", utf8_percent_encode(role_id, NON_ALPHANUMERIC), DOCUMENT_EXTENSION);
        self.data_dir.join(file_name)
    }

    fn temp_path(&self, role_id: &str) -> PathBuf {
        let file_name = format!(".{}.{}.tmp", utf8_percent_encode(role_id, NON_ALPHANUMERIC), Uuid::new_v4().simple());
        self.data_dir.join(file_name)
    }

    /// Recover the role id from a document file name, skipping temporaries
    fn role_id_from_path(path: &Path) -> Option<String> {
        if path.extension().and_then(|ext| ext.to_str()) != Some(DOCUMENT_EXTENSION) {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        if stem.starts_with('.') {
            return None;
        }
        percent_decode_str(stem).decode_utf8().ok().map(|id| id.into_owned())
    }

    async fn read_document(&self, role_id: &str, path: &Path) -> CoreResult<Option<GrantSet>> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                error!("Failed to read grant document {}: {}", path.display(), e);
                return Err(e.into());
            }
        };

        let grant_set: GrantSet = serde_json::from_slice(&bytes)?;
        if grant_set.role_id != role_id {
            return Err(CoreError::store_unavailable(format!(
                "Grant document {} belongs to role '{}', expected '{}'",
                path.display(),
                grant_set.role_id,
                role_id
            )));
        }

        Ok(Some(grant_set))
    }
}

/// Write `contents` to `temp_path` and rename it over `target_path`,
/// removing the temporary on any failure
async fn write_atomically(temp_path: &Path, target_path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let result = match fs::write(temp_path, contents).await {
        Ok(()) => fs::rename(temp_path, target_path).await,
        Err(e) => Err(e),
    };
    if result.is_err() {
        if let Err(e) = fs::remove_file(temp_path).await {
            if e.kind() != ErrorKind::NotFound {
                warn!("Failed to remove temporary {}: {}", temp_path.display(), e);
            }
        }
    }
    result
}

#[async_trait]
impl GrantStore for FileGrantStore {
    async fn get_grant_set(&self, role_id: &str) -> CoreResult<Option<GrantSet>> {
        self.read_document(role_id, &self.document_path(role_id)).await
    }

    async fn replace_grant_set(&self, role_id: &str, keys: BTreeSet<String>) -> CoreResult<GrantSet> {
        let grant_set = GrantSet::new(role_id, keys);
        let json = serde_json::to_vec_pretty(&grant_set).map_err(|e| CoreError::store_unavailable(format!("Failed to serialize grant set: {}", e)))?;

        let temp_path = self.temp_path(role_id);
        let target_path = self.document_path(role_id);

        if let Err(e) = write_atomically(&temp_path, &target_path, &json).await {
            error!("Failed to write grant document for role {} via {}: {}", role_id, temp_path.display(), e);
            return Err(e.into());
        }

        debug!("Wrote grant document {}", target_path.display());
        Ok(grant_set)
    }

    async fn list_all_grant_sets(&self) -> CoreResult<Vec<GrantSet>> {
        let mut entries = fs::read_dir(&self.data_dir).await?;
        let mut grant_sets = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Some(role_id) = Self::role_id_from_path(&path) else {
                continue;
            };
            match self.read_document(&role_id, &path).await? {
                Some(grant_set) => grant_sets.push(grant_set),
                None => warn!("Grant document {} vanished while listing", path.display()),
            }
        }

        Ok(grant_sets)
    }

    async fn health_check(&self) -> bool {
        fs::metadata(&self.data_dir).await.map(|meta| meta.is_dir()).unwrap_or(false)
    }
}
