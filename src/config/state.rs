//! Local resource state
//!
//! Persists the state record of every managed linked storage account,
//! keyed by a local name, in a single JSON file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

use crate::error::{LalinkError, Result};
use crate::linked_storage::models::ResourceData;

const STATE_FORMAT_VERSION: u32 = 1;

/// One tracked resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEntry {
    #[serde(flatten)]
    pub data: ResourceData,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    version: u32,
    #[serde(default)]
    resources: BTreeMap<String, StateEntry>,
}

/// File-backed map of local name to resource state
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    resources: BTreeMap<String, StateEntry>,
}

impl StateStore {
    /// Load state from `path`; a missing file is an empty state
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            debug!("No state file at {}, starting empty", path.display());
            return Ok(Self {
                path,
                resources: BTreeMap::new(),
            });
        }

        let content = tokio::fs::read_to_string(&path).await?;
        let file: StateFile = serde_json::from_str(&content)?;
        if file.version > STATE_FORMAT_VERSION {
            return Err(LalinkError::state(format!(
                "State file {} has format version {} but this build only understands up to {}",
                path.display(),
                file.version,
                STATE_FORMAT_VERSION
            )));
        }

        debug!("Loaded {} resources from {}", file.resources.len(), path.display());
        Ok(Self {
            path,
            resources: file.resources,
        })
    }

    pub fn get(&self, name: &str) -> Option<&ResourceData> {
        self.resources.get(name).map(|entry| &entry.data)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &StateEntry)> {
        self.resources.iter()
    }

    /// Record `data` under `name`; a record without an id is dropped instead.
    pub fn put(&mut self, name: &str, data: ResourceData) {
        if data.is_new_resource() {
            self.resources.remove(name);
            return;
        }

        self.resources.insert(
            name.to_string(),
            StateEntry {
                data,
                updated_at: Utc::now(),
            },
        );
    }

    pub fn remove(&mut self, name: &str) -> Option<ResourceData> {
        self.resources.remove(name).map(|entry| entry.data)
    }

    /// Find the local name already tracking a remote id
    pub fn find_by_id(&self, id: &str) -> Option<&str> {
        self.resources
            .iter()
            .find(|(_, entry)| {
                entry
                    .data
                    .id
                    .as_deref()
                    .is_some_and(|tracked| tracked.eq_ignore_ascii_case(id))
            })
            .map(|(name, _)| name.as_str())
    }

    /// Write the state file through a temporary sibling and rename it into place
    pub async fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let file = StateFile {
            version: STATE_FORMAT_VERSION,
            resources: self.resources.clone(),
        };
        let content = serde_json::to_string_pretty(&file)?;

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        tokio::fs::write(&tmp_path, content).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        debug!("Saved state to {}", self.path.display());
        Ok(())
    }
}
