//! Node and index configuration.
//!
//! `NodeConfig` is the node-level configuration, persisted as JSON
//! (`node_config.json` by convention) and read once at startup.
//! `IndexSettings` carries the per-index values placement cares about:
//! the index UUID and an optional custom data location.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PlacementError, Result};

/// Index UUID recorded by legacy state that predates UUIDs.
///
/// A persisted state carrying this value matches any expected UUID.
pub const INDEX_UUID_NA_VALUE: &str = "_na_";

// ── Node Config ────────────────────────────────────────────────────

fn default_add_node_id() -> bool {
    true
}

/// Node-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeConfig {
    /// Data directories, one per independent disk. Order is significant:
    /// the first path hosts state for custom-data-path shards.
    pub data_paths: Vec<PathBuf>,

    /// Root under which custom index data locations are resolved.
    #[serde(default)]
    pub shared_data_path: Option<PathBuf>,

    /// Local node ordinal; names the `nodes/<id>` directory.
    #[serde(default)]
    pub node_id: u32,

    /// Append the node id to custom data locations so nodes sharing a
    /// filesystem do not collide.
    #[serde(default = "default_add_node_id")]
    pub add_node_id_to_custom_path: bool,
}

impl NodeConfig {
    pub fn new(data_paths: Vec<PathBuf>) -> Self {
        Self {
            data_paths,
            shared_data_path: None,
            node_id: 0,
            add_node_id_to_custom_path: true,
        }
    }

    /// Read config from a JSON file. Returns None if the file doesn't exist.
    pub fn read_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        Ok(Some(config))
    }

    /// Write config as pretty JSON.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject configurations a node cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.data_paths.is_empty() {
            return Err(PlacementError::NoNodePaths);
        }
        let mut seen = HashSet::with_capacity(self.data_paths.len());
        for path in &self.data_paths {
            if !path.is_absolute() {
                return Err(PlacementError::InvalidConfig(format!(
                    "data path must be absolute: {}",
                    path.display()
                )));
            }
            if !seen.insert(path.components().collect::<PathBuf>()) {
                return Err(PlacementError::InvalidConfig(format!(
                    "data path configured more than once: {}",
                    path.display()
                )));
            }
        }
        if let Some(shared) = &self.shared_data_path {
            if !shared.is_absolute() {
                return Err(PlacementError::InvalidConfig(format!(
                    "shared data path must be absolute: {}",
                    shared.display()
                )));
            }
        }
        Ok(())
    }
}

// ── Index Settings ─────────────────────────────────────────────────

/// Per-index settings relevant to shard placement.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexSettings {
    /// Index UUID. Absent for indices created before UUIDs existed.
    #[serde(default)]
    pub uuid: Option<String>,

    /// Custom data location, relative to the node's shared data path.
    #[serde(default)]
    pub data_path: Option<String>,
}

impl IndexSettings {
    pub fn with_uuid(uuid: impl Into<String>) -> Self {
        Self {
            uuid: Some(uuid.into()),
            data_path: None,
        }
    }

    pub fn data_path(mut self, data_path: impl Into<String>) -> Self {
        self.data_path = Some(data_path.into());
        self
    }

    /// The configured UUID, or [`INDEX_UUID_NA_VALUE`] when unset.
    pub fn index_uuid(&self) -> &str {
        self.uuid.as_deref().unwrap_or(INDEX_UUID_NA_VALUE)
    }

    pub fn has_custom_data_path(&self) -> bool {
        self.data_path.is_some()
    }
}
