//! Node environment: the data directories a node was started with.
//!
//! # Storage Layout
//!
//! ```text
//! <data_path>/
//! +-- nodes/
//!     +-- <node_id>/              # NodePath root
//!         +-- indices/
//!             +-- <index>/
//!                 +-- <shard>/    # shard directory
//!                     +-- _state/
//!                     +-- index/
//!                     +-- translog/
//! ```
//!
//! Node paths are opened once at startup and live as long as the node.
//! Placement code borrows the environment; it never owns node paths.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{IndexSettings, NodeConfig};
use crate::error::{PlacementError, Result};
use crate::shard_id::{Index, ShardId};
use crate::space::{StatvfsSpace, UsableSpace};

pub const NODES_FOLDER: &str = "nodes";
pub const INDICES_FOLDER: &str = "indices";

// ── NodePath ───────────────────────────────────────────────────────

/// One configured data directory and the volume behind it.
#[derive(Clone)]
pub struct NodePath {
    /// `<data_path>/nodes/<node_id>`
    path: PathBuf,
    /// `<path>/indices`
    indices_path: PathBuf,
    space: Arc<dyn UsableSpace>,
}

impl NodePath {
    pub fn new(path: impl Into<PathBuf>, space: Arc<dyn UsableSpace>) -> Self {
        let path = path.into();
        let indices_path = path.join(INDICES_FOLDER);
        Self {
            path,
            indices_path,
            space,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn indices_path(&self) -> &Path {
        &self.indices_path
    }

    /// Directory holding all shards of `index` on this path.
    pub fn resolve_index(&self, index: &Index) -> PathBuf {
        self.indices_path.join(index.name())
    }

    /// Shard directory for `shard_id` on this path.
    pub fn resolve(&self, shard_id: &ShardId) -> PathBuf {
        self.resolve_index(shard_id.index())
            .join(shard_id.id().to_string())
    }

    /// Live usable-space reading for the volume behind this path.
    pub fn usable_space(&self) -> io::Result<u64> {
        self.space.usable_space()
    }
}

impl fmt::Debug for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodePath")
            .field("path", &self.path)
            .field("space", &self.space)
            .finish()
    }
}

// ── NodeEnvironment ────────────────────────────────────────────────

/// The ordered set of node paths plus the settings needed to resolve
/// custom data locations.
#[derive(Debug)]
pub struct NodeEnvironment {
    node_paths: Vec<NodePath>,
    shared_data_path: Option<PathBuf>,
    node_id: u32,
    add_node_id_to_custom_path: bool,
}

impl NodeEnvironment {
    /// Open the environment described by `config`.
    ///
    /// Creates `<data_path>/nodes/<node_id>/indices` for every data path
    /// and attaches a statvfs-backed space probe to each.
    pub fn open(config: &NodeConfig) -> Result<Self> {
        config.validate()?;

        let mut node_paths = Vec::with_capacity(config.data_paths.len());
        for data_path in &config.data_paths {
            let root = data_path
                .join(NODES_FOLDER)
                .join(config.node_id.to_string());
            let node_path = NodePath::new(&root, Arc::new(StatvfsSpace::new(&root)));
            std::fs::create_dir_all(node_path.indices_path())?;
            tracing::debug!(path = %root.display(), "opened node path");
            node_paths.push(node_path);
        }

        Ok(Self {
            node_paths,
            shared_data_path: config.shared_data_path.clone(),
            node_id: config.node_id,
            add_node_id_to_custom_path: config.add_node_id_to_custom_path,
        })
    }

    /// Build an environment from already-opened node paths.
    pub fn from_node_paths(node_paths: Vec<NodePath>) -> Result<Self> {
        if node_paths.is_empty() {
            return Err(PlacementError::NoNodePaths);
        }
        let mut seen = HashSet::with_capacity(node_paths.len());
        for node_path in &node_paths {
            if !seen.insert(node_path.path()) {
                return Err(PlacementError::InvalidConfig(format!(
                    "node path configured more than once: {}",
                    node_path.path().display()
                )));
            }
        }
        Ok(Self {
            node_paths,
            shared_data_path: None,
            node_id: 0,
            add_node_id_to_custom_path: true,
        })
    }

    pub fn with_shared_data_path(mut self, shared_data_path: impl Into<PathBuf>) -> Self {
        self.shared_data_path = Some(shared_data_path.into());
        self
    }

    pub fn with_node_id(mut self, node_id: u32, add_to_custom_path: bool) -> Self {
        self.node_id = node_id;
        self.add_node_id_to_custom_path = add_to_custom_path;
        self
    }

    pub fn node_paths(&self) -> &[NodePath] {
        &self.node_paths
    }

    pub fn node_id(&self) -> u32 {
        self.node_id
    }

    pub fn shared_data_path(&self) -> Option<&Path> {
        self.shared_data_path.as_deref()
    }

    /// Candidate shard directories for `shard_id`, one per node path,
    /// in node-path order.
    pub fn available_shard_paths(&self, shard_id: &ShardId) -> Vec<PathBuf> {
        self.node_paths.iter().map(|p| p.resolve(shard_id)).collect()
    }

    pub fn has_custom_data_path(settings: &IndexSettings) -> bool {
        settings.has_custom_data_path()
    }

    /// Resolve the custom data location of `shard_id`:
    /// `<shared>/<data_path>[/<node_id>]/<index>/<shard>`.
    pub fn resolve_custom_location(
        &self,
        settings: &IndexSettings,
        shard_id: &ShardId,
    ) -> Result<PathBuf> {
        let custom = settings.data_path.as_deref().ok_or_else(|| {
            PlacementError::InvalidConfig(format!(
                "index {} has no custom data path",
                shard_id.index()
            ))
        })?;
        let shared = self.shared_data_path.as_deref().ok_or_else(|| {
            PlacementError::SharedDataPathNotConfigured {
                index: shard_id.index_name().to_string(),
            }
        })?;

        let mut location = shared.join(custom);
        if self.add_node_id_to_custom_path {
            location.push(self.node_id.to_string());
        }
        location.push(shard_id.index_name());
        location.push(shard_id.id().to_string());
        Ok(location)
    }

    /// Map a shard state path back to the root of the node path whose
    /// `indices/` directory contains it. The deepest match wins when node
    /// paths nest. `None` if the path is under no configured node path.
    pub fn shard_state_path_to_data_path(&self, shard_state_path: &Path) -> Option<&Path> {
        self.node_paths
            .iter()
            .filter(|p| {
                shard_state_path != p.indices_path() && shard_state_path.starts_with(p.indices_path())
            })
            .max_by_key(|p| p.indices_path().components().count())
            .map(NodePath::path)
    }

    /// Shard ordinals of `index` that have a directory on any node path.
    pub fn find_all_shard_ids(&self, index: &Index) -> Result<BTreeSet<ShardId>> {
        let mut shard_ids = BTreeSet::new();
        for node_path in &self.node_paths {
            let index_dir = node_path.resolve_index(index);
            let entries = match std::fs::read_dir(&index_dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            for entry in entries {
                let entry = entry?;
                if !entry.file_type()?.is_dir() {
                    continue;
                }
                if let Some(id) = entry.file_name().to_str().and_then(|n| n.parse::<u32>().ok()) {
                    shard_ids.insert(ShardId::new(index.clone(), id));
                }
            }
        }
        Ok(shard_ids)
    }
}
