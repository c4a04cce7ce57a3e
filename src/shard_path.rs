//! Resolved on-disk placement of a single shard.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::shard_id::ShardId;
use crate::shard_state::STATE_DIR_NAME;

pub const INDEX_FOLDER_NAME: &str = "index";
pub const TRANSLOG_FOLDER_NAME: &str = "translog";

/// Where a shard's data and state live.
///
/// `data_path` equals `shard_state_path` unless the index has a custom
/// data location, in which case the data may sit on another filesystem.
///
/// Equality and hashing cover `(data_path, index_uuid, shard_id)` only:
/// two values naming the same physical placement are interchangeable.
#[derive(Debug, Clone)]
pub struct ShardPath {
    path: PathBuf,
    shard_state_path: PathBuf,
    index_uuid: String,
    shard_id: ShardId,
}

impl ShardPath {
    pub fn new(
        data_path: impl Into<PathBuf>,
        shard_state_path: impl Into<PathBuf>,
        index_uuid: impl Into<String>,
        shard_id: ShardId,
    ) -> Self {
        Self {
            path: data_path.into(),
            shard_state_path: shard_state_path.into(),
            index_uuid: index_uuid.into(),
            shard_id,
        }
    }

    pub fn data_path(&self) -> &Path {
        &self.path
    }

    pub fn shard_state_path(&self) -> &Path {
        &self.shard_state_path
    }

    pub fn index_uuid(&self) -> &str {
        &self.index_uuid
    }

    pub fn shard_id(&self) -> &ShardId {
        &self.shard_id
    }

    pub fn resolve_index(&self) -> PathBuf {
        self.path.join(INDEX_FOLDER_NAME)
    }

    pub fn resolve_translog(&self) -> PathBuf {
        self.path.join(TRANSLOG_FOLDER_NAME)
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn is_custom_data_path(&self) -> bool {
        self.path != self.shard_state_path
    }

    /// Create the index, translog and state directories.
    pub fn create_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(self.resolve_index())?;
        std::fs::create_dir_all(self.resolve_translog())?;
        std::fs::create_dir_all(self.shard_state_path.join(STATE_DIR_NAME))?;
        Ok(())
    }
}

impl PartialEq for ShardPath {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.index_uuid == other.index_uuid
            && self.shard_id == other.shard_id
    }
}

impl Eq for ShardPath {}

impl Hash for ShardPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
        self.index_uuid.hash(state);
        self.shard_id.hash(state);
    }
}

impl fmt::Display for ShardPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ShardPath{{path={}, indexUUID='{}', shard={}}}",
            self.path.display(),
            self.index_uuid,
            self.shard_id
        )
    }
}
