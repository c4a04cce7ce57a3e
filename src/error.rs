//! Error types for shard placement and state discovery

use std::path::PathBuf;

use thiserror::Error;

use crate::shard_id::ShardId;

pub type Result<T> = std::result::Result<T, PlacementError>;

#[derive(Error, Debug)]
pub enum PlacementError {
    /// A shard directory holds state written for a different index that
    /// happened to share the same name.
    #[error(
        "{shard} index UUID in shard state was: {found} expected: {expected} on shard path: {}",
        .path.display()
    )]
    IdentityMismatch {
        shard: ShardId,
        expected: String,
        found: String,
        path: PathBuf,
    },

    #[error("{shard} more than one shard state found: {paths:?}")]
    MultipleStateLocations { shard: ShardId, paths: Vec<PathBuf> },

    #[error("No node paths configured")]
    NoNodePaths,

    #[error("Index [{index}] uses a custom data path but no shared data path is configured")]
    SharedDataPathNotConfigured { index: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PlacementError {
    /// Stable error code for callers that report failures upstream
    pub fn code(&self) -> &'static str {
        match self {
            PlacementError::IdentityMismatch { .. } => "IDENTITY_MISMATCH",
            PlacementError::MultipleStateLocations { .. } => "MULTIPLE_STATE_LOCATIONS",
            PlacementError::NoNodePaths => "NO_NODE_PATHS",
            PlacementError::SharedDataPathNotConfigured { .. } => "SHARED_DATA_PATH_NOT_CONFIGURED",
            PlacementError::InvalidConfig(_) => "INVALID_CONFIG",
            PlacementError::InvalidFormat(_) => "INVALID_FORMAT",
            PlacementError::Io(_) | PlacementError::Json(_) => "IO_ERROR",
        }
    }
}
