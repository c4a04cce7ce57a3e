//! Persisted per-shard state.
//!
//! Each shard directory carries a `_state/` folder with one or more
//! `state-<generation>.st` JSON files. Only the highest generation is
//! authoritative; older ones are leftovers from interrupted writes.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{PlacementError, Result};

pub const STATE_DIR_NAME: &str = "_state";

fn state_file_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^state-(\d+)\.st$").expect("static regex"))
}

/// State record written into a shard directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShardStateMetaData {
    /// Monotonic version; doubles as the file generation.
    pub version: u64,
    pub primary: bool,
    pub index_uuid: String,
}

impl ShardStateMetaData {
    pub fn new(version: u64, primary: bool, index_uuid: impl Into<String>) -> Self {
        Self {
            version,
            primary,
            index_uuid: index_uuid.into(),
        }
    }
}

/// Reads the latest persisted shard state from a shard directory.
///
/// Implementations return `Ok(None)` when no state was ever written and
/// an error when state exists but cannot be read. A partially decoded
/// record is never returned.
pub trait ShardStateReader {
    fn load_latest_state(&self, shard_dir: &Path) -> Result<Option<ShardStateMetaData>>;
}

/// JSON state files under `<shard>/_state/`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShardStateFormat;

impl ShardStateFormat {
    /// All `(generation, path)` state files in `shard_dir`, unsorted.
    fn state_files(shard_dir: &Path) -> Result<Vec<(u64, PathBuf)>> {
        let state_dir = shard_dir.join(STATE_DIR_NAME);
        let entries = match std::fs::read_dir(&state_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(caps) = state_file_pattern().captures(name) else { continue };
            match caps[1].parse::<u64>() {
                Ok(generation) => files.push((generation, entry.path())),
                Err(_) => tracing::warn!(
                    path = %entry.path().display(),
                    "ignoring state file with out-of-range generation"
                ),
            }
        }
        Ok(files)
    }

    /// Remove `state-*.st.tmp` files left behind by interrupted writes.
    fn remove_stale_tmp_files(state_dir: &Path) -> Result<()> {
        for entry in std::fs::read_dir(state_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with("state-") && name.ends_with(".st.tmp") {
                tracing::debug!(path = %entry.path().display(), "removing stale state tmp file");
                std::fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }

    /// Atomically write `state` as `state-<version>.st` and remove every
    /// other generation along with tmp files of earlier interrupted writes.
    pub fn write(&self, state: &ShardStateMetaData, shard_dir: &Path) -> Result<PathBuf> {
        let state_dir = shard_dir.join(STATE_DIR_NAME);
        std::fs::create_dir_all(&state_dir)?;

        let file_name = format!("state-{}.st", state.version);
        let target = state_dir.join(&file_name);
        let tmp = state_dir.join(format!("{file_name}.tmp"));

        let json = serde_json::to_vec_pretty(state)?;
        {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, &target)?;

        for (generation, path) in Self::state_files(shard_dir)? {
            if generation != state.version {
                std::fs::remove_file(&path)?;
            }
        }
        Self::remove_stale_tmp_files(&state_dir)?;
        Ok(target)
    }
}

impl ShardStateReader for ShardStateFormat {
    fn load_latest_state(&self, shard_dir: &Path) -> Result<Option<ShardStateMetaData>> {
        let Some((generation, path)) = Self::state_files(shard_dir)?
            .into_iter()
            .max_by_key(|(generation, _)| *generation)
        else {
            return Ok(None);
        };

        let contents = std::fs::read(&path)?;
        let state: ShardStateMetaData = serde_json::from_slice(&contents).map_err(|e| {
            PlacementError::InvalidFormat(format!(
                "corrupt shard state {} (generation {generation}): {e}",
                path.display()
            ))
        })?;
        tracing::trace!(path = %path.display(), generation, "loaded shard state");
        Ok(Some(state))
    }
}
