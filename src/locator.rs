//! Discovery of a shard's existing on-disk location.
//!
//! Every node path is probed for persisted shard state. Exactly one
//! location may hold state for a given shard:
//!
//! - none: the shard has never been placed on this node
//! - one: it is authoritative, provided its index UUID matches
//! - more than one: fatal, the node needs operator attention
//!
//! Multiple locations are never resolved by picking the newest version;
//! guessing wrong means serving stale data.

use std::path::PathBuf;

use crate::config::{IndexSettings, INDEX_UUID_NA_VALUE};
use crate::error::{PlacementError, Result};
use crate::node_env::NodeEnvironment;
use crate::shard_id::ShardId;
use crate::shard_path::ShardPath;
use crate::shard_state::{ShardStateMetaData, ShardStateReader};

/// Find the authoritative state location of `shard_id` on this node.
///
/// Returns `Ok(None)` when no node path holds state for the shard. When
/// the index has a custom data location the returned data path is
/// resolved from configuration; otherwise it equals the state path.
pub fn load_shard_path<R: ShardStateReader + ?Sized>(
    env: &NodeEnvironment,
    reader: &R,
    shard_id: &ShardId,
    settings: &IndexSettings,
) -> Result<Option<ShardPath>> {
    let index_uuid = settings.index_uuid();

    let discovered = env
        .available_shard_paths(shard_id)
        .into_iter()
        .map(|path| -> Result<_> {
            let state = reader.load_latest_state(&path)?;
            tracing::trace!(shard = %shard_id, path = %path.display(), found = state.is_some(), "probed shard path");
            Ok((path, state))
        })
        .collect::<Result<Vec<_>>>()?;

    let Some(state_path) = resolve_discovered(shard_id, index_uuid, discovered)? else {
        return Ok(None);
    };

    let data_path = if NodeEnvironment::has_custom_data_path(settings) {
        env.resolve_custom_location(settings, shard_id)?
    } else {
        state_path.clone()
    };

    tracing::debug!(
        shard = %shard_id,
        data_path = %data_path.display(),
        state_path = %state_path.display(),
        "loaded shard path"
    );
    Ok(Some(ShardPath::new(
        data_path,
        state_path,
        index_uuid,
        shard_id.clone(),
    )))
}

/// Decide which of the probed `(path, state)` pairs is authoritative.
///
/// Absent states are dropped first; the decision is then made on how
/// many remain, so two present states fail regardless of their content.
pub fn resolve_discovered(
    shard_id: &ShardId,
    expected_uuid: &str,
    discovered: impl IntoIterator<Item = (PathBuf, Option<ShardStateMetaData>)>,
) -> Result<Option<PathBuf>> {
    let mut found: Vec<(PathBuf, ShardStateMetaData)> = discovered
        .into_iter()
        .filter_map(|(path, state)| state.map(|s| (path, s)))
        .collect();

    match found.len() {
        0 => Ok(None),
        1 => {
            let (path, state) = found.remove(0);
            if state.index_uuid == expected_uuid || state.index_uuid == INDEX_UUID_NA_VALUE {
                return Ok(Some(path));
            }
            tracing::warn!(
                shard = %shard_id,
                path = %path.display(),
                "found shard on path with a different index UUID - this shard seems to be leftover \
                 from a different index with the same name. Remove the leftover shard in order to \
                 reuse the path with the current index"
            );
            Err(PlacementError::IdentityMismatch {
                shard: shard_id.clone(),
                expected: expected_uuid.to_string(),
                found: state.index_uuid,
                path,
            })
        }
        _ => {
            let paths: Vec<PathBuf> = found.into_iter().map(|(path, _)| path).collect();
            tracing::warn!(shard = %shard_id, ?paths, "shard state found on more than one node path");
            Err(PlacementError::MultipleStateLocations {
                shard: shard_id.clone(),
                paths,
            })
        }
    }
}
