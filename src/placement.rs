//! Shard-open entry point: reuse an existing location or pick a new one.
//!
//! Callers must serialize placement decisions per node. Two concurrent
//! calls for different new shards each see only the hosted shards they
//! were given, so the reserved-bytes heuristic is best-effort under
//! concurrency.

use crate::config::IndexSettings;
use crate::error::Result;
use crate::locator::load_shard_path;
use crate::node_env::NodeEnvironment;
use crate::selector::select_new_path_for_shard;
use crate::shard_id::ShardId;
use crate::shard_path::ShardPath;
use crate::shard_state::{ShardStateFormat, ShardStateReader};

/// Borrowed view of a node environment and its shard-state reader.
pub struct ShardPlacement<'a, R: ShardStateReader + ?Sized = ShardStateFormat> {
    env: &'a NodeEnvironment,
    reader: &'a R,
}

impl<'a, R: ShardStateReader + ?Sized> ShardPlacement<'a, R> {
    pub fn new(env: &'a NodeEnvironment, reader: &'a R) -> Self {
        Self { env, reader }
    }

    pub fn env(&self) -> &NodeEnvironment {
        self.env
    }

    /// See [`load_shard_path`].
    pub fn locate(&self, shard_id: &ShardId, settings: &IndexSettings) -> Result<Option<ShardPath>> {
        load_shard_path(self.env, self.reader, shard_id, settings)
    }

    /// See [`select_new_path_for_shard`].
    pub fn select_new_path<'s>(
        &self,
        shard_id: &ShardId,
        settings: &IndexSettings,
        avg_shard_size_bytes: u64,
        hosted_shards: impl IntoIterator<Item = &'s ShardPath>,
    ) -> Result<ShardPath> {
        select_new_path_for_shard(self.env, shard_id, settings, avg_shard_size_bytes, hosted_shards)
    }

    /// Locate existing state for the shard, falling back to a fresh
    /// placement when none exists. Errors from discovery are never
    /// papered over with a new placement.
    pub fn load_or_select<'s>(
        &self,
        shard_id: &ShardId,
        settings: &IndexSettings,
        avg_shard_size_bytes: u64,
        hosted_shards: impl IntoIterator<Item = &'s ShardPath>,
    ) -> Result<ShardPath> {
        if let Some(existing) = self.locate(shard_id, settings)? {
            return Ok(existing);
        }
        self.select_new_path(shard_id, settings, avg_shard_size_bytes, hosted_shards)
    }
}
