//! Reserved-bytes estimation for node paths.
//!
//! Current usable space alone is a poor placement signal: shards that were
//! just assigned to a disk have not grown yet, so a burst of new shards
//! would all land on whichever disk looks emptiest right now. Each hosted
//! shard therefore reserves an estimated share of its node path.
//!
//! The estimate is recomputed for every placement decision and never cached.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::node_env::NodeEnvironment;
use crate::shard_path::ShardPath;

/// Floor of the per-shard estimate, as a fraction of total node free space.
const MIN_SHARD_SIZE_FRACTION: f64 = 0.05;

/// Predicted additional bytes per node-path root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservedBytes {
    by_root: HashMap<PathBuf, u64>,
    estimated_shard_size: u64,
}

impl ReservedBytes {
    /// Reserved bytes for a node-path root; zero if no shard is hosted there.
    pub fn get(&self, root: &Path) -> u64 {
        self.by_root.get(root).copied().unwrap_or(0)
    }

    /// The per-shard figure each hosted shard contributed.
    pub fn estimated_shard_size(&self) -> u64 {
        self.estimated_shard_size
    }

    pub fn len(&self) -> usize {
        self.by_root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_root.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, u64)> {
        self.by_root.iter().map(|(root, bytes)| (root.as_path(), *bytes))
    }
}

/// Per-shard size estimate: the larger of the cluster's average shard size
/// and 5% of the node's total free space.
pub fn estimated_shard_size(avg_shard_size_bytes: u64, total_free_space: u64) -> u64 {
    let floor = (total_free_space as f64 * MIN_SHARD_SIZE_FRACTION) as u64;
    avg_shard_size_bytes.max(floor)
}

/// Guess how many more bytes the shards already hosted on each node path
/// will consume over their lifetime.
///
/// Paths hosting no shards are absent from the result.
pub fn estimate_reserved_bytes<'a>(
    env: &NodeEnvironment,
    avg_shard_size_bytes: u64,
    hosted_shards: impl IntoIterator<Item = &'a ShardPath>,
) -> Result<ReservedBytes> {
    let mut total_free_space: u64 = 0;
    for node_path in env.node_paths() {
        total_free_space = total_free_space.saturating_add(node_path.usable_space()?);
    }

    let estimated_shard_size = estimated_shard_size(avg_shard_size_bytes, total_free_space);

    let mut by_root: HashMap<PathBuf, u64> = HashMap::new();
    for shard in hosted_shards {
        let Some(root) = env.shard_state_path_to_data_path(shard.shard_state_path()) else {
            tracing::debug!(
                shard = %shard.shard_id(),
                path = %shard.shard_state_path().display(),
                "hosted shard is not under any node path, skipping"
            );
            continue;
        };
        let reserved = by_root.entry(root.to_path_buf()).or_insert(0);
        *reserved = reserved.saturating_add(estimated_shard_size);
    }

    Ok(ReservedBytes {
        by_root,
        estimated_shard_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node_env::NodePath;
    use crate::shard_id::{Index, ShardId};
    use crate::space::FixedSpace;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn env_with(usable: &[u64]) -> NodeEnvironment {
        let paths = usable
            .iter()
            .enumerate()
            .map(|(i, bytes)| {
                NodePath::new(
                    format!("/disk{i}/nodes/0"),
                    Arc::new(FixedSpace::new(*bytes)),
                )
            })
            .collect();
        NodeEnvironment::from_node_paths(paths).unwrap()
    }

    fn hosted(env: &NodeEnvironment, disk: usize, shard: u32) -> ShardPath {
        let shard_id = ShardId::new(Index::new("logs"), shard);
        let dir = env.node_paths()[disk].resolve(&shard_id);
        ShardPath::new(&dir, &dir, "u", shard_id)
    }

    #[test]
    fn test_floor_at_five_percent_of_free_space() {
        assert_eq!(estimated_shard_size(0, 1000), 50);
        assert_eq!(estimated_shard_size(10, 100), 10);
        assert_eq!(estimated_shard_size(70, 1000), 70);
    }

    #[test]
    fn test_accumulates_per_root() {
        let env = env_with(&[1000, 1000]);
        let shards = vec![hosted(&env, 0, 0), hosted(&env, 0, 1), hosted(&env, 1, 2)];

        let reserved = estimate_reserved_bytes(&env, 0, &shards).unwrap();
        // 5% of 2000
        assert_eq!(reserved.estimated_shard_size(), 100);
        assert_eq!(reserved.get(Path::new("/disk0/nodes/0")), 200);
        assert_eq!(reserved.get(Path::new("/disk1/nodes/0")), 100);
        assert_eq!(reserved.len(), 2);
    }

    #[test]
    fn test_paths_without_shards_are_absent() {
        let env = env_with(&[1000, 1000, 1000]);
        let shards = vec![hosted(&env, 2, 0)];

        let reserved = estimate_reserved_bytes(&env, 0, &shards).unwrap();
        assert_eq!(reserved.len(), 1);
        assert_eq!(reserved.get(Path::new("/disk0/nodes/0")), 0);

        let none = estimate_reserved_bytes(&env, 500, std::iter::empty()).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_short_state_path_is_skipped() {
        let env = env_with(&[1000]);
        let odd = ShardPath::new("x", "x", "u", ShardId::new(Index::new("logs"), 0));
        let reserved = estimate_reserved_bytes(&env, 0, [&odd]).unwrap();
        assert!(reserved.is_empty());
    }

    #[test]
    fn test_index_name_with_separator_reserves_on_its_node_path() {
        let env = env_with(&[1000, 1000]);
        let shard_id = ShardId::new(Index::new("a/b"), 0);
        let dir = env.node_paths()[0].resolve(&shard_id);
        let shard = ShardPath::new(&dir, &dir, "u", shard_id);

        let reserved = estimate_reserved_bytes(&env, 0, [&shard]).unwrap();
        assert_eq!(reserved.get(Path::new("/disk0/nodes/0")), 100);
        assert_eq!(reserved.len(), 1);
    }

    #[test]
    fn test_shard_outside_node_paths_is_skipped() {
        let env = env_with(&[1000]);
        let dir = PathBuf::from("/elsewhere/nodes/0/indices/logs/0");
        let shard = ShardPath::new(&dir, &dir, "u", ShardId::new(Index::new("logs"), 0));

        let reserved = estimate_reserved_bytes(&env, 0, [&shard]).unwrap();
        assert!(reserved.is_empty());
    }

    proptest! {
        #[test]
        fn prop_monotonic_in_avg_shard_size(
            usable in proptest::collection::vec(0u64..1_000_000_000, 1..5),
            placements in proptest::collection::vec(0usize..5, 0..20),
            low in 0u64..1_000_000_000,
            delta in 0u64..1_000_000_000,
        ) {
            let env = env_with(&usable);
            let shards: Vec<ShardPath> = placements
                .iter()
                .enumerate()
                .map(|(i, disk)| hosted(&env, disk % usable.len(), i as u32))
                .collect();

            let small = estimate_reserved_bytes(&env, low, &shards).unwrap();
            let large = estimate_reserved_bytes(&env, low + delta, &shards).unwrap();

            for node_path in env.node_paths() {
                prop_assert!(small.get(node_path.path()) <= large.get(node_path.path()));
            }
        }
    }
}
