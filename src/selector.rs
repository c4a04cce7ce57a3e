//! Choosing a node path for a newly created shard.

use crate::config::IndexSettings;
use crate::error::{PlacementError, Result};
use crate::estimator::estimate_reserved_bytes;
use crate::node_env::{NodeEnvironment, NodePath};
use crate::shard_id::ShardId;
use crate::shard_path::ShardPath;

/// Pick a location for a shard that has no state on this node yet.
///
/// Custom-data-path indices skip balancing: data goes to the configured
/// location and state to the first node path. Otherwise the node path
/// with the most usable space, after deducting bytes reserved by hosted
/// shards, wins; ties go to the earlier path.
pub fn select_new_path_for_shard<'a>(
    env: &NodeEnvironment,
    shard_id: &ShardId,
    settings: &IndexSettings,
    avg_shard_size_bytes: u64,
    hosted_shards: impl IntoIterator<Item = &'a ShardPath>,
) -> Result<ShardPath> {
    let index_uuid = settings.index_uuid();
    let first = env.node_paths().first().ok_or(PlacementError::NoNodePaths)?;

    if NodeEnvironment::has_custom_data_path(settings) {
        let data_path = env.resolve_custom_location(settings, shard_id)?;
        let state_path = first.resolve(shard_id);
        tracing::debug!(
            shard = %shard_id,
            data_path = %data_path.display(),
            state_path = %state_path.display(),
            "selected custom data path"
        );
        return Ok(ShardPath::new(data_path, state_path, index_uuid, shard_id.clone()));
    }

    let reserved = estimate_reserved_bytes(env, avg_shard_size_bytes, hosted_shards)?;

    let mut best: Option<(&NodePath, i128)> = None;
    for node_path in env.node_paths() {
        let usable = node_path.usable_space()?;
        let available = i128::from(usable) - i128::from(reserved.get(node_path.path()));
        tracing::trace!(
            path = %node_path.path().display(),
            usable,
            available,
            "candidate node path"
        );
        if best.map_or(true, |(_, max)| available > max) {
            best = Some((node_path, available));
        }
    }
    let (chosen, available) = best.ok_or(PlacementError::NoNodePaths)?;

    let state_path = chosen.resolve(shard_id);
    tracing::debug!(
        shard = %shard_id,
        path = %state_path.display(),
        available,
        estimated_shard_size = reserved.estimated_shard_size(),
        "selected new shard path"
    );
    Ok(ShardPath::new(
        state_path.clone(),
        state_path,
        index_uuid,
        shard_id.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shard_id::Index;
    use crate::space::FixedSpace;
    use proptest::prelude::*;
    use std::path::{Path, PathBuf};
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
        let shard_id = ShardId::new(Index::new("old"), shard);
        let dir = env.node_paths()[disk].resolve(&shard_id);
        ShardPath::new(&dir, &dir, "u0", shard_id)
    }

    fn new_shard() -> ShardId {
        ShardId::new(Index::new("logs"), 0)
    }

    #[test]
    fn test_most_usable_space_wins() {
        let env = env_with(&[100, 300, 200]);
        let path =
            select_new_path_for_shard(&env, &new_shard(), &IndexSettings::with_uuid("u1"), 0, [])
                .unwrap();
        assert_eq!(path.data_path(), Path::new("/disk1/nodes/0/indices/logs/0"));
        assert_eq!(path.data_path(), path.shard_state_path());
        assert_eq!(path.index_uuid(), "u1");
    }

    #[test]
    fn test_reserved_bytes_steer_away_from_busy_disk() {
        let env = env_with(&[100, 100, 100]);
        let shards = vec![hosted(&env, 0, 0), hosted(&env, 0, 1)];

        let path = select_new_path_for_shard(
            &env,
            &new_shard(),
            &IndexSettings::with_uuid("u1"),
            10,
            &shards,
        )
        .unwrap();
        // 5% of 300 is 15 > 10, so disk0 keeps 70; disks 1 and 2 tie at 100.
        assert_eq!(path.data_path(), Path::new("/disk1/nodes/0/indices/logs/0"));
    }

    #[test]
    fn test_ties_go_to_first_path() {
        let env = env_with(&[50, 50, 50]);
        let path =
            select_new_path_for_shard(&env, &new_shard(), &IndexSettings::default(), 0, [])
                .unwrap();
        assert_eq!(path.data_path(), Path::new("/disk0/nodes/0/indices/logs/0"));
        assert_eq!(path.index_uuid(), "_na_");
    }

    #[test]
    fn test_reserved_can_exceed_usable() {
        let env = env_with(&[10, 0]);
        let shards: Vec<ShardPath> = (0..5).map(|i| hosted(&env, 0, i)).collect();
        let path = select_new_path_for_shard(
            &env,
            &new_shard(),
            &IndexSettings::with_uuid("u1"),
            100,
            &shards,
        )
        .unwrap();
        assert_eq!(path.data_path(), Path::new("/disk1/nodes/0/indices/logs/0"));
    }

    #[test]
    fn test_custom_data_path_ignores_balancing() {
        let env = env_with(&[1, 1_000_000])
            .with_shared_data_path("/shared")
            .with_node_id(0, false);
        let settings = IndexSettings::with_uuid("u1").data_path("fast");

        let path = select_new_path_for_shard(&env, &new_shard(), &settings, 0, []).unwrap();
        assert_eq!(path.data_path(), Path::new("/shared/fast/logs/0"));
        assert_eq!(
            path.shard_state_path(),
            PathBuf::from("/disk0/nodes/0/indices/logs/0")
        );
        assert!(path.is_custom_data_path());
    }

    proptest! {
        #[test]
        fn prop_custom_data_path_wins_regardless_of_space(
            usable in proptest::collection::vec(0u64..1_000_000_000, 1..5),
            placements in proptest::collection::vec(0usize..5, 0..20),
            avg in 0u64..1_000_000_000,
            add_node_id in any::<bool>(),
        ) {
            let env = env_with(&usable)
                .with_shared_data_path("/shared")
                .with_node_id(2, add_node_id);
            let shards: Vec<ShardPath> = placements
                .iter()
                .enumerate()
                .map(|(i, disk)| hosted(&env, disk % usable.len(), i as u32))
                .collect();
            let settings = IndexSettings::with_uuid("u1").data_path("fast");

            let path =
                select_new_path_for_shard(&env, &new_shard(), &settings, avg, &shards).unwrap();

            let expected = env.resolve_custom_location(&settings, &new_shard()).unwrap();
            prop_assert_eq!(path.data_path(), expected.as_path());
            prop_assert!(path.shard_state_path().starts_with(env.node_paths()[0].path()));
            prop_assert!(path.is_custom_data_path());
        }
    }
}
