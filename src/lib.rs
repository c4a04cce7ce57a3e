//! Shard placement for multi-path storage nodes.
//!
//! A node stores shards across one or more data directories, each on its
//! own volume. This crate answers two questions when a shard is opened:
//!
//! - Does the shard already have persisted state on one of the node paths,
//!   and is that state really ours? ([`load_shard_path`])
//! - If not, which node path should a new shard go to? ([`select_new_path_for_shard`])
//!
//! Both produce a [`ShardPath`]. [`ShardPlacement`] combines them in the
//! order the shard lifecycle needs.

pub mod config;
pub mod error;
pub mod estimator;
pub mod locator;
pub mod node_env;
pub mod placement;
pub mod selector;
pub mod shard_id;
pub mod shard_path;
pub mod shard_state;
pub mod space;

pub use config::{IndexSettings, NodeConfig, INDEX_UUID_NA_VALUE};
pub use error::{PlacementError, Result};
pub use estimator::{estimate_reserved_bytes, ReservedBytes};
pub use locator::load_shard_path;
pub use node_env::{NodeEnvironment, NodePath};
pub use placement::ShardPlacement;
pub use selector::select_new_path_for_shard;
pub use shard_id::{Index, ShardId};
pub use shard_path::ShardPath;
pub use shard_state::{ShardStateFormat, ShardStateMetaData, ShardStateReader};
pub use space::{FixedSpace, StatvfsSpace, UsableSpace};
