//! Shard identity: the owning index plus the shard's ordinal within it.

use std::fmt;

/// An index, identified by name.
///
/// The index UUID is configuration, not identity: it comes from
/// [`IndexSettings`](crate::config::IndexSettings) and travels alongside
/// the shard id in [`ShardPath`](crate::shard_path::ShardPath).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Index {
    name: String,
}

impl Index {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.name)
    }
}

/// A single shard of an index. Rendered as `[index][n]` in logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShardId {
    index: Index,
    id: u32,
}

impl ShardId {
    pub fn new(index: Index, id: u32) -> Self {
        Self { index, id }
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn index_name(&self) -> &str {
        self.index.name()
    }

    pub fn id(&self) -> u32 {
        self.id
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.index, self.id)
    }
}
