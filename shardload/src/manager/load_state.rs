/// Lifecycle of a parameter loading session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Loading {
        pending: usize,
    },
    AllShardsIngested,
    Materialized,
    /// Materialization failed; terminal.
    Failed,
}

/// What a single ingestion call accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingested {
    /// Chunk buffered; `received` bytes of the file so far.
    Buffered {
        received: usize,
    },
    /// The file was parsed into the cache; `pending` files remain.
    ShardCompleted {
        shard_index: usize,
        pending: usize,
    },
    /// The last file was parsed and the parameter store is ready.
    Materialized,
}
