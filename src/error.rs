use thiserror::Error;

use crate::graph::NodeId;

/// Every failure the engine can report.
///
/// All variants except `Io` and `Json` are contract violations by the caller:
/// they are returned immediately and the engine never substitutes a default
/// value for the missing or malformed piece.
#[derive(Debug, Error)]
pub enum NnError {
    /// A value was read before it was assigned (input value, etalon, data source...).
    #[error("uninitialized state: {0}")]
    UninitializedState(String),

    /// A vector argument does not match the declared dimension.
    #[error("wrong parameter vector size: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// An edge cursor was read before `move_to_first` or after it ran off the end.
    #[error("edge cursor is not positioned on an edge")]
    InvalidCursor,

    /// Terminal inputs reachable from the outputs differ from the declared inputs.
    #[error("network topology is invalid: {dangling} dangling input(s), {implicit} implicit input(s)")]
    TopologyInvalid { dangling: usize, implicit: usize },

    /// The graph has a cycle, so it has no topological order.
    #[error("network graph contains a cycle")]
    CyclicGraph,

    /// The operation needs a different kind of node (e.g. an edge attached to an input node).
    #[error("node {node} is not {expected}")]
    WrongNodeKind { node: NodeId, expected: &'static str },

    /// Layers were declared out of order or twice.
    #[error("builder sequencing: {0}")]
    BuilderSequencing(String),

    /// A result consumer saw an (iteration, repeat) pair earlier than one it already consumed.
    #[error(
        "out-of-order consumption: ({iteration}, {repeat}) received after ({last_iteration}, {last_repeat})"
    )]
    OutOfOrderConsumption {
        iteration: u64,
        repeat: u32,
        last_iteration: u64,
        last_repeat: u32,
    },

    /// A bucket classifier returned an index outside the bucket range.
    #[error("bucket {bucket} is out of range for {buckets} bucket(s)")]
    BucketOutOfRange { bucket: usize, buckets: usize },

    /// Configuration values are inconsistent or out of range.
    #[error("config: {0}")]
    Config(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NnError>;
