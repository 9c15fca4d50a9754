pub(crate) mod cache;
pub mod cursor;
pub mod graph;
pub mod label;
pub mod node;

pub use cursor::EdgeCursor;
pub use graph::NeuronGraph;
pub use label::{NodeLabel, BIAS_LAYER};
pub use node::{Edge, NodeId, NodeKind};
