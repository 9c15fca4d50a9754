pub mod error;
pub mod activation;
pub mod graph;
pub mod loss;
pub mod network;
pub mod train;

// Convenience re-exports
pub use error::{NnError, Result};
pub use activation::ActivationFunction;
pub use graph::{NeuronGraph, NodeId, NodeKind, NodeLabel};
pub use loss::LossType;
pub use network::{sigmoid_perceptron, Network, NetworkBuilder, NetworkSpec, WeightObserver};
pub use train::{
    AccumulatedResult, AccumulatingConsumer, BucketedAccumulator, DataSource, OnlineTeacher,
    ResultConsumer, StopReason, TeacherConfig, VecDataSource,
};
