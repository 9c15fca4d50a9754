pub mod builder;
pub mod export;
pub mod network;
pub mod observer;
pub mod spec;

pub use builder::{sigmoid_perceptron, NetworkBuilder};
pub use network::Network;
pub use observer::WeightObserver;
pub use spec::NetworkSpec;
