use crate::graph::NodeId;

/// Receives weight updates while a network is being taught.
///
/// Callbacks run synchronously on the thread calling
/// [`Network::teach`](crate::network::Network::teach), inline with the
/// backward pass. An observer that blocks stalls training.
pub trait WeightObserver {
    /// Called for every edge `input -> output` just before `new_weight` is committed.
    fn on_weight_changed(&mut self, input: NodeId, output: NodeId, old_weight: f64, new_weight: f64);

    /// Called once per `teach`, after every output has finished updating.
    fn on_iteration_finished(&mut self) {}
}

/// No-op observer.
impl WeightObserver for () {
    fn on_weight_changed(&mut self, _input: NodeId, _output: NodeId, _old_weight: f64, _new_weight: f64) {}
}
