use std::fmt;

use log::trace;

use crate::error::{NnError, Result};
use crate::graph::{NeuronGraph, NodeId, NodeKind};
use crate::loss::LossType;
use crate::network::observer::WeightObserver;

/// Feed-forward network over a [`NeuronGraph`].
///
/// Owns the declared input nodes, the constant (bias) inputs and the output
/// neurons. Construction checks that the terminal inputs reachable from the
/// outputs are exactly the declared inputs plus the bias nodes, and caches the
/// edge count and the order in which `teach` updates neurons.
///
/// Per example the network is either *unprimed* (inputs unset, reading an
/// output fails) or *primed* (after [`Network::conclude`] or
/// [`Network::teach`]). [`Network::erase`] makes it unprimed again.
pub struct Network {
    graph: NeuronGraph,
    inputs: Vec<NodeId>,
    bias_inputs: Vec<NodeId>,
    outputs: Vec<NodeId>,
    learning_rate: f64,
    loss: LossType,
    weights_count: usize,
    /// Neurons in reverse topological order: every consumer before its inputs.
    update_order: Vec<NodeId>,
    last_average_effect: Option<f64>,
    observer: Option<Box<dyn WeightObserver + Send>>,
}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Network")
            .field("inputs", &self.inputs.len())
            .field("bias_inputs", &self.bias_inputs.len())
            .field("outputs", &self.outputs.len())
            .field("neurons", &self.update_order.len())
            .field("weights_count", &self.weights_count)
            .field("learning_rate", &self.learning_rate)
            .field("loss", &self.loss)
            .finish()
    }
}

impl Network {
    /// Wraps an assembled graph.
    ///
    /// # Errors
    /// - `Config` for a non-positive or non-finite learning rate, no outputs
    ///   or no weights;
    /// - `WrongNodeKind` if a declared id is not in `graph`, or a declared
    ///   input or output has the wrong kind;
    /// - `CyclicGraph` if the edges form a cycle;
    /// - `TopologyInvalid` if the reachable terminal inputs differ from
    ///   `inputs ∪ bias_inputs`.
    pub fn new(
        graph: NeuronGraph,
        inputs: Vec<NodeId>,
        bias_inputs: Vec<NodeId>,
        outputs: Vec<NodeId>,
        learning_rate: f64,
        loss: LossType,
    ) -> Result<Network> {
        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return Err(NnError::Config(format!("learning rate must be positive, got {learning_rate}")));
        }
        if outputs.is_empty() {
            return Err(NnError::Config("network needs at least one output neuron".into()));
        }
        for &id in inputs.iter().chain(&bias_inputs).chain(&outputs) {
            if !graph.contains(id) {
                return Err(NnError::WrongNodeKind { node: id, expected: "a node of this graph" });
            }
        }
        for &id in inputs.iter().chain(&bias_inputs) {
            if graph.kind(id) != NodeKind::Input {
                return Err(NnError::WrongNodeKind { node: id, expected: "an input node" });
            }
        }
        for &id in &outputs {
            if graph.kind(id) != NodeKind::Output {
                return Err(NnError::WrongNodeKind { node: id, expected: "an output neuron" });
            }
        }

        let update_order = graph
            .topological_order()?
            .into_iter()
            .rev()
            .filter(|&id| graph.kind(id) != NodeKind::Input)
            .collect();

        let mut network = Network {
            graph,
            inputs,
            bias_inputs,
            outputs,
            learning_rate,
            loss,
            weights_count: 0,
            update_order,
            last_average_effect: None,
            observer: None,
        };
        network.weights_count = network.count_weights()?;
        if network.weights_count == 0 {
            return Err(NnError::Config("network has no weights".into()));
        }
        network.check_topology()?;
        Ok(network)
    }

    fn count_weights(&self) -> Result<usize> {
        let mut count = 0;
        self.traverse_network(|_, _, _| {
            count += 1;
            true
        })?;
        Ok(count)
    }

    fn check_topology(&self) -> Result<()> {
        let mut reachable = vec![false; self.graph.len()];
        for &output in &self.outputs {
            for terminal in self.graph.terminal_inputs(output) {
                reachable[terminal.index()] = true;
            }
        }
        let mut declared = vec![false; self.graph.len()];
        for &id in self.inputs.iter().chain(&self.bias_inputs) {
            declared[id.index()] = true;
        }

        let dangling = (0..self.graph.len()).filter(|&i| reachable[i] && !declared[i]).count();
        let implicit = (0..self.graph.len()).filter(|&i| declared[i] && !reachable[i]).count();
        if dangling > 0 || implicit > 0 {
            return Err(NnError::TopologyInvalid { dangling, implicit });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Evaluation and training
    // -----------------------------------------------------------------------

    /// Assigns the input vector. Outputs are computed lazily when read.
    pub fn conclude(&mut self, input: &[f64]) -> Result<()> {
        check_vector_size(input, self.inputs.len())?;
        for (&id, &value) in self.inputs.iter().zip(input) {
            self.graph.set_input_value(id, value)?;
        }
        Ok(())
    }

    /// One gradient-descent step on a single example.
    ///
    /// All error derivatives are computed first against the current weights,
    /// then every edge is updated exactly once, consumers before their inputs.
    /// The weight observer's end-of-iteration hook fires once at the end.
    ///
    /// Returns the average learning effect: the summed absolute weight change
    /// divided by [`Network::weights_count`].
    pub fn teach(&mut self, input: &[f64], etalon: &[f64]) -> Result<f64> {
        check_vector_size(etalon, self.outputs.len())?;
        self.conclude(input)?;
        self.assign_etalons(etalon)?;

        for &id in &self.update_order {
            self.graph.error_derivative_by_sum(id, self.loss)?;
        }

        let mut noop = ();
        let mut effect_sum = 0.0;
        for &id in &self.update_order {
            let observer: &mut dyn WeightObserver = match self.observer.as_deref_mut() {
                Some(observer) => observer,
                None => &mut noop,
            };
            effect_sum += self.graph.backpropagate(id, self.learning_rate, self.loss, observer)?;
        }
        if let Some(observer) = self.observer.as_deref_mut() {
            observer.on_iteration_finished();
        }

        let average = effect_sum / self.weights_count as f64;
        trace!("taught example: effect sum {effect_sum}, average effect {average}");
        self.last_average_effect = Some(average);
        Ok(average)
    }

    /// Error of the current outputs against the assigned etalons.
    pub fn error(&mut self) -> Result<f64> {
        let mut outputs = Vec::with_capacity(self.outputs.len());
        let mut etalons = Vec::with_capacity(self.outputs.len());
        for &id in &self.outputs {
            outputs.push(self.graph.output_value(id)?);
            etalons.push(self.graph.etalon(id)?);
        }
        Ok(self.loss.loss(&outputs, &etalons))
    }

    /// Derivative of the error by one output value.
    pub fn error_derivative(&self, output: f64, etalon: f64) -> f64 {
        self.loss.derivative(output, etalon)
    }

    /// `conclude` + etalon assignment + `error`, without training.
    pub fn error_for(&mut self, input: &[f64], etalon: &[f64]) -> Result<f64> {
        check_vector_size(etalon, self.outputs.len())?;
        self.conclude(input)?;
        self.assign_etalons(etalon)?;
        self.error()
    }

    /// Current value of every output neuron.
    pub fn result(&mut self) -> Result<Vec<f64>> {
        let mut values = Vec::with_capacity(self.outputs.len());
        for &id in &self.outputs {
            values.push(self.graph.output_value(id)?);
        }
        Ok(values)
    }

    /// Drops per-example state: inputs, etalons and the neuron memo.
    pub fn erase(&mut self) {
        self.graph.erase();
    }

    fn assign_etalons(&mut self, etalon: &[f64]) -> Result<()> {
        for (&id, &value) in self.outputs.iter().zip(etalon) {
            self.graph.set_etalon(id, value)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Traversal
    // -----------------------------------------------------------------------

    /// Depth-first walk from every output back through incoming edges,
    /// calling `listener(weight, input, output)` once per edge.
    ///
    /// A node is expanded at most once over the whole walk, so every edge is
    /// reported exactly once. The listener stops the walk by returning `false`.
    pub fn traverse_network<F>(&self, mut listener: F) -> Result<()>
    where
        F: FnMut(f64, NodeId, NodeId) -> bool,
    {
        let mut visited = vec![false; self.graph.len()];
        for &output in &self.outputs {
            if !self.traverse_inputs(output, &mut listener, &mut visited)? {
                break;
            }
        }
        Ok(())
    }

    /// Returns `Ok(false)` when the listener asked to stop.
    fn traverse_inputs<F>(&self, root: NodeId, listener: &mut F, visited: &mut [bool]) -> Result<bool>
    where
        F: FnMut(f64, NodeId, NodeId) -> bool,
    {
        if visited[root.index()] {
            return Ok(true);
        }
        visited[root.index()] = true;

        let mut stack = Vec::new();
        let mut cursor = self.graph.edge_cursor(root);
        if cursor.move_to_first() {
            stack.push((root, cursor));
        }
        while let Some((node, cursor)) = stack.last_mut() {
            let node = *node;
            let input = cursor.node()?;
            let weight = cursor.weight()?;
            if !cursor.step_next()? {
                stack.pop();
            }
            if !listener(weight, input, node) {
                return Ok(false);
            }
            if !visited[input.index()] {
                visited[input.index()] = true;
                let mut next = self.graph.edge_cursor(input);
                if next.move_to_first() {
                    stack.push((input, next));
                }
            }
        }
        Ok(true)
    }

    /// Every edge as `(input, output, weight)`, in traversal order.
    pub fn weights(&self) -> Result<Vec<(NodeId, NodeId, f64)>> {
        let mut weights = Vec::with_capacity(self.weights_count);
        self.traverse_network(|weight, input, output| {
            weights.push((input, output, weight));
            true
        })?;
        Ok(weights)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Number of edges, cached at construction.
    pub fn weights_count(&self) -> usize {
        self.weights_count
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn loss(&self) -> LossType {
        self.loss
    }

    /// Average effect returned by the most recent `teach`.
    pub fn last_average_effect(&self) -> Option<f64> {
        self.last_average_effect
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn input_ids(&self) -> &[NodeId] {
        &self.inputs
    }

    pub fn bias_ids(&self) -> &[NodeId] {
        &self.bias_inputs
    }

    pub fn output_ids(&self) -> &[NodeId] {
        &self.outputs
    }

    pub fn graph(&self) -> &NeuronGraph {
        &self.graph
    }

    /// Installs (or with `None` removes) the weight-change observer.
    pub fn set_weight_observer(&mut self, observer: Option<Box<dyn WeightObserver + Send>>) {
        self.observer = observer;
    }
}

fn check_vector_size(values: &[f64], expected: usize) -> Result<()> {
    if values.len() != expected {
        return Err(NnError::SizeMismatch { expected, actual: values.len() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction;
    use crate::graph::NodeLabel;

    const SIGMOID: ActivationFunction = ActivationFunction::Sigmoid { alpha: 1.0 };

    /// Two inputs straight into one output, plus bias.
    fn perceptron() -> Network {
        let mut g = NeuronGraph::new();
        let bias = g.add_constant_node(NodeLabel::bias(), 1.0);
        let x0 = g.add_input_node(NodeLabel::new(0, 0));
        let x1 = g.add_input_node(NodeLabel::new(0, 1));
        let o = g.add_output_neuron(NodeLabel::new(1, 0), SIGMOID);
        g.add_input(o, bias, 0.1).unwrap();
        g.add_input(o, x0, 0.2).unwrap();
        g.add_input(o, x1, 0.3).unwrap();
        Network::new(g, vec![x0, x1], vec![bias], vec![o], 0.5, LossType::LeastSquares).unwrap()
    }

    #[test]
    fn counts_weights_once() {
        assert_eq!(perceptron().weights_count(), 3);
    }

    #[test]
    fn conclude_rejects_wrong_size() {
        let mut net = perceptron();
        assert!(matches!(
            net.conclude(&[1.0]),
            Err(NnError::SizeMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn teach_rejects_wrong_etalon_size() {
        let mut net = perceptron();
        assert!(matches!(
            net.teach(&[1.0, 0.0], &[1.0, 0.0]),
            Err(NnError::SizeMismatch { expected: 1, actual: 2 })
        ));
    }

    #[test]
    fn reading_result_before_conclude_fails() {
        let mut net = perceptron();
        assert!(matches!(net.result(), Err(NnError::UninitializedState(_))));
        net.conclude(&[0.0, 0.0]).unwrap();
        assert!(net.result().is_ok());
        net.erase();
        assert!(matches!(net.result(), Err(NnError::UninitializedState(_))));
    }

    #[test]
    fn error_needs_etalon() {
        let mut net = perceptron();
        net.conclude(&[0.0, 1.0]).unwrap();
        assert!(matches!(net.error(), Err(NnError::UninitializedState(_))));
    }

    #[test]
    fn error_for_matches_least_squares() {
        let mut net = perceptron();
        let error = net.error_for(&[1.0, 1.0], &[0.0]).unwrap();
        let out = net.result().unwrap()[0];
        assert!((error - out * out / 2.0).abs() < 1e-15);
    }

    #[test]
    fn teach_returns_mean_absolute_change() {
        let mut net = perceptron();
        let before = net.weights().unwrap();
        let effect = net.teach(&[1.0, 0.0], &[1.0]).unwrap();
        let after = net.weights().unwrap();
        let total: f64 = before.iter().zip(&after).map(|(b, a)| (b.2 - a.2).abs()).sum();
        assert!((effect - total / 3.0).abs() < 1e-15);
        assert_eq!(net.last_average_effect(), Some(effect));
        // x1 was zero, so its edge did not move.
        let x1 = net.input_ids()[1];
        let moved: Vec<_> = before.iter().zip(&after).filter(|(b, a)| b.2 != a.2).map(|(b, _)| b.0).collect();
        assert!(!moved.contains(&x1));
    }

    #[test]
    fn listener_can_stop_traversal() {
        let net = perceptron();
        let mut seen = 0;
        net.traverse_network(|_, _, _| {
            seen += 1;
            seen < 2
        })
        .unwrap();
        assert_eq!(seen, 2);
    }

    #[test]
    fn rejects_non_positive_learning_rate() {
        let mut g = NeuronGraph::new();
        let x = g.add_input_node(NodeLabel::new(0, 0));
        let o = g.add_output_neuron(NodeLabel::new(1, 0), SIGMOID);
        g.add_input(o, x, 1.0).unwrap();
        assert!(matches!(
            Network::new(g, vec![x], vec![], vec![o], 0.0, LossType::LeastSquares),
            Err(NnError::Config(_))
        ));
    }

    #[test]
    fn rejects_network_without_outputs_or_weights() {
        assert!(matches!(
            Network::new(NeuronGraph::new(), vec![], vec![], vec![], 0.5, LossType::LeastSquares),
            Err(NnError::Config(_))
        ));

        let mut g = NeuronGraph::new();
        let x = g.add_input_node(NodeLabel::new(0, 0));
        let o = g.add_output_neuron(NodeLabel::new(1, 0), SIGMOID);
        assert!(matches!(
            Network::new(g, vec![x], vec![], vec![o], 0.5, LossType::LeastSquares),
            Err(NnError::Config(_))
        ));
    }

    #[test]
    fn rejects_ids_from_another_graph() {
        let mut g = NeuronGraph::new();
        let x = g.add_input_node(NodeLabel::new(0, 0));
        let o = g.add_output_neuron(NodeLabel::new(1, 0), SIGMOID);
        g.add_input(o, x, 1.0).unwrap();
        let mut larger = NeuronGraph::new();
        let foreign = (0..5).map(|p| larger.add_input_node(NodeLabel::new(0, p))).last().unwrap();
        assert!(matches!(
            Network::new(g, vec![x, foreign], vec![], vec![o], 0.5, LossType::LeastSquares),
            Err(NnError::WrongNodeKind { node, .. }) if node == foreign
        ));
    }

    #[test]
    fn declared_output_must_be_output_neuron() {
        let mut g = NeuronGraph::new();
        let x = g.add_input_node(NodeLabel::new(0, 0));
        let h = g.add_hidden_neuron(NodeLabel::new(1, 0), SIGMOID);
        g.add_input(h, x, 1.0).unwrap();
        assert!(matches!(
            Network::new(g, vec![x], vec![], vec![h], 0.1, LossType::LeastSquares),
            Err(NnError::WrongNodeKind { .. })
        ));
    }
}
