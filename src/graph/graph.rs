use std::collections::VecDeque;

use crate::activation::ActivationFunction;
use crate::error::{NnError, Result};
use crate::graph::cursor::EdgeCursor;
use crate::graph::label::NodeLabel;
use crate::graph::node::{Assigned, ConsumerLink, Edge, Neuron, NeuronRole, Node, NodeId, NodeKind, NodeState};
use crate::loss::LossType;
use crate::network::observer::WeightObserver;

/// Arena of input nodes and neurons connected by weighted edges.
///
/// Nodes are addressed by [`NodeId`]. Every neuron keeps its ordered incoming
/// edges; every node keeps links back to the edges that consume it, which is
/// what the backward pass walks.
///
/// Two counters drive invalidation:
/// - `epoch` guards externally assigned values (input values, etalons) and is
///   bumped by [`NeuronGraph::erase`];
/// - `generation` guards the per-neuron memo and is bumped by `erase` and by
///   every assignment.
///
/// Weight updates do not invalidate anything: after a training step the memo
/// still describes the forward pass the weights were trained against.
#[derive(Debug, Clone)]
pub struct NeuronGraph {
    nodes: Vec<Node>,
    epoch: u64,
    generation: u64,
}

impl Default for NeuronGraph {
    fn default() -> Self {
        NeuronGraph::new()
    }
}

impl NeuronGraph {
    pub fn new() -> Self {
        NeuronGraph {
            nodes: Vec::new(),
            epoch: 1,
            generation: 1,
        }
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    pub fn add_input_node(&mut self, label: NodeLabel) -> NodeId {
        self.push(Node::input(label, None, false))
    }

    /// Input node whose value is permanently `value`; `erase` leaves it set.
    pub fn add_constant_node(&mut self, label: NodeLabel, value: f64) -> NodeId {
        let assigned = Assigned { epoch: self.epoch, value };
        self.push(Node::input(label, Some(assigned), true))
    }

    pub fn add_hidden_neuron(&mut self, label: NodeLabel, activation: ActivationFunction) -> NodeId {
        self.push(Node::neuron(label, NeuronRole::Hidden, activation))
    }

    pub fn add_output_neuron(&mut self, label: NodeLabel, activation: ActivationFunction) -> NodeId {
        self.push(Node::neuron(label, NeuronRole::Output { etalon: None }, activation))
    }

    /// Appends an edge `input -> neuron` and links `neuron` back as a consumer
    /// of `input`. Adding the same input twice creates two independent edges.
    pub fn add_input(&mut self, neuron: NodeId, input: NodeId, weight: f64) -> Result<()> {
        self.node(input)?;
        let edge = {
            let target = self.neuron_mut(neuron)?;
            target.inputs.push(Edge::new(input, weight));
            target.inputs.len() - 1
        };
        self.nodes[input.0].consumers.push(ConsumerLink { consumer: neuron, edge });
        self.generation += 1;
        Ok(())
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` addresses a node of this graph.
    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.0].kind()
    }

    pub fn label(&self, id: NodeId) -> NodeLabel {
        self.nodes[id.0].label
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|node| node.edges().len()).sum()
    }

    /// Cursor over the incoming edges of `id` (empty for input nodes).
    pub fn edge_cursor(&self, id: NodeId) -> EdgeCursor<'_> {
        EdgeCursor::new(self.nodes[id.0].edges())
    }

    /// Neurons reading `id`, once per edge.
    pub fn consumers(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id.0].consumers.iter().map(|link| link.consumer)
    }

    /// Human-readable state: an input's value, or an output's etalon and value.
    pub fn debug_label(&self, id: NodeId) -> String {
        let node = &self.nodes[id.0];
        match &node.state {
            NodeState::Input { .. } => self
                .input_value(id)
                .map(|value| value.to_string())
                .unwrap_or_default(),
            NodeState::Neuron(neuron) => {
                let NeuronRole::Output { .. } = neuron.role else {
                    return String::new();
                };
                let mut parts = Vec::new();
                if let Ok(etalon) = self.etalon(id) {
                    parts.push(format!("etalon: {etalon:.8}"));
                }
                if let Some(output) = neuron.cache.output(self.generation) {
                    parts.push(format!("output: {output:.8}"));
                }
                parts.join(", ")
            }
        }
    }

    // -----------------------------------------------------------------------
    // Assigned values
    // -----------------------------------------------------------------------

    pub fn set_input_value(&mut self, id: NodeId, value: f64) -> Result<()> {
        let epoch = self.epoch;
        match &mut self.nodes[id.0].state {
            NodeState::Input { value: slot, .. } => *slot = Some(Assigned { epoch, value }),
            NodeState::Neuron(_) => {
                return Err(NnError::WrongNodeKind { node: id, expected: "an input node" })
            }
        }
        self.generation += 1;
        Ok(())
    }

    pub fn input_value(&self, id: NodeId) -> Result<f64> {
        let node = &self.nodes[id.0];
        match &node.state {
            NodeState::Input { value, fixed } => value
                .filter(|assigned| *fixed || assigned.epoch == self.epoch)
                .map(|assigned| assigned.value)
                .ok_or_else(|| {
                    NnError::UninitializedState(format!("input value of node {} was not set", node.label))
                }),
            NodeState::Neuron(_) => Err(NnError::WrongNodeKind { node: id, expected: "an input node" }),
        }
    }

    pub fn set_etalon(&mut self, id: NodeId, value: f64) -> Result<()> {
        let epoch = self.epoch;
        match &mut self.neuron_mut(id)?.role {
            NeuronRole::Output { etalon } => *etalon = Some(Assigned { epoch, value }),
            NeuronRole::Hidden => {
                return Err(NnError::WrongNodeKind { node: id, expected: "an output neuron" })
            }
        }
        self.generation += 1;
        Ok(())
    }

    pub fn etalon(&self, id: NodeId) -> Result<f64> {
        let label = self.nodes[id.0].label;
        match &self.neuron(id)?.role {
            NeuronRole::Output { etalon } => etalon
                .filter(|assigned| assigned.epoch == self.epoch)
                .map(|assigned| assigned.value)
                .ok_or_else(|| NnError::UninitializedState(format!("etalon of node {label} was not set"))),
            NeuronRole::Hidden => Err(NnError::WrongNodeKind { node: id, expected: "an output neuron" }),
        }
    }

    /// Forgets every per-example value: input values (except fixed ones),
    /// etalons and the neuron memo. O(1).
    pub fn erase(&mut self) {
        self.epoch += 1;
        self.generation += 1;
    }

    // -----------------------------------------------------------------------
    // Forward pass
    // -----------------------------------------------------------------------

    /// `activation(Σ weight_i * input_i)`, memoised until the next erase or
    /// assignment. Input nodes return their assigned value.
    pub fn output_value(&mut self, id: NodeId) -> Result<f64> {
        if self.kind(id) == NodeKind::Input {
            return self.input_value(id);
        }
        self.evaluate_forward(id)?;
        self.value_of(id)
    }

    /// Weighted input sum of a neuron.
    pub fn weighted_sum(&mut self, id: NodeId) -> Result<f64> {
        self.evaluate_forward(id)?;
        let generation = self.generation;
        Ok(self.neuron(id)?.cache.sum(generation).unwrap_or_default())
    }

    /// Value of a node whose forward pass is already known.
    fn value_of(&self, id: NodeId) -> Result<f64> {
        match &self.nodes[id.0].state {
            NodeState::Input { .. } => self.input_value(id),
            NodeState::Neuron(neuron) => neuron.cache.output(self.generation).ok_or_else(|| {
                NnError::UninitializedState(format!("value of node {} was not computed", self.nodes[id.0].label))
            }),
        }
    }

    fn is_forward_ready(&self, id: NodeId) -> bool {
        match &self.nodes[id.0].state {
            NodeState::Input { .. } => true,
            NodeState::Neuron(neuron) => neuron.cache.is_current(self.generation),
        }
    }

    /// Computes every stale neuron `target` depends on, inputs first.
    fn evaluate_forward(&mut self, target: NodeId) -> Result<()> {
        let mut expanded = vec![false; self.nodes.len()];
        let mut stack = vec![(target, false)];
        while let Some((id, children_done)) = stack.pop() {
            if self.is_forward_ready(id) {
                continue;
            }
            if children_done {
                self.compute_forward(id)?;
                continue;
            }
            if expanded[id.0] {
                return Err(NnError::CyclicGraph);
            }
            expanded[id.0] = true;
            stack.push((id, true));
            for edge in self.nodes[id.0].edges().iter().rev() {
                if !self.is_forward_ready(edge.source()) {
                    stack.push((edge.source(), false));
                }
            }
        }
        Ok(())
    }

    fn compute_forward(&mut self, id: NodeId) -> Result<()> {
        let generation = self.generation;
        let (sum, activation) = {
            let neuron = self.neuron(id)?;
            let mut cursor = EdgeCursor::new(&neuron.inputs);
            let mut sum = 0.0;
            if cursor.move_to_first() {
                loop {
                    sum += cursor.weight()? * self.value_of(cursor.node()?)?;
                    if !cursor.step_next()? {
                        break;
                    }
                }
            }
            (sum, neuron.activation)
        };
        self.neuron_mut(id)?.cache.store_forward(
            generation,
            sum,
            activation.function(sum),
            activation.derivative(sum),
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Backward pass
    // -----------------------------------------------------------------------

    /// ∂E/∂sum of a neuron.
    ///
    /// Output neurons: `loss'(output, etalon) * activation'(sum)`.
    /// Hidden neurons: `activation'(sum) * Σ consumer_weight * consumer_derivative`
    /// over every edge reading this neuron. Memoised like the forward values.
    pub fn error_derivative_by_sum(&mut self, id: NodeId, loss: LossType) -> Result<f64> {
        self.neuron(id)?;
        let mut expanded = vec![false; self.nodes.len()];
        let mut stack = vec![(id, false)];
        while let Some((current, consumers_done)) = stack.pop() {
            if self.cached_error_derivative(current).is_some() {
                continue;
            }
            if consumers_done {
                self.compute_backward(current, loss)?;
                continue;
            }
            if expanded[current.0] {
                return Err(NnError::CyclicGraph);
            }
            expanded[current.0] = true;
            stack.push((current, true));
            for link in self.nodes[current.0].consumers.iter().rev() {
                if self.cached_error_derivative(link.consumer).is_none() {
                    stack.push((link.consumer, false));
                }
            }
        }
        self.cached_error_derivative(id).ok_or_else(|| {
            NnError::UninitializedState(format!("error derivative of node {} was not computed", self.label(id)))
        })
    }

    fn cached_error_derivative(&self, id: NodeId) -> Option<f64> {
        match &self.nodes[id.0].state {
            NodeState::Input { .. } => None,
            NodeState::Neuron(neuron) => neuron.cache.error_derivative(self.generation),
        }
    }

    fn compute_backward(&mut self, id: NodeId, loss: LossType) -> Result<()> {
        self.evaluate_forward(id)?;
        let generation = self.generation;
        let neuron = self.neuron(id)?;
        let activation_derivative = neuron.cache.activation_derivative(generation).unwrap_or_default();
        let derivative = match neuron.role {
            NeuronRole::Output { .. } => {
                let output = self.value_of(id)?;
                loss.derivative(output, self.etalon(id)?) * activation_derivative
            }
            NeuronRole::Hidden => {
                let mut downstream = 0.0;
                for link in &self.nodes[id.0].consumers {
                    let consumer = self.neuron(link.consumer)?;
                    let weight = consumer.inputs[link.edge].weight;
                    let consumer_derivative = consumer.cache.error_derivative(generation).ok_or_else(|| {
                        NnError::UninitializedState(format!(
                            "error derivative of node {} was not computed",
                            self.label(link.consumer)
                        ))
                    })?;
                    downstream += weight * consumer_derivative;
                }
                activation_derivative * downstream
            }
        };
        self.neuron_mut(id)?.cache.store_error_derivative(generation, derivative);
        Ok(())
    }

    /// Gradient step on every incoming edge of `id`:
    /// `new = old - learning_rate * input_value * error_derivative_by_sum`.
    ///
    /// Returns the effect, `Σ |new - old|`. Only this neuron's edges move;
    /// callers that want the whole graph updated walk it in reverse
    /// topological order. Input nodes return zero. The observer is called
    /// synchronously for every edge before the new weight is committed.
    pub fn backpropagate(
        &mut self,
        id: NodeId,
        learning_rate: f64,
        loss: LossType,
        observer: &mut dyn WeightObserver,
    ) -> Result<f64> {
        if self.kind(id) == NodeKind::Input {
            return Ok(0.0);
        }
        let derivative = self.error_derivative_by_sum(id, loss)?;
        let edge_count = self.neuron(id)?.inputs.len();
        let mut effect = 0.0;
        for i in 0..edge_count {
            let edge = self.neuron(id)?.inputs[i];
            let input_value = self.value_of(edge.source())?;
            let new_weight = edge.weight - learning_rate * input_value * derivative;
            effect += (edge.weight - new_weight).abs();
            observer.on_weight_changed(edge.source(), id, edge.weight, new_weight);
            self.neuron_mut(id)?.inputs[i].weight = new_weight;
        }
        Ok(effect)
    }

    // -----------------------------------------------------------------------
    // Structure
    // -----------------------------------------------------------------------

    /// Leaves reachable from `id` through incoming edges, in discovery order.
    /// A node without incoming edges is its own sole terminal.
    pub fn terminal_inputs(&self, id: NodeId) -> Vec<NodeId> {
        let mut visited = vec![false; self.nodes.len()];
        let mut terminals = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if visited[current.0] {
                continue;
            }
            visited[current.0] = true;
            let edges = self.nodes[current.0].edges();
            if edges.is_empty() {
                terminals.push(current);
            }
            for edge in edges.iter().rev() {
                if !visited[edge.source().0] {
                    stack.push(edge.source());
                }
            }
        }
        terminals
    }

    /// Every node ordered so that each edge goes from an earlier node to a
    /// later one (Kahn's algorithm, ties broken by id).
    pub fn topological_order(&self) -> Result<Vec<NodeId>> {
        let mut pending: Vec<usize> = self.nodes.iter().map(|node| node.edges().len()).collect();
        let mut ready: VecDeque<NodeId> = self
            .node_ids()
            .filter(|id| pending[id.0] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(id) = ready.pop_front() {
            order.push(id);
            for link in &self.nodes[id.0].consumers {
                pending[link.consumer.0] -= 1;
                if pending[link.consumer.0] == 0 {
                    ready.push_back(link.consumer);
                }
            }
        }
        if order.len() != self.nodes.len() {
            return Err(NnError::CyclicGraph);
        }
        Ok(order)
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id.0)
            .ok_or(NnError::WrongNodeKind { node: id, expected: "a node of this graph" })
    }

    fn neuron(&self, id: NodeId) -> Result<&Neuron> {
        match &self.node(id)?.state {
            NodeState::Neuron(neuron) => Ok(neuron),
            NodeState::Input { .. } => Err(NnError::WrongNodeKind { node: id, expected: "a neuron" }),
        }
    }

    fn neuron_mut(&mut self, id: NodeId) -> Result<&mut Neuron> {
        let node = self
            .nodes
            .get_mut(id.0)
            .ok_or(NnError::WrongNodeKind { node: id, expected: "a node of this graph" })?;
        match &mut node.state {
            NodeState::Neuron(neuron) => Ok(neuron),
            NodeState::Input { .. } => Err(NnError::WrongNodeKind { node: id, expected: "a neuron" }),
        }
    }
}
