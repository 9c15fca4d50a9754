use std::fmt;

use crate::activation::ActivationFunction;
use crate::graph::cache::NeuronCache;
use crate::graph::label::NodeLabel;

/// Stable index of a node inside its [`NeuronGraph`](crate::graph::NeuronGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Input,
    Hidden,
    Output,
}

/// Weighted connection owned by the downstream neuron.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    source: NodeId,
    pub(crate) weight: f64,
}

impl Edge {
    pub(crate) fn new(source: NodeId, weight: f64) -> Self {
        Edge { source, weight }
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}

/// Back-reference from a node to one edge that reads it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ConsumerLink {
    pub(crate) consumer: NodeId,
    /// Position of the edge in the consumer's input list.
    pub(crate) edge: usize,
}

/// Externally assigned scalar, valid only during the epoch it was set in.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Assigned {
    pub(crate) epoch: u64,
    pub(crate) value: f64,
}

#[derive(Debug, Clone)]
pub(crate) enum NeuronRole {
    Hidden,
    Output { etalon: Option<Assigned> },
}

#[derive(Debug, Clone)]
pub(crate) struct Neuron {
    pub(crate) role: NeuronRole,
    pub(crate) activation: ActivationFunction,
    pub(crate) inputs: Vec<Edge>,
    pub(crate) cache: NeuronCache,
}

#[derive(Debug, Clone)]
pub(crate) enum NodeState {
    /// `fixed` values survive `erase` (the bias node).
    Input { value: Option<Assigned>, fixed: bool },
    Neuron(Neuron),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) label: NodeLabel,
    pub(crate) consumers: Vec<ConsumerLink>,
    pub(crate) state: NodeState,
}

impl Node {
    pub(crate) fn input(label: NodeLabel, value: Option<Assigned>, fixed: bool) -> Self {
        Node {
            label,
            consumers: Vec::new(),
            state: NodeState::Input { value, fixed },
        }
    }

    pub(crate) fn neuron(label: NodeLabel, role: NeuronRole, activation: ActivationFunction) -> Self {
        Node {
            label,
            consumers: Vec::new(),
            state: NodeState::Neuron(Neuron {
                role,
                activation,
                inputs: Vec::new(),
                cache: NeuronCache::default(),
            }),
        }
    }

    pub(crate) fn kind(&self) -> NodeKind {
        match &self.state {
            NodeState::Input { .. } => NodeKind::Input,
            NodeState::Neuron(Neuron { role: NeuronRole::Hidden, .. }) => NodeKind::Hidden,
            NodeState::Neuron(Neuron { role: NeuronRole::Output { .. }, .. }) => NodeKind::Output,
        }
    }

    pub(crate) fn edges(&self) -> &[Edge] {
        match &self.state {
            NodeState::Input { .. } => &[],
            NodeState::Neuron(neuron) => &neuron.inputs,
        }
    }
}
