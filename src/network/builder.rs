use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::activation::ActivationFunction;
use crate::error::{NnError, Result};
use crate::graph::{NeuronGraph, NodeId, NodeLabel};
use crate::loss::LossType;
use crate::network::network::Network;

/// Learning rate used when none is configured.
pub const DEFAULT_LEARNING_RATE: f64 = 0.5;

/// Assembles a fully connected layered network.
///
/// Layers must be declared in order: one input layer, any number of hidden
/// layers, then exactly one output layer. Every hidden and output neuron gets
/// an edge from the shared bias node plus an edge from every node of the
/// previous layer, each with a weight drawn uniformly from `[-1, 1]` using the
/// builder's seeded generator.
///
/// ```
/// use nodal_nn::{ActivationFunction, NetworkBuilder};
///
/// let mut builder = NetworkBuilder::new(7, ActivationFunction::sigmoid(0.5));
/// builder.add_input_layer(2)?.add_hidden_layer(3)?.add_output_layer(1)?;
/// let network = builder.build()?;
/// assert_eq!(network.weights_count(), 3 * 3 + 4);
/// # Ok::<(), nodal_nn::NnError>(())
/// ```
pub struct NetworkBuilder {
    graph: NeuronGraph,
    rng: StdRng,
    activation: ActivationFunction,
    learning_rate: f64,
    loss: LossType,
    bias: NodeId,
    inputs: Option<Vec<NodeId>>,
    last_layer: Option<Vec<NodeId>>,
    outputs: Option<Vec<NodeId>>,
    layers: Vec<usize>,
}

impl NetworkBuilder {
    /// Builder drawing its random weights from `StdRng::seed_from_u64(seed)`.
    pub fn new(seed: u64, activation: ActivationFunction) -> Self {
        NetworkBuilder::with_rng(StdRng::seed_from_u64(seed), activation)
    }

    pub fn with_rng(rng: StdRng, activation: ActivationFunction) -> Self {
        let mut graph = NeuronGraph::new();
        let bias = graph.add_constant_node(NodeLabel::bias(), 1.0);
        NetworkBuilder {
            graph,
            rng,
            activation,
            learning_rate: DEFAULT_LEARNING_RATE,
            loss: LossType::LeastSquares,
            bias,
            inputs: None,
            last_layer: None,
            outputs: None,
            layers: Vec::new(),
        }
    }

    pub fn learning_rate(&mut self, learning_rate: f64) -> &mut Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn loss(&mut self, loss: LossType) -> &mut Self {
        self.loss = loss;
        self
    }

    pub fn add_input_layer(&mut self, size: usize) -> Result<&mut Self> {
        if self.inputs.is_some() || self.last_layer.is_some() || self.outputs.is_some() {
            return Err(NnError::BuilderSequencing("input layer already set".into()));
        }
        check_layer_size(size)?;
        let inputs = (0..size)
            .map(|i| self.graph.add_input_node(NodeLabel::new(0, i)))
            .collect();
        self.inputs = Some(inputs);
        self.layers.push(size);
        Ok(self)
    }

    pub fn add_hidden_layer(&mut self, size: usize) -> Result<&mut Self> {
        if self.inputs.is_none() {
            return Err(NnError::BuilderSequencing("input layer must be set first".into()));
        }
        if self.outputs.is_some() {
            return Err(NnError::BuilderSequencing(
                "hidden layer can not be added after output layer".into(),
            ));
        }
        check_layer_size(size)?;
        let layer = self.layers.len();
        let activation = self.activation;
        let neurons = self.connect_layer(size, |graph, position| {
            graph.add_hidden_neuron(NodeLabel::new(layer, position), activation)
        })?;
        self.last_layer = Some(neurons);
        self.layers.push(size);
        Ok(self)
    }

    pub fn add_output_layer(&mut self, size: usize) -> Result<&mut Self> {
        if self.inputs.is_none() {
            return Err(NnError::BuilderSequencing("input layer must be set first".into()));
        }
        if self.outputs.is_some() {
            return Err(NnError::BuilderSequencing("output layer already set".into()));
        }
        check_layer_size(size)?;
        let layer = self.layers.len();
        let activation = self.activation;
        let neurons = self.connect_layer(size, |graph, position| {
            graph.add_output_neuron(NodeLabel::new(layer, position), activation)
        })?;
        self.outputs = Some(neurons);
        self.layers.push(size);
        Ok(self)
    }

    /// Creates `size` neurons with `make` and wires each to the bias node and
    /// to every node of the previous layer.
    fn connect_layer<F>(&mut self, size: usize, mut make: F) -> Result<Vec<NodeId>>
    where
        F: FnMut(&mut NeuronGraph, usize) -> NodeId,
    {
        let previous = match (&self.last_layer, &self.inputs) {
            (Some(layer), _) => layer.clone(),
            (None, Some(inputs)) => inputs.clone(),
            (None, None) => {
                return Err(NnError::BuilderSequencing("input layer must be set first".into()))
            }
        };
        let mut neurons = Vec::with_capacity(size);
        for position in 0..size {
            let neuron = make(&mut self.graph, position);
            let weight = self.random_weight();
            self.graph.add_input(neuron, self.bias, weight)?;
            for &input in &previous {
                let weight = self.random_weight();
                self.graph.add_input(neuron, input, weight)?;
            }
            neurons.push(neuron);
        }
        Ok(neurons)
    }

    fn random_weight(&mut self) -> f64 {
        self.rng.gen_range(-1.0..=1.0)
    }

    /// Consumes the builder and validates the assembled network.
    pub fn build(self) -> Result<Network> {
        let inputs = self
            .inputs
            .ok_or_else(|| NnError::BuilderSequencing("input layer was never added".into()))?;
        let outputs = self
            .outputs
            .ok_or_else(|| NnError::BuilderSequencing("output layer was never added".into()))?;
        let network = Network::new(
            self.graph,
            inputs,
            vec![self.bias],
            outputs,
            self.learning_rate,
            self.loss,
        )?;
        debug!(
            "built network: layers {:?}, {} weights, learning rate {}",
            self.layers,
            network.weights_count(),
            network.learning_rate()
        );
        Ok(network)
    }
}

fn check_layer_size(size: usize) -> Result<()> {
    if size == 0 {
        return Err(NnError::Config("layer must contain at least one node".into()));
    }
    Ok(())
}

/// Builds the standard sigmoid perceptron in one call.
pub fn sigmoid_perceptron(
    learning_rate: f64,
    alpha: f64,
    inputs: usize,
    outputs: usize,
    hidden_layers: &[usize],
    seed: u64,
) -> Result<Network> {
    let mut builder = NetworkBuilder::new(seed, ActivationFunction::sigmoid(alpha));
    builder.learning_rate(learning_rate).add_input_layer(inputs)?;
    for &size in hidden_layers {
        builder.add_hidden_layer(size)?;
    }
    builder.add_output_layer(outputs)?;
    builder.build()
}
