use serde::{Serialize, Deserialize};

use crate::activation::ActivationFunction;
use crate::error::{NnError, Result};
use crate::loss::LossType;
use crate::network::builder::{NetworkBuilder, DEFAULT_LEARNING_RATE};
use crate::network::network::Network;

/// Default seed for the weight generator.
pub const DEFAULT_SEED: u64 = 1;

/// A fully serializable description of a layered network: its shape, the
/// activation every neuron uses, the training hyperparameters and the seed
/// the initial weights are drawn with.
///
/// Building the same spec twice yields bit-identical networks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub input_size: usize,
    /// Hidden layer sizes, input side first. May be empty.
    #[serde(default)]
    pub hidden_layers: Vec<usize>,
    pub output_size: usize,
    #[serde(default)]
    pub activation: ActivationFunction,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default)]
    pub loss: LossType,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_learning_rate() -> f64 {
    DEFAULT_LEARNING_RATE
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

impl NetworkSpec {
    pub fn new(input_size: usize, hidden_layers: Vec<usize>, output_size: usize) -> Self {
        NetworkSpec {
            input_size,
            hidden_layers,
            output_size,
            activation: ActivationFunction::default(),
            learning_rate: DEFAULT_LEARNING_RATE,
            loss: LossType::default(),
            seed: DEFAULT_SEED,
        }
    }

    /// Checks sizes and hyperparameters without building anything.
    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 || self.output_size == 0 {
            return Err(NnError::Config("input and output layers must not be empty".into()));
        }
        if let Some(i) = self.hidden_layers.iter().position(|&size| size == 0) {
            return Err(NnError::Config(format!("hidden layer {} is empty", i + 1)));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(NnError::Config(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if let ActivationFunction::Sigmoid { alpha } = self.activation {
            if !alpha.is_finite() || alpha <= 0.0 {
                return Err(NnError::Config(format!("sigmoid alpha must be positive, got {alpha}")));
            }
        }
        Ok(())
    }

    pub fn build(&self) -> Result<Network> {
        self.validate()?;
        let mut builder = NetworkBuilder::new(self.seed, self.activation);
        builder
            .learning_rate(self.learning_rate)
            .loss(self.loss)
            .add_input_layer(self.input_size)?;
        for &size in &self.hidden_layers {
            builder.add_hidden_layer(size)?;
        }
        builder.add_output_layer(self.output_size)?;
        builder.build()
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetworkSpec` from a JSON file and validates it.
    pub fn load_json(path: &str) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let spec: NetworkSpec = serde_json::from_reader(reader)?;
        spec.validate()?;
        Ok(spec)
    }
}
