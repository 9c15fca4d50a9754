/// Per-example memo of one neuron.
///
/// Entries are only meaningful while `generation` equals the owning graph's
/// current generation; bumping the graph counter invalidates every neuron at
/// once without touching them.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct NeuronCache {
    generation: u64,
    sum: f64,
    output: f64,
    activation_derivative: f64,
    error_derivative: Option<f64>,
}

impl NeuronCache {
    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    pub(crate) fn store_forward(&mut self, generation: u64, sum: f64, output: f64, activation_derivative: f64) {
        *self = NeuronCache {
            generation,
            sum,
            output,
            activation_derivative,
            error_derivative: None,
        };
    }

    pub(crate) fn sum(&self, generation: u64) -> Option<f64> {
        self.is_current(generation).then_some(self.sum)
    }

    pub(crate) fn output(&self, generation: u64) -> Option<f64> {
        self.is_current(generation).then_some(self.output)
    }

    pub(crate) fn activation_derivative(&self, generation: u64) -> Option<f64> {
        self.is_current(generation).then_some(self.activation_derivative)
    }

    pub(crate) fn error_derivative(&self, generation: u64) -> Option<f64> {
        if self.is_current(generation) { self.error_derivative } else { None }
    }

    /// Only valid once the forward values of the same generation are stored.
    pub(crate) fn store_error_derivative(&mut self, generation: u64, derivative: f64) {
        debug_assert!(self.is_current(generation));
        self.error_derivative = Some(derivative);
    }
}
