use serde::{Serialize, Deserialize};

/// Nonlinearity applied by a neuron to its weighted input sum.
///
/// Every neuron carries its own copy, so parameters such as the sigmoid
/// steepness live with the neuron rather than in a shared global.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ActivationFunction {
    /// Logistic sigmoid `1 / (1 + e^(-alpha * x))`.
    Sigmoid { alpha: f64 },
    Tanh,
    Identity,
}

impl Default for ActivationFunction {
    fn default() -> Self {
        ActivationFunction::Sigmoid { alpha: 1.0 }
    }
}

impl ActivationFunction {
    pub fn sigmoid(alpha: f64) -> Self {
        ActivationFunction::Sigmoid { alpha }
    }

    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid { alpha } => 1.0 / (1.0 + (-alpha * x).exp()),
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::Identity => x,
        }
    }

    /// Derivative with respect to the weighted sum `x`.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid { alpha } => {
                let fx = self.function(x);
                alpha * fx * (1.0 - fx)
            }
            ActivationFunction::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
            ActivationFunction::Identity => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_is_half_at_zero() {
        let f = ActivationFunction::sigmoid(0.5);
        assert!((f.function(0.0) - 0.5).abs() < 1e-12);
        // alpha * 0.5 * 0.5
        assert!((f.derivative(0.0) - 0.125).abs() < 1e-12);
    }

    #[test]
    fn sigmoid_derivative_matches_finite_difference() {
        let f = ActivationFunction::sigmoid(2.0);
        let h = 1e-6;
        for &x in &[-1.5, -0.2, 0.3, 1.7] {
            let numeric = (f.function(x + h) - f.function(x - h)) / (2.0 * h);
            assert!((numeric - f.derivative(x)).abs() < 1e-6, "x = {x}");
        }
    }

    #[test]
    fn steeper_sigmoid_saturates_faster() {
        let flat = ActivationFunction::sigmoid(0.5);
        let steep = ActivationFunction::sigmoid(4.0);
        assert!(steep.function(1.0) > flat.function(1.0));
        assert!(steep.function(-1.0) < flat.function(-1.0));
    }

    #[test]
    fn round_trips_through_json() {
        let f = ActivationFunction::sigmoid(0.75);
        let json = serde_json::to_string(&f).unwrap();
        assert!(json.contains("Sigmoid"));
        let back: ActivationFunction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, f);
    }

    #[test]
    fn identity_and_tanh() {
        assert_eq!(ActivationFunction::Identity.function(3.5), 3.5);
        assert_eq!(ActivationFunction::Identity.derivative(3.5), 1.0);
        assert!((ActivationFunction::Tanh.derivative(0.0) - 1.0).abs() < 1e-12);
    }
}
