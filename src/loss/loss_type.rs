use serde::{Serialize, Deserialize};

use crate::loss::least_squares::LeastSquaresLoss;
use crate::loss::mae::MaeLoss;

/// Selects the error function a network reports and trains against.
///
/// - `LeastSquares`: `½ · Σ(output - etalon)²`, derivative `output - etalon`.
/// - `Mae`: `Σ|output - etalon|`, derivative `sign(output - etalon)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    #[default]
    LeastSquares,
    Mae,
}

impl LossType {
    pub fn loss(&self, outputs: &[f64], etalons: &[f64]) -> f64 {
        match self {
            LossType::LeastSquares => LeastSquaresLoss::loss(outputs, etalons),
            LossType::Mae          => MaeLoss::loss(outputs, etalons),
        }
    }

    pub fn derivative(&self, output: f64, etalon: f64) -> f64 {
        match self {
            LossType::LeastSquares => LeastSquaresLoss::derivative(output, etalon),
            LossType::Mae          => MaeLoss::derivative(output, etalon),
        }
    }
}
