pub struct LeastSquaresLoss;

impl LeastSquaresLoss {
    /// Scalar least-squares error: ½ · Σ(output - etalon)²
    pub fn loss(outputs: &[f64], etalons: &[f64]) -> f64 {
        outputs.iter().zip(etalons.iter())
            .map(|(o, e)| (o - e).powi(2))
            .sum::<f64>() / 2.0
    }

    /// Derivative of the error by one output: output - etalon
    pub fn derivative(output: f64, etalon: f64) -> f64 {
        output - etalon
    }
}
