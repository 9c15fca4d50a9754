pub struct MaeLoss;

impl MaeLoss {
    /// Scalar absolute error: Σ|output - etalon|
    pub fn loss(outputs: &[f64], etalons: &[f64]) -> f64 {
        outputs.iter().zip(etalons.iter())
            .map(|(o, e)| (o - e).abs())
            .sum::<f64>()
    }

    /// Subgradient: sign(output - etalon), 0 when equal
    pub fn derivative(output: f64, etalon: f64) -> f64 {
        let diff = output - etalon;
        if diff > 0.0 { 1.0 } else if diff < 0.0 { -1.0 } else { 0.0 }
    }
}
