use crate::error::{NnError, Result};

/// Pull-based stream of training examples.
///
/// `input` and `target` must return the same values on every call between
/// two `prepare_next` calls. What they return before the first successful
/// `prepare_next` is unspecified.
pub trait DataSource {
    /// Advances to the next example; `Ok(false)` when the source is exhausted.
    /// I/O failures are returned as errors and end the current learning run.
    fn prepare_next(&mut self) -> Result<bool>;

    fn input(&self) -> &[f64];

    /// Expected output, or `None` for an unlabeled example.
    fn target(&self) -> Option<&[f64]>;
}

/// One input vector with its optional target.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub input: Vec<f64>,
    pub target: Option<Vec<f64>>,
}

impl Example {
    pub fn labeled(input: Vec<f64>, target: Vec<f64>) -> Self {
        Example { input, target: Some(target) }
    }

    pub fn unlabeled(input: Vec<f64>) -> Self {
        Example { input, target: None }
    }
}

/// In-memory data source walking a list of examples in order, for a fixed
/// number of passes or forever.
#[derive(Debug, Clone)]
pub struct VecDataSource {
    examples: Vec<Example>,
    /// `None` cycles forever.
    passes: Option<usize>,
    completed_passes: usize,
    next: usize,
    current: Option<usize>,
}

impl VecDataSource {
    /// Single pass over `examples`.
    pub fn new(examples: Vec<Example>) -> Self {
        VecDataSource {
            examples,
            passes: Some(1),
            completed_passes: 0,
            next: 0,
            current: None,
        }
    }

    /// Labeled examples from parallel input/target lists.
    pub fn from_pairs(inputs: Vec<Vec<f64>>, targets: Vec<Vec<f64>>) -> Result<Self> {
        if inputs.len() != targets.len() {
            return Err(NnError::SizeMismatch { expected: inputs.len(), actual: targets.len() });
        }
        let examples = inputs
            .into_iter()
            .zip(targets)
            .map(|(input, target)| Example::labeled(input, target))
            .collect();
        Ok(VecDataSource::new(examples))
    }

    pub fn with_passes(mut self, passes: usize) -> Self {
        self.passes = Some(passes);
        self
    }

    pub fn cycle_forever(mut self) -> Self {
        self.passes = None;
        self
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    fn current(&self) -> Option<&Example> {
        self.current.map(|i| &self.examples[i])
    }
}

impl DataSource for VecDataSource {
    fn prepare_next(&mut self) -> Result<bool> {
        if self.examples.is_empty() || self.passes == Some(0) {
            return Ok(false);
        }
        if self.next == self.examples.len() {
            self.completed_passes += 1;
            if matches!(self.passes, Some(passes) if self.completed_passes >= passes) {
                self.current = None;
                return Ok(false);
            }
            self.next = 0;
        }
        self.current = Some(self.next);
        self.next += 1;
        Ok(true)
    }

    fn input(&self) -> &[f64] {
        self.current().map(|e| e.input.as_slice()).unwrap_or(&[])
    }

    fn target(&self) -> Option<&[f64]> {
        self.current().and_then(|e| e.target.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two() -> Vec<Example> {
        vec![
            Example::labeled(vec![0.0], vec![1.0]),
            Example::unlabeled(vec![1.0]),
        ]
    }

    #[test]
    fn single_pass_then_exhausted() {
        let mut src = VecDataSource::new(two());
        assert!(src.prepare_next().unwrap());
        assert_eq!(src.input(), &[0.0]);
        assert_eq!(src.target(), Some(&[1.0][..]));
        // Stable between advances.
        assert_eq!(src.input(), &[0.0]);
        assert!(src.prepare_next().unwrap());
        assert_eq!(src.target(), None);
        assert!(!src.prepare_next().unwrap());
        assert!(!src.prepare_next().unwrap());
    }

    #[test]
    fn multiple_passes() {
        let mut src = VecDataSource::new(two()).with_passes(3);
        let mut count = 0;
        while src.prepare_next().unwrap() {
            count += 1;
        }
        assert_eq!(count, 6);
    }

    #[test]
    fn cycling_source_never_ends() {
        let mut src = VecDataSource::new(two()).cycle_forever();
        for _ in 0..101 {
            assert!(src.prepare_next().unwrap());
        }
        assert_eq!(src.input(), &[0.0]);
    }

    #[test]
    fn empty_source_is_exhausted_immediately() {
        let mut src = VecDataSource::new(vec![]).cycle_forever();
        assert!(!src.prepare_next().unwrap());
        assert!(src.input().is_empty());
    }

    #[test]
    fn from_pairs_checks_lengths() {
        let res = VecDataSource::from_pairs(vec![vec![0.0], vec![1.0]], vec![vec![1.0]]);
        assert!(matches!(res, Err(NnError::SizeMismatch { expected: 2, actual: 1 })));
        assert_eq!(VecDataSource::from_pairs(vec![vec![0.0]], vec![vec![1.0]]).unwrap().len(), 1);
    }
}
