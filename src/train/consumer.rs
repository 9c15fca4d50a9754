use crate::error::{NnError, Result};

/// Outcome of one teaching step, handed to every [`ResultConsumer`].
#[derive(Debug, Clone, Copy)]
pub struct Sample<'a> {
    /// Index of the example (0-based).
    pub iteration: u64,
    /// How many times this example was already taught before this step.
    pub repeat: u32,
    /// Error of the forward pass the step trained against.
    pub error: f64,
    /// Average learning effect returned by `teach`.
    pub effect: f64,
    pub input: &'a [f64],
    pub target: &'a [f64],
}

/// Observer of a teacher's run.
///
/// Within one run samples arrive with non-decreasing `(iteration, repeat)`.
/// `on_learning_stopped` is called once when the run ends.
pub trait ResultConsumer {
    fn consume(&mut self, sample: &Sample<'_>) -> Result<()>;

    fn on_learning_stopped(&mut self) -> Result<()>;
}

/// Rejects `(iteration, repeat)` pairs that go backwards.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct OrderGuard {
    last: Option<(u64, u32)>,
}

impl OrderGuard {
    pub(crate) fn check(&mut self, iteration: u64, repeat: u32) -> Result<()> {
        if let Some((last_iteration, last_repeat)) = self.last {
            if (iteration, repeat) < (last_iteration, last_repeat) {
                return Err(NnError::OutOfOrderConsumption {
                    iteration,
                    repeat,
                    last_iteration,
                    last_repeat,
                });
            }
        }
        self.last = Some((iteration, repeat));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_and_increasing_pairs_pass() {
        let mut guard = OrderGuard::default();
        guard.check(0, 0).unwrap();
        guard.check(0, 0).unwrap();
        guard.check(0, 3).unwrap();
        guard.check(1, 0).unwrap();
    }

    #[test]
    fn earlier_repeat_of_same_iteration_fails() {
        let mut guard = OrderGuard::default();
        guard.check(4, 2).unwrap();
        assert!(matches!(
            guard.check(4, 1),
            Err(NnError::OutOfOrderConsumption { iteration: 4, repeat: 1, last_iteration: 4, last_repeat: 2 })
        ));
    }
}
