use std::sync::mpsc::Sender;

use log::debug;

use crate::error::{NnError, Result};
use crate::train::consumer::{OrderGuard, ResultConsumer, Sample};
use crate::train::window_stats::AccumulatedResult;

/// First and last `(iteration, repeat)` of the window being filled.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct WindowSpan {
    pub(crate) first: (u64, u32),
    pub(crate) last: (u64, u32),
    pub(crate) samples: usize,
}

impl WindowSpan {
    pub(crate) fn push(&mut self, iteration: u64, repeat: u32) {
        if self.samples == 0 {
            self.first = (iteration, repeat);
        }
        self.last = (iteration, repeat);
        self.samples += 1;
    }
}

pub(crate) fn check_detalization(detalization: usize) -> Result<()> {
    if detalization == 0 {
        return Err(NnError::Config("detalization must be at least 1".into()));
    }
    Ok(())
}

/// Groups consumed samples into windows of `detalization` samples and hands
/// the mean error and mean effect of every full window to a sink.
///
/// When learning stops, a partially filled window is flushed with the means
/// of the samples it holds; an empty one emits nothing. Samples must arrive
/// in non-decreasing `(iteration, repeat)` order.
pub struct AccumulatingConsumer {
    detalization: usize,
    guard: OrderGuard,
    span: WindowSpan,
    error_sum: f64,
    effect_sum: f64,
    sink: Box<dyn FnMut(AccumulatedResult) + Send>,
}

impl AccumulatingConsumer {
    pub fn new<F>(detalization: usize, sink: F) -> Result<Self>
    where
        F: FnMut(AccumulatedResult) + Send + 'static,
    {
        check_detalization(detalization)?;
        Ok(AccumulatingConsumer {
            detalization,
            guard: OrderGuard::default(),
            span: WindowSpan::default(),
            error_sum: 0.0,
            effect_sum: 0.0,
            sink: Box::new(sink),
        })
    }

    /// Sends every window record down `tx`. Records for a dropped receiver
    /// are discarded.
    pub fn with_channel(detalization: usize, tx: Sender<AccumulatedResult>) -> Result<Self> {
        AccumulatingConsumer::new(detalization, move |record| {
            if tx.send(record).is_err() {
                debug!("accumulated result receiver is gone, record dropped");
            }
        })
    }

    pub fn detalization(&self) -> usize {
        self.detalization
    }

    /// Number of samples in the window being filled.
    pub fn pending(&self) -> usize {
        self.span.samples
    }

    /// Record for the current partial window, without emitting or resetting it.
    pub fn peek(&self) -> Result<AccumulatedResult> {
        if self.span.samples == 0 {
            return Err(NnError::UninitializedState("accumulator window is empty".into()));
        }
        let n = self.span.samples as f64;
        Ok(AccumulatedResult {
            first_iteration: self.span.first.0,
            first_repeat: self.span.first.1,
            last_iteration: self.span.last.0,
            last_repeat: self.span.last.1,
            samples: self.span.samples,
            mean_error: self.error_sum / n,
            mean_effect: self.effect_sum / n,
        })
    }

    fn emit(&mut self) -> Result<()> {
        let record = self.peek()?;
        debug!(
            "window ({}, {})..({}, {}): error {:.6}, effect {:.6}",
            record.first_iteration,
            record.first_repeat,
            record.last_iteration,
            record.last_repeat,
            record.mean_error,
            record.mean_effect
        );
        (self.sink)(record);
        self.span = WindowSpan::default();
        self.error_sum = 0.0;
        self.effect_sum = 0.0;
        Ok(())
    }
}

impl ResultConsumer for AccumulatingConsumer {
    fn consume(&mut self, sample: &Sample<'_>) -> Result<()> {
        self.guard.check(sample.iteration, sample.repeat)?;
        self.span.push(sample.iteration, sample.repeat);
        self.error_sum += sample.error;
        self.effect_sum += sample.effect;
        if self.span.samples == self.detalization {
            self.emit()?;
        }
        Ok(())
    }

    fn on_learning_stopped(&mut self) -> Result<()> {
        if self.span.samples > 0 {
            self.emit()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for AccumulatingConsumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccumulatingConsumer")
            .field("detalization", &self.detalization)
            .field("pending", &self.span.samples)
            .finish()
    }
}
