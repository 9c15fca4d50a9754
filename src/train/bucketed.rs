use log::debug;

use crate::error::{NnError, Result};
use crate::train::accumulator::{check_detalization, WindowSpan};
use crate::train::consumer::{OrderGuard, ResultConsumer, Sample};
use crate::train::window_stats::{BucketStats, BucketedResult};

type Classifier = Box<dyn FnMut(&[f64], &[f64]) -> usize + Send>;

/// Index of the largest target component, for one-hot classification data.
/// Ties resolve to the first index; an empty target maps to bucket 0.
pub fn active_class(_input: &[f64], target: &[f64]) -> usize {
    target
        .iter()
        .enumerate()
        .max_by(|(ia, a), (ib, b)| {
            a.partial_cmp(b)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(ib.cmp(ia))
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Window accumulator that also splits every window by a classifier.
///
/// Each sample is routed to bucket `classifier(input, target)`; the emitted
/// record holds the overall means plus per-bucket means and sample counts.
/// Windowing, ordering and the final flush behave as in
/// [`AccumulatingConsumer`](crate::train::AccumulatingConsumer).
pub struct BucketedAccumulator {
    detalization: usize,
    guard: OrderGuard,
    span: WindowSpan,
    classifier: Classifier,
    error_sums: Vec<f64>,
    effect_sums: Vec<f64>,
    counts: Vec<usize>,
    sink: Box<dyn FnMut(BucketedResult) + Send>,
}

impl BucketedAccumulator {
    pub fn new<C, F>(detalization: usize, buckets: usize, classifier: C, sink: F) -> Result<Self>
    where
        C: FnMut(&[f64], &[f64]) -> usize + Send + 'static,
        F: FnMut(BucketedResult) + Send + 'static,
    {
        check_detalization(detalization)?;
        if buckets == 0 {
            return Err(NnError::Config("at least one bucket is required".into()));
        }
        Ok(BucketedAccumulator {
            detalization,
            guard: OrderGuard::default(),
            span: WindowSpan::default(),
            classifier: Box::new(classifier),
            error_sums: vec![0.0; buckets],
            effect_sums: vec![0.0; buckets],
            counts: vec![0; buckets],
            sink: Box::new(sink),
        })
    }

    pub fn buckets(&self) -> usize {
        self.counts.len()
    }

    pub fn pending(&self) -> usize {
        self.span.samples
    }

    fn emit(&mut self) {
        let n = self.span.samples as f64;
        let buckets = self
            .counts
            .iter()
            .zip(self.error_sums.iter().zip(&self.effect_sums))
            .map(|(&samples, (&error, &effect))| {
                let mean = |sum: f64| (samples > 0).then(|| sum / samples as f64);
                BucketStats { samples, mean_error: mean(error), mean_effect: mean(effect) }
            })
            .collect();
        let record = BucketedResult {
            first_iteration: self.span.first.0,
            first_repeat: self.span.first.1,
            last_iteration: self.span.last.0,
            last_repeat: self.span.last.1,
            samples: self.span.samples,
            mean_error: self.error_sums.iter().sum::<f64>() / n,
            mean_effect: self.effect_sums.iter().sum::<f64>() / n,
            buckets,
        };
        debug!(
            "bucketed window ({}, {})..({}, {}): {} samples, counts {:?}",
            record.first_iteration,
            record.first_repeat,
            record.last_iteration,
            record.last_repeat,
            record.samples,
            self.counts
        );
        (self.sink)(record);
        self.span = WindowSpan::default();
        self.error_sums.iter_mut().for_each(|s| *s = 0.0);
        self.effect_sums.iter_mut().for_each(|s| *s = 0.0);
        self.counts.iter_mut().for_each(|c| *c = 0);
    }
}

impl ResultConsumer for BucketedAccumulator {
    fn consume(&mut self, sample: &Sample<'_>) -> Result<()> {
        let bucket = (self.classifier)(sample.input, sample.target);
        if bucket >= self.counts.len() {
            return Err(NnError::BucketOutOfRange { bucket, buckets: self.counts.len() });
        }
        self.guard.check(sample.iteration, sample.repeat)?;
        self.span.push(sample.iteration, sample.repeat);
        self.error_sums[bucket] += sample.error;
        self.effect_sums[bucket] += sample.effect;
        self.counts[bucket] += 1;
        if self.span.samples == self.detalization {
            self.emit();
        }
        Ok(())
    }

    fn on_learning_stopped(&mut self) -> Result<()> {
        if self.span.samples > 0 {
            self.emit();
        }
        Ok(())
    }
}

impl std::fmt::Debug for BucketedAccumulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BucketedAccumulator")
            .field("detalization", &self.detalization)
            .field("buckets", &self.counts.len())
            .field("pending", &self.span.samples)
            .finish()
    }
}
