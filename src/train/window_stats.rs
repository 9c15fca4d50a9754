use serde::{Serialize, Deserialize};

/// Means over one window of consumed samples, emitted by
/// [`AccumulatingConsumer`](crate::train::AccumulatingConsumer).
///
/// A window spans from the first to the last `(iteration, repeat)` pair it
/// contains, both inclusive. Records carry no reference back to the network
/// and can be sent to another thread freely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccumulatedResult {
    pub first_iteration: u64,
    pub first_repeat: u32,
    pub last_iteration: u64,
    pub last_repeat: u32,
    /// Number of samples in the window; equals the detalization except for
    /// the flushed partial window at the end of a run.
    pub samples: usize,
    pub mean_error: f64,
    pub mean_effect: f64,
}

/// Means of the samples a classifier routed into one bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketStats {
    pub samples: usize,
    /// `None` when no sample of the window fell into this bucket.
    pub mean_error: Option<f64>,
    pub mean_effect: Option<f64>,
}

/// Window record of [`BucketedAccumulator`](crate::train::BucketedAccumulator):
/// overall means plus one [`BucketStats`] per bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketedResult {
    pub first_iteration: u64,
    pub first_repeat: u32,
    pub last_iteration: u64,
    pub last_repeat: u32,
    pub samples: usize,
    pub mean_error: f64,
    pub mean_effect: f64,
    pub buckets: Vec<BucketStats>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bucket_serializes_as_null() {
        let record = BucketedResult {
            first_iteration: 0,
            first_repeat: 0,
            last_iteration: 1,
            last_repeat: 0,
            samples: 2,
            mean_error: 0.25,
            mean_effect: 0.5,
            buckets: vec![
                BucketStats { samples: 2, mean_error: Some(0.25), mean_effect: Some(0.5) },
                BucketStats { samples: 0, mean_error: None, mean_effect: None },
            ],
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains(r#"{"samples":0,"mean_error":null,"mean_effect":null}"#));
        let back: BucketedResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
