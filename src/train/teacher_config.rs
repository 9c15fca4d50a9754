use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{NnError, Result};

/// Run parameters of an [`OnlineTeacher`](crate::train::OnlineTeacher).
///
/// - `repeats`    how many consecutive teaching steps each example gets
/// - `iterations` upper bound on the number of examples taught in one run
/// - `delay`      optional pause after every step, for pacing a visualisation
/// - `stop_flag`  shared flag; setting it to `true` from any thread ends the
///                run after the step in progress, or cuts the delay short.
///                The run it stops clears it. Raised while no run is active,
///                it stops the next run before any step is taught.
#[derive(Debug, Clone)]
pub struct TeacherConfig {
    pub repeats: u32,
    pub iterations: u64,
    pub delay: Option<Duration>,
    pub stop_flag: Arc<AtomicBool>,
}

impl Default for TeacherConfig {
    fn default() -> Self {
        TeacherConfig {
            repeats: 1,
            iterations: u64::MAX,
            delay: None,
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl TeacherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repeats(mut self, repeats: u32) -> Self {
        self.repeats = repeats;
        self
    }

    pub fn with_iterations(mut self, iterations: u64) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_stop_flag(mut self, stop_flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = stop_flag;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.repeats == 0 {
            return Err(NnError::Config("repeats must be at least 1".into()));
        }
        Ok(())
    }
}
