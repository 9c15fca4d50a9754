use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{info, trace};

use crate::error::{NnError, Result};
use crate::network::Network;
use crate::train::consumer::{ResultConsumer, Sample};
use crate::train::data_source::DataSource;
use crate::train::teacher_config::TeacherConfig;

/// Why a learning run returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The data source had no further example.
    SourceExhausted,
    /// `iterations` examples have been taught.
    IterationLimit,
    /// The stop flag was raised.
    Stopped,
    /// The step budget of `run_steps` was used up.
    StepBudget,
}

/// Longest uninterrupted sleep while waiting out the per-step delay.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Online (per-example) teacher: pulls examples from a [`DataSource`],
/// teaches each one `repeats` times and reports every step to the
/// registered [`ResultConsumer`]s.
///
/// Iteration and repeat counters persist across runs, so consecutive
/// `run_steps(1)` calls walk the same sequence a single `start_learning`
/// would. The stop flag is the only part meant to be touched from another
/// thread while a run is in progress. It is checked before every step and
/// while waiting out the delay; the run it stops clears it again. A stop
/// raised while no run is active ends the next run before its first step.
pub struct OnlineTeacher {
    network: Network,
    data_source: Option<Box<dyn DataSource + Send>>,
    consumers: Vec<Box<dyn ResultConsumer + Send>>,
    config: TeacherConfig,
    current_iteration: u64,
    current_repeat: u32,
}

impl OnlineTeacher {
    pub fn new(network: Network) -> Self {
        OnlineTeacher {
            network,
            data_source: None,
            consumers: Vec::new(),
            config: TeacherConfig::default(),
            current_iteration: 0,
            current_repeat: 0,
        }
    }

    pub fn with_config(network: Network, config: TeacherConfig) -> Result<Self> {
        config.validate()?;
        Ok(OnlineTeacher { config, ..OnlineTeacher::new(network) })
    }

    pub fn set_data_source<D>(&mut self, source: D)
    where
        D: DataSource + Send + 'static,
    {
        self.data_source = Some(Box::new(source));
    }

    pub fn add_result_consumer<C>(&mut self, consumer: C)
    where
        C: ResultConsumer + Send + 'static,
    {
        self.consumers.push(Box::new(consumer));
    }

    pub fn set_repeats(&mut self, repeats: u32) -> Result<()> {
        if repeats == 0 {
            return Err(NnError::Config("repeats must be at least 1".into()));
        }
        self.config.repeats = repeats;
        Ok(())
    }

    pub fn set_iterations(&mut self, iterations: u64) {
        self.config.iterations = iterations;
    }

    pub fn config(&self) -> &TeacherConfig {
        &self.config
    }

    /// Handle to the stop flag, for raising it from another thread.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.config.stop_flag)
    }

    pub fn stop(&self) {
        self.config.stop_flag.store(true, Ordering::Relaxed);
    }

    /// Teaches until the source runs dry, the iteration bound is reached or
    /// the stop flag is raised.
    pub fn start_learning(&mut self) -> Result<StopReason> {
        self.learn(None)
    }

    /// Performs at most `steps` teaching steps. `run_steps(0)` teaches nothing
    /// but still notifies the consumers that learning stopped.
    pub fn run_steps(&mut self, steps: u64) -> Result<StopReason> {
        self.learn(Some(steps))
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    pub fn into_network(self) -> Network {
        self.network
    }

    pub fn current_iteration(&self) -> u64 {
        self.current_iteration
    }

    pub fn current_repeat(&self) -> u32 {
        self.current_repeat
    }

    fn learn(&mut self, steps: Option<u64>) -> Result<StopReason> {
        info!(
            "learning started at iteration {}, repeat {} (repeats {}, step budget {:?})",
            self.current_iteration, self.current_repeat, self.config.repeats, steps
        );
        let reason = self.learning_loop(steps)?;
        if reason == StopReason::Stopped {
            self.config.stop_flag.store(false, Ordering::Relaxed);
        }
        for consumer in &mut self.consumers {
            consumer.on_learning_stopped()?;
        }
        info!(
            "learning stopped ({:?}) at iteration {}, repeat {}",
            reason, self.current_iteration, self.current_repeat
        );
        Ok(reason)
    }

    fn learning_loop(&mut self, steps: Option<u64>) -> Result<StopReason> {
        let source = self
            .data_source
            .as_mut()
            .ok_or_else(|| NnError::UninitializedState("data source is not set".into()))?;
        let mut remaining = steps;
        if remaining == Some(0) {
            return Ok(StopReason::StepBudget);
        }

        while self.current_iteration < self.config.iterations {
            if self.config.stop_flag.load(Ordering::Relaxed) {
                return Ok(StopReason::Stopped);
            }
            if self.current_repeat == 0 && !source.prepare_next()? {
                return Ok(StopReason::SourceExhausted);
            }
            let iteration = self.current_iteration;
            let repeat = self.current_repeat;
            let input = source.input();
            let target = source.target().ok_or_else(|| {
                NnError::UninitializedState(format!("example {iteration} has no target"))
            })?;

            self.network.erase();
            let effect = self.network.teach(input, target)?;
            let error = self.network.error()?;
            trace!("step ({iteration}, {repeat}): error {error:.6}, effect {effect:.6}");

            let sample = Sample { iteration, repeat, error, effect, input, target };
            for consumer in &mut self.consumers {
                consumer.consume(&sample)?;
            }

            self.current_repeat += 1;
            if self.current_repeat >= self.config.repeats {
                self.current_repeat = 0;
                self.current_iteration += 1;
            }

            if let Some(left) = remaining.as_mut() {
                *left -= 1;
                if *left == 0 {
                    return Ok(StopReason::StepBudget);
                }
            }
            if let Some(delay) = self.config.delay {
                if pause(delay, &self.config.stop_flag) {
                    return Ok(StopReason::Stopped);
                }
            }
        }
        Ok(StopReason::IterationLimit)
    }
}

/// Sleeps for `delay` in short slices, returning `true` as soon as
/// `stop_flag` is raised.
fn pause(delay: Duration, stop_flag: &AtomicBool) -> bool {
    let deadline = Instant::now() + delay;
    loop {
        if stop_flag.load(Ordering::Relaxed) {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        thread::sleep((deadline - now).min(STOP_POLL_INTERVAL));
    }
}

impl std::fmt::Debug for OnlineTeacher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnlineTeacher")
            .field("network", &self.network)
            .field("has_data_source", &self.data_source.is_some())
            .field("consumers", &self.consumers.len())
            .field("config", &self.config)
            .field("current_iteration", &self.current_iteration)
            .field("current_repeat", &self.current_repeat)
            .finish()
    }
}
