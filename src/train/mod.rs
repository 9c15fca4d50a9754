pub mod accumulator;
pub mod bucketed;
pub mod consumer;
pub mod data_source;
pub mod teacher;
pub mod teacher_config;
pub mod window_stats;

pub use accumulator::AccumulatingConsumer;
pub use bucketed::{active_class, BucketedAccumulator};
pub use consumer::{ResultConsumer, Sample};
pub use data_source::{DataSource, Example, VecDataSource};
pub use teacher::{OnlineTeacher, StopReason};
pub use teacher_config::TeacherConfig;
pub use window_stats::{AccumulatedResult, BucketStats, BucketedResult};
