//! Model training
//!
//! Time-split dataset construction, training loop and metrics tracking.

pub mod metrics;
pub mod trainer;

pub use metrics::{Metrics, TrainingHistory};
pub use trainer::{train_from_database, TimeSplit, TrainBackend, Trainer, TrainingReport};
