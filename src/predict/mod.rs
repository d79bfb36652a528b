//! Match outcome prediction

pub mod inference;

pub use inference::{confidence_level, format_prediction, Predictor};
