//! Match outcome model
//!
//! A logistic model over pre-match features, stored as burn MessagePack
//! weights plus a JSON metadata sidecar.

pub mod logistic;
pub mod metadata;

pub use logistic::{WinModel, WinModelConfig};
pub use metadata::{FeatureNormalization, ModelMetadata};
