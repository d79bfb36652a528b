//! Logistic win-probability model
//!
//! Architecture: Input(MatchFeatures::DIM) → Linear(1) → sigmoid

use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder};
use burn::tensor::activation::sigmoid;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::features::MatchFeatures;
use crate::{IplError, Result};

/// Configuration for the logistic model
#[derive(Debug, Clone, Copy)]
pub struct WinModelConfig {
    pub input_dim: usize,
}

impl Default for WinModelConfig {
    fn default() -> Self {
        WinModelConfig {
            input_dim: MatchFeatures::DIM,
        }
    }
}

/// Single linear layer scoring P(team1 wins)
#[derive(Module, Debug)]
pub struct WinModel<B: Backend> {
    linear: Linear<B>,
}

/// File the recorder writes for a model path (burn adds `.mpk`)
pub fn model_file(path: &str) -> PathBuf {
    Path::new(path).with_extension("mpk")
}

impl<B: Backend> WinModel<B> {
    pub fn new(device: &B::Device, config: WinModelConfig) -> Self {
        WinModel {
            linear: LinearConfig::new(config.input_dim, 1).init(device),
        }
    }

    /// Win logits [batch, 1]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        self.linear.forward(features)
    }

    /// Win probabilities [batch, 1]
    pub fn predict_proba(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        sigmoid(self.forward(features))
    }

    /// Save model to file
    pub fn save(&self, path: &str) -> Result<()>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        recorder
            .record(self.clone().into_record(), path.into())
            .map_err(|e| IplError::Model(e.to_string()))
    }

    /// Load model from file
    pub fn load(device: &B::Device, path: &str, config: WinModelConfig) -> Result<Self>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        if !model_file(path).exists() {
            return Err(IplError::NoModel);
        }
        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        let record = recorder
            .load(path.into(), device)
            .map_err(|e| IplError::Model(e.to_string()))?;

        Ok(Self::new(device, config).load_record(record))
    }
}
