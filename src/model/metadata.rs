//! Model sidecar: feature normalization and training summary
//!
//! Stored as JSON next to the model weights (`<model_path>.json`).

use std::path::{Path, PathBuf};

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use crate::features::MatchFeatures;
use crate::{IplError, Result};

/// Z-score parameters computed from the training split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureNormalization {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

impl FeatureNormalization {
    /// Identity normalization
    pub fn identity(dim: usize) -> Self {
        FeatureNormalization {
            mean: vec![0.0; dim],
            std: vec![1.0; dim],
        }
    }

    /// Compute per-column mean and std (floored at 0.001)
    pub fn from_rows(rows: &[Vec<f32>], dim: usize) -> Self {
        if rows.is_empty() {
            return Self::identity(dim);
        }

        let mut sum = vec![0.0f32; dim];
        let mut sum_sq = vec![0.0f32; dim];
        for row in rows {
            for (j, v) in row.iter().take(dim).enumerate() {
                sum[j] += v;
                sum_sq[j] += v * v;
            }
        }

        let n = rows.len() as f32;
        let mean: Vec<f32> = sum.iter().map(|s| s / n).collect();
        let std: Vec<f32> = sum_sq
            .iter()
            .zip(mean.iter())
            .map(|(sq, m)| (sq / n - m * m).max(0.0).sqrt().max(0.001))
            .collect();

        FeatureNormalization { mean, std }
    }

    pub fn normalize_row(&self, row: &[f32]) -> Vec<f32> {
        row.iter()
            .zip(self.mean.iter().zip(self.std.iter()))
            .map(|(v, (m, s))| (v - m) / s)
            .collect()
    }

    /// Normalize a feature tensor using z-score: (x - mean) / std
    pub fn normalize<B: Backend>(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = features.device();
        let mean = Tensor::<B, 1>::from_floats(self.mean.as_slice(), &device).unsqueeze_dim(0);
        let std = Tensor::<B, 1>::from_floats(self.std.as_slice(), &device).unsqueeze_dim(0);
        (features - mean) / std
    }
}

/// Everything a predictor needs besides the weights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub feature_names: Vec<String>,
    pub normalization: FeatureNormalization,
    pub trained_at: String,
    pub epochs_run: usize,
    pub best_epoch: usize,
    pub learning_rate: f64,
    pub validation_from: i32,
    pub train_samples: usize,
    pub val_samples: usize,
    pub train_accuracy: f64,
    pub val_accuracy: Option<f64>,
    pub val_log_loss: Option<f64>,
}

impl ModelMetadata {
    pub fn path_for(model_path: &str) -> PathBuf {
        Path::new(model_path).with_extension("json")
    }

    pub fn save(&self, model_path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| IplError::Model(format!("Failed to serialize metadata: {}", e)))?;
        std::fs::write(Self::path_for(model_path), json)?;
        Ok(())
    }

    pub fn load(model_path: &str) -> Result<Self> {
        let path = Self::path_for(model_path);
        if !path.exists() {
            return Err(IplError::NoModel);
        }
        let content = std::fs::read_to_string(&path)?;
        let metadata: ModelMetadata = serde_json::from_str(&content)
            .map_err(|e| IplError::Model(format!("Invalid metadata {}: {}", path.display(), e)))?;

        if metadata.normalization.mean.len() != MatchFeatures::DIM
            || metadata.normalization.std.len() != MatchFeatures::DIM
        {
            return Err(IplError::Model(format!(
                "Metadata has {} features, expected {}",
                metadata.normalization.mean.len(),
                MatchFeatures::DIM
            )));
        }
        Ok(metadata)
    }
}
