//! Training metrics and evaluation

use std::fmt;

/// Binary classification metrics over one pass of a split
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Metrics {
    /// Mean binary cross-entropy
    pub log_loss: f64,
    /// Predictions on the right side of 0.5
    pub correct: usize,
    pub total: usize,
}

impl Metrics {
    /// Compute from predicted probabilities and 0/1 labels
    pub fn from_predictions(probs: &[f32], labels: &[f32]) -> Self {
        let eps = 1e-7f64;
        let mut loss = 0.0;
        let mut correct = 0;

        for (p, y) in probs.iter().zip(labels) {
            let p = (*p as f64).clamp(eps, 1.0 - eps);
            let y = *y as f64;
            loss -= y * p.ln() + (1.0 - y) * (1.0 - p).ln();
            if (p >= 0.5) == (y >= 0.5) {
                correct += 1;
            }
        }

        let total = probs.len().min(labels.len());
        Metrics {
            log_loss: if total == 0 { 0.0 } else { loss / total as f64 },
            correct,
            total,
        }
    }

    /// Win prediction accuracy
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Loss: {:.4} | Acc: {:.2}% ({}/{})",
            self.log_loss,
            self.accuracy() * 100.0,
            self.correct,
            self.total
        )
    }
}

/// Training history for tracking progress
#[derive(Debug, Clone, Default)]
pub struct TrainingHistory {
    pub train_losses: Vec<f64>,
    pub val_losses: Vec<f64>,
    pub train_accuracies: Vec<f64>,
    pub val_accuracies: Vec<f64>,
    pub best_val_loss: f64,
    pub best_epoch: usize,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self {
            best_val_loss: f64::INFINITY,
            ..Default::default()
        }
    }

    /// Record metrics for an epoch
    ///
    /// Without a validation split the training loss drives model selection.
    pub fn record_epoch(&mut self, epoch: usize, train: &Metrics, val: &Metrics) {
        self.train_losses.push(train.log_loss);
        self.train_accuracies.push(train.accuracy());

        let monitored = if val.is_empty() { train } else { val };
        self.val_losses.push(monitored.log_loss);
        self.val_accuracies.push(monitored.accuracy());

        if monitored.log_loss < self.best_val_loss {
            self.best_val_loss = monitored.log_loss;
            self.best_epoch = epoch;
        }
    }

    /// Whether the best epoch was recorded in this call
    pub fn is_best_epoch(&self) -> bool {
        !self.val_losses.is_empty() && self.best_epoch == self.val_losses.len() - 1
    }

    /// Check if we should early stop
    pub fn should_early_stop(&self, patience: usize) -> bool {
        if patience == 0 || self.val_losses.len() < patience {
            return false;
        }
        let current_epoch = self.val_losses.len() - 1;
        current_epoch - self.best_epoch >= patience
    }

    pub fn epochs(&self) -> usize {
        self.train_losses.len()
    }
}
