//! Full-batch SGD trainer for the logistic win model

use burn::backend::{Autodiff, NdArray};
use burn::module::AutodiffModule;
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{GradientsParams, Optimizer, Sgd, SgdConfig};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::{ElementConversion, Tensor};

use crate::data::Database;
use crate::features::{FeatureBuilder, MatchFeatures, MatchSample};
use crate::model::{FeatureNormalization, ModelMetadata, WinModel, WinModelConfig};
use crate::training::metrics::{Metrics, TrainingHistory};
use crate::{Config, IplError, Result};

/// Backend used by the CLI for training
pub type TrainBackend = Autodiff<NdArray<f32>>;

/// Samples split by season
#[derive(Debug, Clone, Default)]
pub struct TimeSplit {
    pub train: Vec<MatchSample>,
    pub val: Vec<MatchSample>,
}

impl TimeSplit {
    /// Seasons before `validation_from` train, the rest validate
    pub fn new(samples: Vec<MatchSample>, validation_from: i32) -> Self {
        let (train, val) = samples.into_iter().partition(|s| s.year < validation_from);
        TimeSplit { train, val }
    }
}

/// Stack sample features into a [n, DIM] tensor and labels into [n, 1]
pub fn to_tensors<B: Backend>(
    samples: &[MatchSample],
    norm: &FeatureNormalization,
    device: &B::Device,
) -> (Tensor<B, 2>, Tensor<B, 2>) {
    let n = samples.len();
    let features: Vec<f32> = samples
        .iter()
        .flat_map(|s| norm.normalize_row(&s.features.to_vec()))
        .collect();
    let labels: Vec<f32> = samples.iter().map(|s| s.label).collect();

    let x = Tensor::<B, 1>::from_floats(features.as_slice(), device).reshape([n, MatchFeatures::DIM]);
    let y = Tensor::<B, 1>::from_floats(labels.as_slice(), device).reshape([n, 1]);
    (x, y)
}

/// Result of a training run
#[derive(Debug)]
pub struct TrainOutcome<B: AutodiffBackend> {
    /// Weights from the best monitored epoch
    pub model: WinModel<B>,
    pub normalization: FeatureNormalization,
    pub history: TrainingHistory,
    pub train_metrics: Metrics,
    pub val_metrics: Metrics,
}

/// Trainer for the single-layer logistic model
pub struct Trainer<B: AutodiffBackend> {
    model: WinModel<B>,
    optimizer: OptimizerAdaptor<Sgd<B::InnerBackend>, WinModel<B>, B>,
    learning_rate: f64,
    device: B::Device,
}

impl<B: AutodiffBackend> Trainer<B> {
    pub fn new(device: B::Device, learning_rate: f64) -> Self {
        Trainer {
            model: WinModel::new(&device, WinModelConfig::default()),
            optimizer: SgdConfig::new().init(),
            learning_rate,
            device,
        }
    }

    /// Train on the split, stopping once validation loss has not improved
    /// for `patience` epochs (0 disables early stopping)
    pub fn train(mut self, split: &TimeSplit, epochs: usize, patience: usize) -> Result<TrainOutcome<B>> {
        if split.train.is_empty() {
            return Err(IplError::InsufficientData(
                "no training samples before the validation season".to_string(),
            ));
        }
        if split.val.is_empty() {
            log::warn!("No validation samples, selecting on training loss");
        }

        let rows: Vec<Vec<f32>> = split.train.iter().map(|s| s.features.to_vec()).collect();
        let normalization = FeatureNormalization::from_rows(&rows, MatchFeatures::DIM);
        log::info!(
            "Feature normalization: mean={:?}, std={:?}",
            normalization.mean,
            normalization.std
        );

        let (x_train, y_train) = to_tensors::<B>(&split.train, &normalization, &self.device);
        let (x_train_eval, _) = to_tensors::<B::InnerBackend>(&split.train, &normalization, &self.device);
        let val_tensors = (!split.val.is_empty())
            .then(|| to_tensors::<B::InnerBackend>(&split.val, &normalization, &self.device));
        let train_labels: Vec<f32> = split.train.iter().map(|s| s.label).collect();
        let val_labels: Vec<f32> = split.val.iter().map(|s| s.label).collect();

        let mut history = TrainingHistory::new();
        let mut best_model = self.model.clone();

        log::info!(
            "Starting training for {} epochs ({} train, {} val samples)",
            epochs,
            split.train.len(),
            split.val.len()
        );

        for epoch in 0..epochs {
            let probs = self.model.predict_proba(x_train.clone());
            let loss = binary_cross_entropy(probs, y_train.clone());
            let loss_val: f32 = loss.clone().into_scalar().elem();

            let grads = loss.backward();
            let grads_params = GradientsParams::from_grads(grads, &self.model);
            self.model = self.optimizer.step(self.learning_rate, self.model, grads_params);

            // Metrics of the stepped model, the one kept if this epoch is best
            let model = self.model.valid();
            let train_probs = model.predict_proba(x_train_eval.clone());
            let train_metrics = Metrics::from_predictions(&to_vec(train_probs), &train_labels);
            let val_metrics = match &val_tensors {
                Some((x_val, _)) => {
                    let probs = model.predict_proba(x_val.clone());
                    Metrics::from_predictions(&to_vec(probs), &val_labels)
                }
                None => Metrics::default(),
            };

            history.record_epoch(epoch, &train_metrics, &val_metrics);
            if history.is_best_epoch() {
                best_model = self.model.clone();
            }

            if epoch % 10 == 0 || epoch + 1 == epochs {
                log::info!(
                    "Epoch {}/{}: loss={:.4}, train_acc={:.1}%, val_acc={:.1}%",
                    epoch + 1,
                    epochs,
                    loss_val,
                    train_metrics.accuracy() * 100.0,
                    val_metrics.accuracy() * 100.0
                );
            }

            if history.should_early_stop(patience) {
                log::info!(
                    "Early stopping at epoch {} (best epoch {})",
                    epoch + 1,
                    history.best_epoch + 1
                );
                break;
            }
        }

        let train_metrics = evaluate(&best_model.valid(), &split.train, &normalization, &self.device);
        let val_metrics = evaluate(&best_model.valid(), &split.val, &normalization, &self.device);

        Ok(TrainOutcome {
            model: best_model,
            normalization,
            history,
            train_metrics,
            val_metrics,
        })
    }
}

fn binary_cross_entropy<B: Backend>(probs: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
    let eps = 1e-7;
    let probs = probs.clamp(eps, 1.0 - eps);
    let loss = targets.clone().neg() * probs.clone().log() - (targets.neg() + 1.0) * (probs.neg() + 1.0).log();
    loss.mean()
}

fn to_vec<B: Backend>(tensor: Tensor<B, 2>) -> Vec<f32> {
    tensor.into_data().iter::<f32>().collect()
}

/// Metrics of a model over samples
pub fn evaluate<B: Backend>(
    model: &WinModel<B>,
    samples: &[MatchSample],
    norm: &FeatureNormalization,
    device: &B::Device,
) -> Metrics {
    if samples.is_empty() {
        return Metrics::default();
    }
    let (x, _) = to_tensors::<B>(samples, norm, device);
    let labels: Vec<f32> = samples.iter().map(|s| s.label).collect();
    Metrics::from_predictions(&to_vec(model.predict_proba(x)), &labels)
}

/// Summary of `train_from_database`
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub metadata: ModelMetadata,
    pub history: TrainingHistory,
    /// Elo ratings after the last stored match, strongest first
    pub elo_ratings: Vec<(String, f32)>,
}

/// Build samples from the database, train, and save model plus metadata
pub fn train_from_database(
    db: &Database,
    config: &Config,
    epochs: usize,
    learning_rate: f64,
) -> Result<TrainingReport> {
    let matches = db.get_matches()?;
    if matches.is_empty() {
        return Err(IplError::InsufficientData(
            "no matches in database, run `ipl data import` first".to_string(),
        ));
    }
    let innings = db.get_innings_totals()?;

    let mut builder = FeatureBuilder::new(&config.model).with_innings(&innings);
    let samples = builder.replay(&matches);
    let split = TimeSplit::new(samples, config.model.validation_from);
    log::info!(
        "Time split at {}: {} train, {} validation samples",
        config.model.validation_from,
        split.train.len(),
        split.val.len()
    );

    let device = Default::default();
    let trainer = Trainer::<TrainBackend>::new(device, learning_rate);
    let outcome = trainer.train(&split, epochs, config.model.early_stopping_patience)?;

    let model_path = &config.data.model_path;
    outcome.model.save(model_path)?;

    let metadata = ModelMetadata {
        feature_names: MatchFeatures::NAMES.iter().map(|s| s.to_string()).collect(),
        normalization: outcome.normalization,
        trained_at: chrono::Utc::now().to_rfc3339(),
        epochs_run: outcome.history.epochs(),
        best_epoch: outcome.history.best_epoch + 1,
        learning_rate,
        validation_from: config.model.validation_from,
        train_samples: split.train.len(),
        val_samples: split.val.len(),
        train_accuracy: outcome.train_metrics.accuracy(),
        val_accuracy: (!outcome.val_metrics.is_empty()).then(|| outcome.val_metrics.accuracy()),
        val_log_loss: (!outcome.val_metrics.is_empty()).then_some(outcome.val_metrics.log_loss),
    };
    metadata.save(model_path)?;
    log::info!("Saved model to {}", model_path);

    Ok(TrainingReport {
        metadata,
        history: outcome.history,
        elo_ratings: builder.elo().rankings(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(year: i32, elo_diff: f32, label: f32) -> MatchSample {
        MatchSample {
            match_id: 0,
            year,
            features: MatchFeatures {
                elo_diff,
                team1_form: 0.5,
                team2_form: 0.5,
                head_to_head: 0.5,
                team1_won_toss: 0.5,
                team1_bats_first: 0.5,
                team1_net_run_rate: 0.0,
                team2_net_run_rate: 0.0,
            },
            label,
        }
    }

    fn separable(years: &[i32]) -> Vec<MatchSample> {
        let mut samples = Vec::new();
        for (i, year) in years.iter().enumerate() {
            let x = 0.1 + (i % 5) as f32 * 0.1;
            samples.push(sample(*year, x, 1.0));
            samples.push(sample(*year, -x, 0.0));
        }
        samples
    }

    #[test]
    fn test_time_split() {
        let split = TimeSplit::new(separable(&[2020, 2021, 2022, 2023]), 2022);
        assert_eq!(split.train.len(), 4);
        assert_eq!(split.val.len(), 4);
        assert!(split.train.iter().all(|s| s.year < 2022));
    }

    #[test]
    fn test_training_reduces_loss() {
        let years: Vec<i32> = (0..20).map(|i| 2008 + i % 15).collect();
        let split = TimeSplit::new(separable(&years), 2020);

        let trainer = Trainer::<TrainBackend>::new(Default::default(), 0.5);
        let outcome = trainer.train(&split, 50, 0).unwrap();

        let first = outcome.history.train_losses[0];
        let last = *outcome.history.train_losses.last().unwrap();
        assert!(last < first);
        assert!(outcome.train_metrics.accuracy() > 0.9);
        assert!(outcome.val_metrics.accuracy() > 0.5);
    }

    #[test]
    fn test_best_model_matches_recorded_loss_without_validation() {
        let years: Vec<i32> = (0..10).map(|i| 2008 + i).collect();
        let split = TimeSplit::new(separable(&years), 2030);
        assert!(split.val.is_empty());

        let trainer = Trainer::<TrainBackend>::new(Default::default(), 1.0);
        let outcome = trainer.train(&split, 1, 0).unwrap();

        assert_eq!(outcome.history.best_epoch, 0);
        assert!((outcome.train_metrics.log_loss - outcome.history.best_val_loss).abs() < 1e-5);
        assert!(outcome.val_metrics.is_empty());
    }

    #[test]
    fn test_training_requires_samples() {
        let split = TimeSplit::new(separable(&[2023]), 2008);
        let trainer = Trainer::<TrainBackend>::new(Default::default(), 0.1);
        assert!(matches!(
            trainer.train(&split, 5, 0),
            Err(IplError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_train_from_database() {
        use crate::tests::sample_match;

        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data.model_path = dir.path().join("model").to_str().unwrap().to_string();
        config.model.validation_from = 2010;

        let mut db = Database::in_memory().unwrap();
        let mut matches = Vec::new();
        for i in 0..30 {
            let year = 2008 + (i / 10) as i32;
            let (t1, t2) = if i % 2 == 0 { ("A", "B") } else { ("B", "C") };
            let mut m = sample_match(i, year, t1, t2, Some(t1));
            m.date = chrono::NaiveDate::from_ymd_opt(year, 4, 1 + (i % 10) as u32).unwrap();
            matches.push(m);
        }
        db.import(&matches, &[]).unwrap();

        let report = train_from_database(&db, &config, 20, 0.1).unwrap();
        assert_eq!(report.metadata.train_samples, 20);
        assert_eq!(report.metadata.val_samples, 10);
        assert!(report.metadata.val_accuracy.is_some());
        // A won every match it played
        assert_eq!(report.elo_ratings[0].0, "A");

        let loaded = ModelMetadata::load(&config.data.model_path).unwrap();
        assert_eq!(loaded.feature_names.len(), MatchFeatures::DIM);
        assert!(crate::model::logistic::model_file(&config.data.model_path).exists());
    }
}
