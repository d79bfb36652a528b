//! Model inference for predictions

use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Tensor};

use crate::data::Database;
use crate::features::{FeatureBuilder, MatchFeatures};
use crate::model::{FeatureNormalization, ModelMetadata, WinModel, WinModelConfig};
use crate::{Config, ConfidenceLevel, IplError, ModelConfig, Prediction, Result, TossDecision};

/// Matches a team needs for its history to count as full
pub const FULL_HISTORY: usize = 10;

/// Predictor for making match predictions
pub struct Predictor<B: Backend> {
    model: WinModel<B>,
    normalization: FeatureNormalization,
    db: Database,
    builder: FeatureBuilder,
    device: B::Device,
    min_history: usize,
}

impl<B: Backend> Predictor<B>
where
    B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
    B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
{
    /// Create a predictor, replaying every stored match to bring team state
    /// up to date
    pub fn new(
        model: WinModel<B>,
        normalization: FeatureNormalization,
        db: Database,
        config: &ModelConfig,
        device: B::Device,
    ) -> Result<Self> {
        let matches = db.get_matches()?;
        let innings = db.get_innings_totals()?;
        let mut builder = FeatureBuilder::new(config).with_innings(&innings);
        for record in &matches {
            builder.update(record);
        }
        log::debug!("Predictor state built from {} matches", matches.len());

        Ok(Predictor {
            model,
            normalization,
            db,
            builder,
            device,
            min_history: config.min_history,
        })
    }

    /// Load predictor from the saved model and its metadata
    pub fn load(db: Database, config: &Config, device: B::Device) -> Result<Self> {
        let model = WinModel::load(&device, &config.data.model_path, WinModelConfig::default())?;
        let metadata = ModelMetadata::load(&config.data.model_path)?;
        Self::new(model, metadata.normalization, db, &config.model, device)
    }

    fn resolve_team(&self, name: &str) -> Result<String> {
        self.db
            .find_team(name)?
            .ok_or_else(|| IplError::UnknownTeam(name.to_string()))
    }

    /// Predict a fixture, optionally with the toss result
    pub fn predict(
        &self,
        team1: &str,
        team2: &str,
        toss_winner: Option<&str>,
        toss_decision: Option<TossDecision>,
    ) -> Result<Prediction> {
        let team1 = self.resolve_team(team1)?;
        let team2 = self.resolve_team(team2)?;
        if team1 == team2 {
            return Err(IplError::Parse(format!("{} cannot play itself", team1)));
        }

        let toss_winner = match toss_winner {
            Some(name) => {
                let resolved = self.resolve_team(name)?;
                if resolved != team1 && resolved != team2 {
                    return Err(IplError::Parse(format!(
                        "Toss winner {} is not playing in {} vs {}",
                        resolved, team1, team2
                    )));
                }
                Some(resolved)
            }
            None if toss_decision.is_some() => {
                return Err(IplError::Parse(
                    "a toss decision needs the toss winner".to_string(),
                ));
            }
            None => None,
        };

        for team in [&team1, &team2] {
            let played = self.builder.matches_played(team);
            if played < self.min_history {
                return Err(IplError::InsufficientHistory {
                    team: team.clone(),
                    matches: played,
                    required: self.min_history,
                });
            }
        }

        let toss = match (toss_winner.as_deref(), toss_decision) {
            (Some(winner), Some(decision)) => Some((winner, decision)),
            (Some(winner), None) => {
                log::warn!("Toss decision unknown for {}, batting order ignored", winner);
                None
            }
            _ => None,
        };
        let mut features = self.builder.features(&team1, &team2, toss);
        if toss.is_none() {
            if let Some(winner) = toss_winner.as_deref() {
                features.team1_won_toss = if winner == team1 { 1.0 } else { 0.0 };
            }
        }

        let team1_win_prob = self.win_probability(&features);
        let confidence = confidence_level(
            self.builder.matches_played(&team1),
            self.builder.matches_played(&team2),
        );

        Ok(Prediction {
            team1,
            team2,
            team1_win_prob,
            confidence,
        })
    }

    /// P(team1 wins) for a feature vector
    pub fn win_probability(&self, features: &MatchFeatures) -> f32 {
        let row = self.normalization.normalize_row(&features.to_vec());
        let x = Tensor::<B, 1>::from_floats(row.as_slice(), &self.device).reshape([1, MatchFeatures::DIM]);
        self.model.predict_proba(x).into_scalar().elem()
    }
}

/// High when both teams have a full history, Medium when one does
pub fn confidence_level(team1_matches: usize, team2_matches: usize) -> ConfidenceLevel {
    let full1 = team1_matches >= FULL_HISTORY;
    let full2 = team2_matches >= FULL_HISTORY;
    match (full1, full2) {
        (true, true) => ConfidenceLevel::High,
        (true, false) | (false, true) => ConfidenceLevel::Medium,
        (false, false) => ConfidenceLevel::Low,
    }
}

/// Format a prediction for display
pub fn format_prediction(pred: &Prediction) -> String {
    format!(
        r#"
┌─────────────────────────────────────────────────┐
│  {} vs {}
├─────────────────────────────────────────────────┤
│  {} win probability: {:.1}%
│  Predicted winner:   {} ({:.1}%)
│  Confidence:         {}
└─────────────────────────────────────────────────┘
"#,
        pred.team1,
        pred.team2,
        pred.team1,
        pred.team1_win_prob * 100.0,
        pred.predicted_winner(),
        pred.winner_prob() * 100.0,
        pred.confidence
    )
}
