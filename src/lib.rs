//! IPL batting evolution analysis
//!
//! Ball-by-ball statistics, era comparison and match outcome prediction for
//! the Indian Premier League.

pub mod analysis;
pub mod data;
pub mod features;
pub mod model;
pub mod predict;
pub mod server;
pub mod training;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Marker the cleaner writes into empty `extras_type` cells
pub const NO_EXTRAS: &str = "none";

/// Marker the cleaner writes into empty dismissal cells
pub const NOT_OUT: &str = "not_out";

/// What the toss winner chose to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TossDecision {
    Bat,
    Field,
}

impl TossDecision {
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "bat" | "batting" => Some(TossDecision::Bat),
            "field" | "fielding" | "bowl" => Some(TossDecision::Field),
            _ => None,
        }
    }
}

impl fmt::Display for TossDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TossDecision::Bat => write!(f, "bat"),
            TossDecision::Field => write!(f, "field"),
        }
    }
}

/// A single IPL match after cleaning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchInfo {
    pub id: i64,
    pub season: String,
    /// Season year derived from `season` (falls back to the match date)
    pub year: i32,
    pub city: Option<String>,
    pub date: NaiveDate,
    pub match_type: Option<String>,
    pub player_of_match: Option<String>,
    pub venue: Option<String>,
    pub team1: String,
    pub team2: String,
    pub toss_winner: Option<String>,
    pub toss_decision: Option<TossDecision>,
    /// None for no-result matches
    pub winner: Option<String>,
    pub result: Option<String>,
    pub result_margin: Option<f64>,
    pub target_runs: Option<f64>,
    pub target_overs: Option<f64>,
    pub super_over: Option<String>,
    pub method: Option<String>,
}

impl MatchInfo {
    /// Whether team1 won, None for a no-result
    pub fn team1_won(&self) -> Option<bool> {
        self.winner.as_deref().map(|w| w == self.team1)
    }

    /// Check if a team played in this match
    pub fn involves(&self, team: &str) -> bool {
        self.team1 == team || self.team2 == team
    }

    /// Did the given team bat first
    pub fn batted_first(&self, team: &str) -> Option<bool> {
        let toss_winner = self.toss_winner.as_deref()?;
        let decision = self.toss_decision?;
        let winner_bats = decision == TossDecision::Bat;
        if team == toss_winner {
            Some(winner_bats)
        } else if self.involves(team) {
            Some(!winner_bats)
        } else {
            None
        }
    }
}

/// A single delivery after cleaning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub match_id: i64,
    pub inning: u8,
    pub batting_team: String,
    pub bowling_team: String,
    pub over: u16,
    pub ball: u16,
    pub batter: String,
    pub bowler: String,
    pub non_striker: String,
    pub batsman_runs: u16,
    pub extra_runs: u16,
    pub total_runs: u16,
    pub extras_type: String,
    pub is_wicket: bool,
    pub player_dismissed: String,
    pub dismissal_kind: String,
    pub fielder: String,
}

impl Delivery {
    pub fn is_four(&self) -> bool {
        self.batsman_runs == 4
    }

    pub fn is_six(&self) -> bool {
        self.batsman_runs == 6
    }

    pub fn is_boundary(&self) -> bool {
        self.is_four() || self.is_six()
    }

    /// No runs off the bat and no extras conceded
    pub fn is_dot_ball(&self) -> bool {
        self.total_runs == 0 && self.extras_type == NO_EXTRAS
    }
}

/// A delivery joined with the match it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct MergedDelivery {
    pub delivery: Delivery,
    /// None when the match id is missing from the match list
    pub year: Option<i32>,
    pub team1: Option<String>,
    pub team2: Option<String>,
}

/// Model prediction output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub team1: String,
    pub team2: String,
    pub team1_win_prob: f32,
    pub confidence: ConfidenceLevel,
}

impl Prediction {
    /// Team with at least even odds
    pub fn predicted_winner(&self) -> &str {
        if self.team1_win_prob >= 0.5 {
            &self.team1
        } else {
            &self.team2
        }
    }

    /// Probability of the predicted winner
    pub fn winner_prob(&self) -> f32 {
        self.team1_win_prob.max(1.0 - self.team1_win_prob)
    }
}

/// Confidence level based on available match history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    High,   // Both teams have a full history
    Medium, // Only one team has a full history
    Low,
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceLevel::High => write!(f, "High"),
            ConfidenceLevel::Medium => write!(f, "Medium"),
            ConfidenceLevel::Low => write!(f, "Low"),
        }
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum IplError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Unknown team: {0}")]
    UnknownTeam(String),

    #[error("Model not trained - run `ipl train` first")]
    NoModel,

    #[error("Model error: {0}")]
    Model(String),

    #[error("Insufficient history for {team}: has {matches} matches, need {required}")]
    InsufficientHistory {
        team: String,
        matches: usize,
        required: usize,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, IplError>;

/// Inclusive range of seasons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Era {
    pub start: i32,
    pub end: i32,
}

impl Era {
    pub fn new(start: i32, end: i32) -> Self {
        Era { start, end }
    }

    pub fn contains(&self, year: i32) -> bool {
        year >= self.start && year <= self.end
    }

    pub fn name(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

impl std::str::FromStr for Era {
    type Err = String;

    /// Parses `2008-2013`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (a, b) = s
            .split_once('-')
            .ok_or_else(|| format!("Invalid era '{}', expected START-END", s))?;
        let start: i32 = a
            .trim()
            .parse()
            .map_err(|_| format!("Invalid era start '{}'", a))?;
        let end: i32 = b
            .trim()
            .parse()
            .map_err(|_| format!("Invalid era end '{}'", b))?;
        if start > end {
            return Err(format!("Era start {} is after end {}", start, end));
        }
        Ok(Era { start, end })
    }
}

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub analysis: AnalysisConfig,
    pub model: ModelConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub deliveries_path: String,
    pub matches_path: String,
    pub database_path: String,
    pub processed_dir: String,
    pub model_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub era1: Era,
    pub era2: Era,
    /// Minimum balls per batter per era for the t-test samples
    pub era_min_balls: u32,
    /// Minimum balls in a season for top performer lists
    pub top_min_balls: u32,
    pub top_n: usize,
    pub significance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub early_stopping_patience: usize,
    /// Number of recent matches in the rolling form window
    pub form_window: usize,
    pub elo_k_factor: f32,
    /// First season used for validation; earlier seasons train
    pub validation_from: i32,
    /// Matches each team needs before a fixture can be predicted
    pub min_history: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            deliveries_path: "data/raw/iiipl.csv".to_string(),
            matches_path: "data/raw/iiipl2.csv".to_string(),
            database_path: "data/ipl.db".to_string(),
            processed_dir: "data/processed".to_string(),
            model_path: "model/ipl_model".to_string(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            era1: Era::new(2008, 2013),
            era2: Era::new(2014, 2024),
            era_min_balls: 30,
            top_min_balls: 100,
            top_n: 10,
            significance: 0.05,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            epochs: 300,
            learning_rate: 0.1,
            early_stopping_patience: 30,
            form_window: 10,
            elo_k_factor: 32.0,
            validation_from: 2022,
            min_history: 3,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            IplError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| IplError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| IplError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Path of a file inside the processed output directory
    pub fn processed_file(&self, name: &str) -> std::path::PathBuf {
        std::path::Path::new(&self.data.processed_dir).join(name)
    }
}
