//! Feature extraction
//!
//! Converts match history into pre-match features for the outcome model.

pub mod builder;
pub mod elo;
pub mod match_repr;
pub mod team_form;

pub use builder::{FeatureBuilder, MatchSample};
pub use elo::EloRatings;
pub use match_repr::MatchFeatures;
pub use team_form::{HeadToHead, RollingStatistics, TeamStatistics};
