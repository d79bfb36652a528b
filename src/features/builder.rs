//! Chronological feature construction
//!
//! `FeatureBuilder` replays matches in date order. For each match it first
//! reads the current state into a `MatchFeatures` and only then folds the
//! result in, so a sample never sees its own outcome.

use std::collections::HashMap;

use super::elo::{EloConfig, EloRatings};
use super::match_repr::{flag, MatchFeatures};
use super::team_form::{HeadToHead, RollingStatistics, TeamResult};
use crate::data::database::InningsTotal;
use crate::{MatchInfo, ModelConfig, TossDecision};

/// A labelled training example
#[derive(Debug, Clone)]
pub struct MatchSample {
    pub match_id: i64,
    pub year: i32,
    pub features: MatchFeatures,
    /// 1.0 if team1 won
    pub label: f32,
}

/// Runs and deliveries for each side, keyed by match
type InningsByMatch = HashMap<i64, HashMap<String, (u32, u32)>>;

/// Incrementally maintained team state
pub struct FeatureBuilder {
    elo: EloRatings,
    form: RollingStatistics,
    head_to_head: HeadToHead,
    matches_played: HashMap<String, usize>,
    innings: InningsByMatch,
}

impl FeatureBuilder {
    pub fn new(config: &ModelConfig) -> Self {
        FeatureBuilder {
            elo: EloRatings::new(EloConfig {
                k_factor: config.elo_k_factor,
                ..EloConfig::default()
            }),
            form: RollingStatistics::new(config.form_window),
            head_to_head: HeadToHead::new(),
            matches_played: HashMap::new(),
            innings: HashMap::new(),
        }
    }

    /// Attach per-innings run totals used for net run rate
    pub fn with_innings(mut self, totals: &[InningsTotal]) -> Self {
        for total in totals {
            self.innings
                .entry(total.match_id)
                .or_default()
                .insert(
                    total.batting_team.clone(),
                    (total.runs.max(0) as u32, total.deliveries.max(0) as u32),
                );
        }
        self
    }

    /// Features for a fixture given the state so far
    ///
    /// `toss` is the toss winner and decision when known.
    pub fn features(&self, team1: &str, team2: &str, toss: Option<(&str, TossDecision)>) -> MatchFeatures {
        let form1 = self.form.get_stats(team1);
        let form2 = self.form.get_stats(team2);

        let team1_won_toss = toss.map(|(winner, _)| winner == team1);
        let team1_bats_first = toss.map(|(winner, decision)| {
            let winner_bats = decision == TossDecision::Bat;
            if winner == team1 {
                winner_bats
            } else {
                !winner_bats
            }
        });

        MatchFeatures {
            elo_diff: self.elo.rating_diff_normalized(team1, team2),
            team1_form: form1.win_ratio(),
            team2_form: form2.win_ratio(),
            head_to_head: self.head_to_head.win_ratio(team1, team2),
            team1_won_toss: flag(team1_won_toss),
            team1_bats_first: flag(team1_bats_first),
            team1_net_run_rate: form1.net_run_rate(),
            team2_net_run_rate: form2.net_run_rate(),
        }
    }

    /// Features for a recorded match
    pub fn match_features(&self, record: &MatchInfo) -> MatchFeatures {
        let toss = match (record.toss_winner.as_deref(), record.toss_decision) {
            (Some(winner), Some(decision)) if record.involves(winner) => Some((winner, decision)),
            _ => None,
        };
        self.features(&record.team1, &record.team2, toss)
    }

    fn team_result(&self, record: &MatchInfo, team: &str, opponent: &str) -> TeamResult {
        let sides = self.innings.get(&record.id);
        let side = |t: &str| sides.and_then(|s| s.get(t)).copied().unwrap_or((0, 0));
        let (runs_for, balls_for) = side(team);
        let (runs_against, balls_against) = side(opponent);
        TeamResult {
            won: record.winner.as_deref().map(|w| w == team),
            runs_for,
            balls_for,
            runs_against,
            balls_against,
        }
    }

    /// Fold a finished match into the state
    pub fn update(&mut self, record: &MatchInfo) {
        let team1 = record.team1.as_str();
        let team2 = record.team2.as_str();

        let result1 = self.team_result(record, team1, team2);
        let result2 = self.team_result(record, team2, team1);
        self.form.add_result(team1, result1);
        self.form.add_result(team2, result2);

        *self.matches_played.entry(team1.to_string()).or_default() += 1;
        *self.matches_played.entry(team2.to_string()).or_default() += 1;

        if let Some(team1_won) = record.team1_won() {
            let (winner, loser) = if team1_won { (team1, team2) } else { (team2, team1) };
            self.elo.update(winner, loser);
            self.head_to_head.record(winner, loser);
        }
    }

    /// Replay matches (sorted by date) producing one sample per decided match
    pub fn replay(&mut self, matches: &[MatchInfo]) -> Vec<MatchSample> {
        let mut samples = Vec::with_capacity(matches.len());
        for record in matches {
            if let Some(team1_won) = record.team1_won() {
                samples.push(MatchSample {
                    match_id: record.id,
                    year: record.year,
                    features: self.match_features(record),
                    label: if team1_won { 1.0 } else { 0.0 },
                });
            }
            self.update(record);
        }
        log::debug!(
            "Replayed {} matches into {} samples",
            matches.len(),
            samples.len()
        );
        samples
    }

    /// Matches recorded for a team, including no-results
    pub fn matches_played(&self, team: &str) -> usize {
        self.matches_played.get(team).copied().unwrap_or(0)
    }

    pub fn elo(&self) -> &EloRatings {
        &self.elo
    }
}
