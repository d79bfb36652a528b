//! Elo rating system for team strength estimation
//!
//! Ratings are keyed by franchise name and updated after every decided match.
//! IPL fixtures are not modelled with a home advantage.

use std::collections::HashMap;

/// Elo rating configuration
#[derive(Debug, Clone, Copy)]
pub struct EloConfig {
    /// K-factor: how much ratings change per match
    pub k_factor: f32,
    /// Starting rating for new teams
    pub initial_rating: f32,
}

impl Default for EloConfig {
    fn default() -> Self {
        EloConfig {
            k_factor: 32.0,
            initial_rating: 1500.0,
        }
    }
}

/// Elo rating computer
#[derive(Debug, Clone)]
pub struct EloRatings {
    ratings: HashMap<String, f32>,
    config: EloConfig,
}

impl Default for EloRatings {
    fn default() -> Self {
        Self::new(EloConfig::default())
    }
}

impl EloRatings {
    pub fn new(config: EloConfig) -> Self {
        EloRatings {
            ratings: HashMap::new(),
            config,
        }
    }

    /// Current rating for a team (initial rating if unseen)
    pub fn get_rating(&self, team: &str) -> f32 {
        self.ratings
            .get(team)
            .copied()
            .unwrap_or(self.config.initial_rating)
    }

    /// Expected score (0-1) of `team` against `opponent`
    pub fn expected_score(&self, team: &str, opponent: &str) -> f32 {
        let diff = self.get_rating(opponent) - self.get_rating(team);
        1.0 / (1.0 + 10.0_f32.powf(diff / 400.0))
    }

    /// Update both ratings after a result
    pub fn update(&mut self, winner: &str, loser: &str) {
        let expected = self.expected_score(winner, loser);
        let delta = self.config.k_factor * (1.0 - expected);

        let winner_new = self.get_rating(winner) + delta;
        let loser_new = self.get_rating(loser) - delta;

        self.ratings.insert(winner.to_string(), winner_new);
        self.ratings.insert(loser.to_string(), loser_new);
    }

    /// Rating difference scaled to roughly -1..1 (plus/minus 300 points)
    pub fn rating_diff_normalized(&self, team1: &str, team2: &str) -> f32 {
        (self.get_rating(team1) - self.get_rating(team2)) / 300.0
    }

    /// Teams ordered by rating, strongest first
    pub fn rankings(&self) -> Vec<(String, f32)> {
        let mut ranked: Vec<(String, f32)> =
            self.ratings.iter().map(|(t, r)| (t.clone(), *r)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_ratings() {
        let elo = EloRatings::default();
        assert_eq!(elo.get_rating("Chennai Super Kings"), 1500.0);
        assert_eq!(elo.expected_score("A", "B"), 0.5);
    }

    #[test]
    fn test_update_moves_ratings() {
        let mut elo = EloRatings::default();
        elo.update("A", "B");

        // Equal teams: winner gains K/2
        assert_eq!(elo.get_rating("A"), 1516.0);
        assert_eq!(elo.get_rating("B"), 1484.0);
    }

    #[test]
    fn test_upset_gains_more() {
        let mut elo = EloRatings::default();
        for _ in 0..5 {
            elo.update("A", "B");
        }
        let before = elo.get_rating("B");
        let favourite_win = {
            let mut e = elo.clone();
            e.update("A", "B");
            e.get_rating("A") - elo.get_rating("A")
        };
        elo.update("B", "A");
        let upset_gain = elo.get_rating("B") - before;

        assert!(upset_gain > favourite_win);
        assert!(elo.rating_diff_normalized("A", "B") > 0.0);
    }

    #[test]
    fn test_rankings() {
        let mut elo = EloRatings::default();
        elo.update("B", "A");
        elo.update("C", "A");
        let ranked = elo.rankings();
        assert_eq!(ranked.last().unwrap().0, "A");
        assert_eq!(ranked.len(), 3);
    }
}
