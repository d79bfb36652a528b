//! Team form computation
//!
//! Rolling win ratio and run-rate statistics for teams based on match history.

use std::collections::{HashMap, VecDeque};

/// One side's view of a finished match
#[derive(Debug, Clone, PartialEq)]
pub struct TeamResult {
    /// None for a no-result
    pub won: Option<bool>,
    pub runs_for: u32,
    pub balls_for: u32,
    pub runs_against: u32,
    pub balls_against: u32,
}

/// Statistics over a set of matches for one team
#[derive(Debug, Clone, Default)]
pub struct TeamStatistics {
    pub matches_played: usize,
    pub wins: usize,
    pub losses: usize,
    pub no_results: usize,
    pub runs_for: u32,
    pub balls_for: u32,
    pub runs_against: u32,
    pub balls_against: u32,
}

impl TeamStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, result: &TeamResult) {
        self.matches_played += 1;
        self.runs_for += result.runs_for;
        self.balls_for += result.balls_for;
        self.runs_against += result.runs_against;
        self.balls_against += result.balls_against;

        match result.won {
            Some(true) => self.wins += 1,
            Some(false) => self.losses += 1,
            None => self.no_results += 1,
        }
    }

    /// Win ratio over decided matches (0.5 with none)
    pub fn win_ratio(&self) -> f32 {
        let decided = self.wins + self.losses;
        if decided == 0 {
            0.5
        } else {
            self.wins as f32 / decided as f32
        }
    }

    /// Runs per over scored minus runs per over conceded
    pub fn net_run_rate(&self) -> f32 {
        runs_per_over(self.runs_for, self.balls_for) - runs_per_over(self.runs_against, self.balls_against)
    }
}

fn runs_per_over(runs: u32, balls: u32) -> f32 {
    if balls == 0 {
        0.0
    } else {
        runs as f32 / balls as f32 * 6.0
    }
}

/// Rolling statistics with a limited window of recent matches
#[derive(Debug, Clone)]
pub struct RollingStatistics {
    window: usize,
    recent_matches: HashMap<String, VecDeque<TeamResult>>,
}

impl RollingStatistics {
    pub fn new(window: usize) -> Self {
        RollingStatistics {
            window: window.max(1),
            recent_matches: HashMap::new(),
        }
    }

    /// Add a match to a team's window, dropping the oldest when full
    pub fn add_result(&mut self, team: &str, result: TeamResult) {
        let recent = self.recent_matches.entry(team.to_string()).or_default();
        recent.push_back(result);
        if recent.len() > self.window {
            recent.pop_front();
        }
    }

    /// Statistics for a team over its window
    pub fn get_stats(&self, team: &str) -> TeamStatistics {
        let mut stats = TeamStatistics::new();
        if let Some(recent) = self.recent_matches.get(team) {
            for result in recent {
                stats.update(result);
            }
        }
        stats
    }

    /// Number of matches in the window for a team
    pub fn match_count(&self, team: &str) -> usize {
        self.recent_matches.get(team).map(|m| m.len()).unwrap_or(0)
    }
}

/// All-time head-to-head record between pairs of teams
#[derive(Debug, Clone, Default)]
pub struct HeadToHead {
    // (team, opponent) -> wins of team over opponent
    wins: HashMap<(String, String), usize>,
}

impl HeadToHead {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, winner: &str, loser: &str) {
        *self
            .wins
            .entry((winner.to_string(), loser.to_string()))
            .or_default() += 1;
    }

    fn wins(&self, team: &str, opponent: &str) -> usize {
        self.wins
            .get(&(team.to_string(), opponent.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Share of decided meetings `team` won (0.5 with no meetings)
    pub fn win_ratio(&self, team: &str, opponent: &str) -> f32 {
        let won = self.wins(team, opponent);
        let lost = self.wins(opponent, team);
        if won + lost == 0 {
            0.5
        } else {
            won as f32 / (won + lost) as f32
        }
    }
}
