//! Pre-match feature vector for a fixture
//!
//! Every value is taken from team1's perspective and uses only matches played
//! before the fixture.

/// Features describing a fixture before it is played
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchFeatures {
    /// Elo difference team1 - team2, scaled by 300 points
    pub elo_diff: f32,
    /// Team1 win ratio over its recent window
    pub team1_form: f32,
    /// Team2 win ratio over its recent window
    pub team2_form: f32,
    /// Team1 share of head-to-head wins (0.5 with no meetings)
    pub head_to_head: f32,
    /// 1.0 if team1 won the toss, 0.0 if team2 did, 0.5 if unknown
    pub team1_won_toss: f32,
    /// 1.0 if team1 bats first, 0.0 if it chases, 0.5 if unknown
    pub team1_bats_first: f32,
    /// Team1 net run rate over its recent window
    pub team1_net_run_rate: f32,
    /// Team2 net run rate over its recent window
    pub team2_net_run_rate: f32,
}

impl MatchFeatures {
    /// Dimension of feature vector
    pub const DIM: usize = 8;

    pub const NAMES: [&'static str; Self::DIM] = [
        "elo_diff",
        "team1_form",
        "team2_form",
        "head_to_head",
        "team1_won_toss",
        "team1_bats_first",
        "team1_net_run_rate",
        "team2_net_run_rate",
    ];

    pub fn to_vec(&self) -> Vec<f32> {
        vec![
            self.elo_diff,
            self.team1_form,
            self.team2_form,
            self.head_to_head,
            self.team1_won_toss,
            self.team1_bats_first,
            self.team1_net_run_rate,
            self.team2_net_run_rate,
        ]
    }

    pub fn from_vec(v: &[f32]) -> Option<Self> {
        if v.len() != Self::DIM {
            return None;
        }
        Some(MatchFeatures {
            elo_diff: v[0],
            team1_form: v[1],
            team2_form: v[2],
            head_to_head: v[3],
            team1_won_toss: v[4],
            team1_bats_first: v[5],
            team1_net_run_rate: v[6],
            team2_net_run_rate: v[7],
        })
    }
}

/// Encode an optional flag as 1.0 / 0.0, or 0.5 when unknown
pub fn flag(value: Option<bool>) -> f32 {
    match value {
        Some(true) => 1.0,
        Some(false) => 0.0,
        None => 0.5,
    }
}
