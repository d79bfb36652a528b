//! Top performers by strike rate and boundary percentage

use serde::Serialize;

use super::batting::BattingStats;

/// Leaderboards over qualified player-seasons
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopPerformers {
    pub min_balls: u32,
    pub by_strike_rate: Vec<BattingStats>,
    pub by_boundary_percentage: Vec<BattingStats>,
}

/// Rank rows with at least `min_balls` balls faced, keeping the first `n`
///
/// Ties keep the earlier row.
pub fn top_by<F>(batting: &[BattingStats], min_balls: u32, n: usize, key: F) -> Vec<BattingStats>
where
    F: Fn(&BattingStats) -> f64,
{
    let mut qualified: Vec<&BattingStats> = batting
        .iter()
        .filter(|s| s.balls_faced >= min_balls)
        .collect();
    // sort_by is stable
    qualified.sort_by(|a, b| key(b).total_cmp(&key(a)));
    qualified.into_iter().take(n).cloned().collect()
}

pub fn top_performers(batting: &[BattingStats], min_balls: u32, n: usize) -> TopPerformers {
    let result = TopPerformers {
        min_balls,
        by_strike_rate: top_by(batting, min_balls, n, |s| s.strike_rate),
        by_boundary_percentage: top_by(batting, min_balls, n, |s| s.boundary_percentage),
    };
    log::debug!(
        "Top performers: {} by strike rate, {} by boundary %",
        result.by_strike_rate.len(),
        result.by_boundary_percentage.len()
    );
    result
}
