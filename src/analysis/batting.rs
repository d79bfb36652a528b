//! Per-season batting statistics

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::MergedDelivery;

/// Batting record of one batter in one season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattingStats {
    pub year: i32,
    pub batter: String,
    pub runs_scored: u32,
    pub balls_faced: u32,
    pub boundaries: u32,
    pub dot_balls: u32,
    pub wickets: u32,
    pub sixes: u32,
    pub fours: u32,
    pub strike_rate: f64,
    pub boundary_percentage: f64,
    pub dot_ball_percentage: f64,
    pub six_percentage: f64,
    pub four_percentage: f64,
    /// Runs per dismissal, absent when never dismissed
    pub average: Option<f64>,
}

/// Running totals for one batter
#[derive(Debug, Clone, Copy, Default)]
pub struct BattingTally {
    pub runs: u32,
    pub balls: u32,
    pub boundaries: u32,
    pub dot_balls: u32,
    pub wickets: u32,
    pub sixes: u32,
    pub fours: u32,
}

impl BattingTally {
    pub fn add(&mut self, row: &MergedDelivery) {
        let d = &row.delivery;
        self.runs += d.batsman_runs as u32;
        self.balls += 1;
        self.boundaries += d.is_boundary() as u32;
        self.dot_balls += d.is_dot_ball() as u32;
        self.wickets += d.is_wicket as u32;
        self.sixes += d.is_six() as u32;
        self.fours += d.is_four() as u32;
    }

    /// Runs per 100 balls, None before the first ball
    pub fn strike_rate(&self) -> Option<f64> {
        per_hundred(self.runs, self.balls)
    }
}

fn per_hundred(count: u32, balls: u32) -> Option<f64> {
    if balls == 0 {
        None
    } else {
        Some(count as f64 / balls as f64 * 100.0)
    }
}

impl BattingStats {
    fn from_tally(year: i32, batter: String, t: BattingTally) -> Self {
        let pct = |count: u32| per_hundred(count, t.balls).unwrap_or(0.0);
        BattingStats {
            year,
            batter,
            runs_scored: t.runs,
            balls_faced: t.balls,
            boundaries: t.boundaries,
            dot_balls: t.dot_balls,
            wickets: t.wickets,
            sixes: t.sixes,
            fours: t.fours,
            strike_rate: pct(t.runs),
            boundary_percentage: pct(t.boundaries),
            dot_ball_percentage: pct(t.dot_balls),
            six_percentage: pct(t.sixes),
            four_percentage: pct(t.fours),
            average: if t.wickets > 0 {
                Some(t.runs as f64 / t.wickets as f64)
            } else {
                None
            },
        }
    }
}

/// Aggregate deliveries into per-(season, batter) statistics
///
/// Every delivery on strike counts as a ball faced. Deliveries without a
/// season or a batter are skipped. Rows come back ordered by year then batter.
pub fn calculate_batting_stats(rows: &[MergedDelivery]) -> Vec<BattingStats> {
    let mut tallies: BTreeMap<(i32, &str), BattingTally> = BTreeMap::new();

    for row in rows {
        let Some(year) = row.year else { continue };
        if row.delivery.batter.is_empty() {
            continue;
        }
        tallies
            .entry((year, row.delivery.batter.as_str()))
            .or_default()
            .add(row);
    }

    let stats: Vec<BattingStats> = tallies
        .into_iter()
        .map(|((year, batter), tally)| BattingStats::from_tally(year, batter.to_string(), tally))
        .collect();

    log::info!("Batting stats calculated for {} player-seasons", stats.len());
    stats
}

/// Tally each batter over a set of deliveries, ignoring season
pub fn tally_by_batter<'a, I>(rows: I) -> BTreeMap<String, BattingTally>
where
    I: IntoIterator<Item = &'a MergedDelivery>,
{
    let mut tallies: BTreeMap<String, BattingTally> = BTreeMap::new();
    for row in rows {
        if row.delivery.batter.is_empty() {
            continue;
        }
        match tallies.get_mut(&row.delivery.batter) {
            Some(t) => t.add(row),
            None => {
                let mut t = BattingTally::default();
                t.add(row);
                tallies.insert(row.delivery.batter.clone(), t);
            }
        }
    }
    tallies
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tests::sample_delivery;

    pub(crate) fn ball(year: Option<i32>, batter: &str, runs: u16, wicket: bool) -> MergedDelivery {
        let mut delivery = sample_delivery(1, "A", batter, runs);
        delivery.is_wicket = wicket;
        MergedDelivery {
            delivery,
            year,
            team1: Some("A".into()),
            team2: Some("B".into()),
        }
    }

    #[test]
    fn test_single_batter_season() {
        let rows = vec![
            ball(Some(2008), "Kohli", 4, false),
            ball(Some(2008), "Kohli", 0, false),
            ball(Some(2008), "Kohli", 6, false),
            ball(Some(2008), "Kohli", 1, true),
        ];
        let stats = calculate_batting_stats(&rows);
        assert_eq!(stats.len(), 1);

        let s = &stats[0];
        assert_eq!(s.runs_scored, 11);
        assert_eq!(s.balls_faced, 4);
        assert_eq!(s.boundaries, 2);
        assert_eq!(s.dot_balls, 1);
        assert_eq!(s.sixes, 1);
        assert_eq!(s.fours, 1);
        assert_eq!(s.wickets, 1);
        assert_eq!(s.strike_rate, 275.0);
        assert_eq!(s.boundary_percentage, 50.0);
        assert_eq!(s.dot_ball_percentage, 25.0);
        assert_eq!(s.six_percentage, 25.0);
        assert_eq!(s.four_percentage, 25.0);
        assert_eq!(s.average, Some(11.0));
    }

    #[test]
    fn test_grouping_and_order() {
        let rows = vec![
            ball(Some(2010), "Raina", 1, false),
            ball(Some(2008), "Raina", 2, false),
            ball(Some(2008), "Dhoni", 3, false),
            ball(None, "Dhoni", 6, false),
            ball(Some(2008), "", 4, false),
        ];
        let stats = calculate_batting_stats(&rows);
        let keys: Vec<(i32, &str)> = stats.iter().map(|s| (s.year, s.batter.as_str())).collect();
        assert_eq!(keys, vec![(2008, "Dhoni"), (2008, "Raina"), (2010, "Raina")]);

        // Never dismissed
        assert_eq!(stats[0].average, None);
        assert_eq!(stats[0].runs_scored, 3);
    }

    #[test]
    fn test_tally_by_batter() {
        let rows = vec![
            ball(Some(2008), "Gayle", 6, false),
            ball(Some(2015), "Gayle", 6, false),
            ball(Some(2015), "Dravid", 1, false),
        ];
        let tallies = tally_by_batter(&rows);
        assert_eq!(tallies["Gayle"].balls, 2);
        assert_eq!(tallies["Gayle"].strike_rate(), Some(600.0));
        assert_eq!(tallies["Dravid"].strike_rate(), Some(100.0));
    }
}
