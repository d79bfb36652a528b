//! Comparison of batting between two eras

use serde::{Deserialize, Serialize};

use super::batting::tally_by_batter;
use super::stats::{mean, t_test_independent};
use super::trends::SeasonalTrend;
use crate::{Era, MergedDelivery};

/// Settings for an era comparison
#[derive(Debug, Clone, Copy)]
pub struct EraComparisonConfig {
    pub era1: Era,
    pub era2: Era,
    /// Batters need at least this many balls in an era to be sampled
    pub min_balls: u32,
    pub significance: f64,
}

impl Default for EraComparisonConfig {
    fn default() -> Self {
        EraComparisonConfig {
            era1: Era::new(2008, 2013),
            era2: Era::new(2014, 2024),
            min_balls: 30,
            significance: 0.05,
        }
    }
}

/// Statistical comparison of strike rates and boundary hitting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EraComparison {
    pub era1_name: String,
    pub era2_name: String,
    pub era1_avg_sr: Option<f64>,
    pub era2_avg_sr: Option<f64>,
    pub strike_rate_increase: Option<f64>,
    pub era1_boundary_pct: Option<f64>,
    pub era2_boundary_pct: Option<f64>,
    pub boundary_increase: Option<f64>,
    pub t_statistic: Option<f64>,
    pub p_value: Option<f64>,
    pub significant: bool,
    pub players_era1: usize,
    pub players_era2: usize,
}

/// Per-batter strike rates for qualified batters in one era
fn era_strike_rates(rows: &[&MergedDelivery], min_balls: u32) -> Vec<f64> {
    tally_by_batter(rows.iter().copied())
        .values()
        .filter(|t| t.balls >= min_balls)
        .filter_map(|t| t.strike_rate())
        .collect()
}

fn boundary_percentage(rows: &[&MergedDelivery]) -> Option<f64> {
    if rows.is_empty() {
        return None;
    }
    let boundaries = rows.iter().filter(|r| r.delivery.is_boundary()).count();
    Some(boundaries as f64 / rows.len() as f64 * 100.0)
}

fn difference(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some(b? - a?)
}

/// Compare two eras with a two-sample t-test on per-batter strike rates
pub fn compare_eras(rows: &[MergedDelivery], config: &EraComparisonConfig) -> EraComparison {
    log::info!(
        "Comparing eras: {} vs {}",
        config.era1.name(),
        config.era2.name()
    );

    let in_era = |era: Era| -> Vec<&MergedDelivery> {
        rows.iter()
            .filter(|r| r.year.is_some_and(|y| era.contains(y)))
            .collect()
    };
    let era1_rows = in_era(config.era1);
    let era2_rows = in_era(config.era2);

    let era1_sr = era_strike_rates(&era1_rows, config.min_balls);
    let era2_sr = era_strike_rates(&era2_rows, config.min_balls);

    let test = if era1_sr.len() > 1 && era2_sr.len() > 1 {
        t_test_independent(&era1_sr, &era2_sr)
    } else {
        None
    };
    if test.is_none() {
        log::warn!(
            "Not enough qualified batters for a t-test ({} vs {})",
            era1_sr.len(),
            era2_sr.len()
        );
    }

    let era1_avg_sr = mean(&era1_sr);
    let era2_avg_sr = mean(&era2_sr);
    let era1_boundary_pct = boundary_percentage(&era1_rows);
    let era2_boundary_pct = boundary_percentage(&era2_rows);
    let p_value = test.map(|t| t.p_value);

    EraComparison {
        era1_name: config.era1.name(),
        era2_name: config.era2.name(),
        era1_avg_sr,
        era2_avg_sr,
        strike_rate_increase: difference(era1_avg_sr, era2_avg_sr),
        era1_boundary_pct,
        era2_boundary_pct,
        boundary_increase: difference(era1_boundary_pct, era2_boundary_pct),
        t_statistic: test.map(|t| t.statistic),
        p_value,
        significant: p_value.is_some_and(|p| p < config.significance),
        players_era1: era1_sr.len(),
        players_era2: era2_sr.len(),
    }
}

/// Season-average view of one era, as served by the dashboard API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EraAverages {
    pub name: String,
    pub avg_strike_rate: f64,
    pub avg_boundary_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EraSummary {
    pub era1: EraAverages,
    pub era2: EraAverages,
}

/// Average the seasonal trends inside each era (0 for an era with no seasons)
pub fn era_summary(trends: &[SeasonalTrend], era1: Era, era2: Era) -> EraSummary {
    let averages = |era: Era| {
        let seasons: Vec<&SeasonalTrend> =
            trends.iter().filter(|t| era.contains(t.year)).collect();
        let sr: Vec<f64> = seasons.iter().map(|t| t.strike_rate).collect();
        let bp: Vec<f64> = seasons.iter().map(|t| t.boundary_percentage).collect();
        EraAverages {
            name: era.name(),
            avg_strike_rate: mean(&sr).unwrap_or(0.0),
            avg_boundary_pct: mean(&bp).unwrap_or(0.0),
        }
    };
    EraSummary {
        era1: averages(era1),
        era2: averages(era2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::batting::tests::ball;

    fn batter_balls(year: i32, batter: &str, runs: &[u16]) -> Vec<MergedDelivery> {
        runs.iter().map(|r| ball(Some(year), batter, *r, false)).collect()
    }

    fn config(min_balls: u32) -> EraComparisonConfig {
        EraComparisonConfig {
            era1: Era::new(2008, 2010),
            era2: Era::new(2011, 2013),
            min_balls,
            significance: 0.05,
        }
    }

    #[test]
    fn test_compare_eras() {
        let mut rows = Vec::new();
        // Era 1: strike rates 100, 120
        rows.extend(batter_balls(2008, "a", &[1, 1]));
        rows.extend(batter_balls(2009, "b", &[1, 1, 1, 1, 2]));
        // Era 2: strike rates 200, 250, 250
        rows.extend(batter_balls(2011, "c", &[2, 2]));
        rows.extend(batter_balls(2012, "d", &[2, 3]));
        rows.extend(batter_balls(2013, "e", &[4, 1]));
        // Outside both eras
        rows.extend(batter_balls(2020, "f", &[6, 6]));

        let result = compare_eras(&rows, &config(2));
        assert_eq!(result.era1_name, "2008-2010");
        assert_eq!(result.players_era1, 2);
        assert_eq!(result.players_era2, 3);
        assert_eq!(result.era1_avg_sr, Some(110.0));
        let era2_sr = result.era2_avg_sr.unwrap();
        assert!((era2_sr - 700.0 / 3.0).abs() < 1e-9);
        assert!((result.strike_rate_increase.unwrap() - 370.0 / 3.0).abs() < 1e-9);

        // Era 1 has no boundaries, era 2 has one in six balls
        assert_eq!(result.era1_boundary_pct, Some(0.0));
        let era2_bp = result.era2_boundary_pct.unwrap();
        assert!((era2_bp - 100.0 / 6.0).abs() < 1e-9);

        assert!((result.t_statistic.unwrap() + 5.416_245).abs() < 1e-5);
        assert!((result.p_value.unwrap() - 0.012_345).abs() < 1e-5);
        assert!(result.significant);
    }

    #[test]
    fn test_min_balls_filter_disables_test() {
        let mut rows = Vec::new();
        rows.extend(batter_balls(2008, "a", &[1, 1]));
        rows.extend(batter_balls(2009, "b", &[1]));
        rows.extend(batter_balls(2011, "c", &[2, 2]));
        rows.extend(batter_balls(2012, "d", &[6, 0]));

        let result = compare_eras(&rows, &config(2));
        assert_eq!(result.players_era1, 1);
        assert_eq!(result.t_statistic, None);
        assert_eq!(result.p_value, None);
        assert!(!result.significant);
    }

    #[test]
    fn test_empty_era() {
        let rows = batter_balls(2008, "a", &[1, 1]);
        let result = compare_eras(&rows, &config(1));
        assert_eq!(result.era2_avg_sr, None);
        assert_eq!(result.era2_boundary_pct, None);
        assert_eq!(result.strike_rate_increase, None);
        assert_eq!(result.boundary_increase, None);
    }

    #[test]
    fn test_era_summary() {
        let mut trends = Vec::new();
        for (year, sr) in [(2008, 110.0), (2009, 120.0), (2015, 140.0)] {
            trends.push(SeasonalTrend {
                year,
                strike_rate: sr,
                boundary_percentage: sr / 10.0,
                dot_ball_percentage: 0.0,
                six_percentage: 0.0,
                four_percentage: 0.0,
                runs_scored: 0.0,
                balls_faced: 0.0,
                run_rate: 0.0,
            });
        }

        let summary = era_summary(&trends, Era::new(2008, 2013), Era::new(2014, 2024));
        assert_eq!(summary.era1.avg_strike_rate, 115.0);
        assert_eq!(summary.era1.avg_boundary_pct, 11.5);
        assert_eq!(summary.era2.name, "2014-2024");
        assert_eq!(summary.era2.avg_strike_rate, 140.0);

        let empty = era_summary(&trends, Era::new(1990, 1991), Era::new(2014, 2024));
        assert_eq!(empty.era1.avg_strike_rate, 0.0);
    }
}
