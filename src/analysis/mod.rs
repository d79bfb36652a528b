//! Batting analysis
//!
//! Per-season batting statistics, league-wide seasonal trends, era comparison
//! with a significance test and top performer tables.

pub mod batting;
pub mod era;
pub mod stats;
pub mod top;
pub mod trends;

use serde::Serialize;

pub use batting::{calculate_batting_stats, BattingStats};
pub use era::{compare_eras, era_summary, EraComparison, EraComparisonConfig, EraSummary};
pub use top::{top_performers, TopPerformers};
pub use trends::{all_trend_lines, calculate_seasonal_trends, SeasonalTrend, TrendLine, TrendMetric};

use crate::{AnalysisConfig, IplError, MergedDelivery, Result};

/// Everything produced by one analysis run
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub batting: Vec<BattingStats>,
    pub trends: Vec<SeasonalTrend>,
    pub trend_lines: Vec<TrendLine>,
    pub era_comparison: EraComparison,
    pub top: TopPerformers,
}

impl AnalysisReport {
    /// Strike rate of the first and last analysed seasons
    pub fn strike_rate_evolution(&self) -> Option<(&SeasonalTrend, &SeasonalTrend)> {
        Some((self.trends.first()?, self.trends.last()?))
    }
}

/// Run the full batting analysis over merged deliveries
pub fn run_analysis(rows: &[MergedDelivery], config: &AnalysisConfig) -> Result<AnalysisReport> {
    if rows.is_empty() {
        return Err(IplError::InsufficientData(
            "no deliveries loaded, run `ipl data import` first".to_string(),
        ));
    }
    log::info!("Analysing {} deliveries", rows.len());

    let batting = calculate_batting_stats(rows);
    let trends = calculate_seasonal_trends(&batting, rows);
    let trend_lines = all_trend_lines(&trends);
    let era_comparison = compare_eras(
        rows,
        &EraComparisonConfig {
            era1: config.era1,
            era2: config.era2,
            min_balls: config.era_min_balls,
            significance: config.significance,
        },
    );
    let top = top_performers(&batting, config.top_min_balls, config.top_n);

    Ok(AnalysisReport {
        batting,
        trends,
        trend_lines,
        era_comparison,
        top,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::batting::tests::ball;
    use crate::Era;

    #[test]
    fn test_run_analysis() {
        let mut rows = Vec::new();
        for year in [2008, 2009, 2015] {
            for runs in [1, 4, 0, 6] {
                rows.push(ball(Some(year), "a", runs, false));
                rows.push(ball(Some(year), "b", runs / 2, false));
            }
        }
        let config = AnalysisConfig {
            top_min_balls: 4,
            era_min_balls: 1,
            ..AnalysisConfig::default()
        };

        let report = run_analysis(&rows, &config).unwrap();
        assert_eq!(report.batting.len(), 6);
        assert_eq!(report.trends.len(), 3);
        assert_eq!(report.trend_lines.len(), TrendMetric::ALL.len());
        assert_eq!(report.era_comparison.era1_name, Era::new(2008, 2013).name());
        assert_eq!(report.top.by_strike_rate.len(), 6);
        assert_eq!(report.top.by_strike_rate[0].batter, "a");

        let (first, last) = report.strike_rate_evolution().unwrap();
        assert_eq!(first.year, 2008);
        assert_eq!(last.year, 2015);
    }

    #[test]
    fn test_run_analysis_empty() {
        let result = run_analysis(&[], &AnalysisConfig::default());
        assert!(matches!(result, Err(IplError::InsufficientData(_))));
    }
}
