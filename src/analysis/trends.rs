//! Season-by-season trends and trend lines

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::batting::BattingStats;
use super::stats::{linear_fit, mean};
use crate::MergedDelivery;

/// League-wide averages for one season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalTrend {
    pub year: i32,
    pub strike_rate: f64,
    pub boundary_percentage: f64,
    pub dot_ball_percentage: f64,
    pub six_percentage: f64,
    pub four_percentage: f64,
    pub runs_scored: f64,
    pub balls_faced: f64,
    /// Runs per six deliveries across every ball of the season
    pub run_rate: f64,
}

/// Season averages of per-player rates (unweighted), joined with run rate
///
/// Seasons missing from either side are dropped.
pub fn calculate_seasonal_trends(
    batting: &[BattingStats],
    rows: &[MergedDelivery],
) -> Vec<SeasonalTrend> {
    let mut by_year: BTreeMap<i32, Vec<&BattingStats>> = BTreeMap::new();
    for s in batting {
        by_year.entry(s.year).or_default().push(s);
    }

    // (total runs, deliveries) per season
    let mut runs_by_year: BTreeMap<i32, (u64, u64)> = BTreeMap::new();
    for row in rows {
        if let Some(year) = row.year {
            let entry = runs_by_year.entry(year).or_default();
            entry.0 += row.delivery.total_runs as u64;
            entry.1 += 1;
        }
    }

    let trends: Vec<SeasonalTrend> = by_year
        .into_iter()
        .filter_map(|(year, players)| {
            let (runs, balls) = *runs_by_year.get(&year)?;
            let avg = |f: fn(&BattingStats) -> f64| {
                let values: Vec<f64> = players.iter().map(|s| f(s)).collect();
                mean(&values).unwrap_or(0.0)
            };
            Some(SeasonalTrend {
                year,
                strike_rate: avg(|s| s.strike_rate),
                boundary_percentage: avg(|s| s.boundary_percentage),
                dot_ball_percentage: avg(|s| s.dot_ball_percentage),
                six_percentage: avg(|s| s.six_percentage),
                four_percentage: avg(|s| s.four_percentage),
                runs_scored: avg(|s| s.runs_scored as f64),
                balls_faced: avg(|s| s.balls_faced as f64),
                run_rate: runs as f64 / balls as f64 * 6.0,
            })
        })
        .collect();

    log::info!("Seasonal trends calculated for {} seasons", trends.len());
    trends
}

/// A seasonal series that can be charted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendMetric {
    StrikeRate,
    BoundaryPercentage,
    DotBallPercentage,
    SixPercentage,
    FourPercentage,
    RunRate,
}

impl TrendMetric {
    pub const ALL: [TrendMetric; 6] = [
        TrendMetric::StrikeRate,
        TrendMetric::BoundaryPercentage,
        TrendMetric::DotBallPercentage,
        TrendMetric::SixPercentage,
        TrendMetric::FourPercentage,
        TrendMetric::RunRate,
    ];

    pub fn value(&self, trend: &SeasonalTrend) -> f64 {
        match self {
            TrendMetric::StrikeRate => trend.strike_rate,
            TrendMetric::BoundaryPercentage => trend.boundary_percentage,
            TrendMetric::DotBallPercentage => trend.dot_ball_percentage,
            TrendMetric::SixPercentage => trend.six_percentage,
            TrendMetric::FourPercentage => trend.four_percentage,
            TrendMetric::RunRate => trend.run_rate,
        }
    }
}

impl fmt::Display for TrendMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrendMetric::StrikeRate => "Strike rate",
            TrendMetric::BoundaryPercentage => "Boundary %",
            TrendMetric::DotBallPercentage => "Dot ball %",
            TrendMetric::SixPercentage => "Six %",
            TrendMetric::FourPercentage => "Four %",
            TrendMetric::RunRate => "Run rate",
        };
        write!(f, "{}", name)
    }
}

/// Linear trend of one metric across seasons
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendLine {
    pub metric: TrendMetric,
    pub first_year: i32,
    pub last_year: i32,
    pub first_value: f64,
    pub last_value: f64,
    /// Change per season of the least-squares line
    pub slope: f64,
    pub intercept: f64,
    /// last_value - first_value
    pub total_change: f64,
    /// total_change spread over the seasons between first and last
    pub annual_change: f64,
}

/// Fit a trend line for a metric, None with fewer than two seasons
pub fn trend_line(trends: &[SeasonalTrend], metric: TrendMetric) -> Option<TrendLine> {
    let mut points: Vec<(i32, f64)> = trends.iter().map(|t| (t.year, metric.value(t))).collect();
    points.sort_by_key(|(year, _)| *year);

    let xs: Vec<f64> = points.iter().map(|(year, _)| *year as f64).collect();
    let ys: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
    let fit = linear_fit(&xs, &ys)?;

    let (first_year, first_value) = *points.first()?;
    let (last_year, last_value) = *points.last()?;
    let total_change = last_value - first_value;

    Some(TrendLine {
        metric,
        first_year,
        last_year,
        first_value,
        last_value,
        slope: fit.slope,
        intercept: fit.intercept,
        total_change,
        annual_change: total_change / (points.len() - 1) as f64,
    })
}

/// Trend lines for every charted metric
pub fn all_trend_lines(trends: &[SeasonalTrend]) -> Vec<TrendLine> {
    TrendMetric::ALL
        .iter()
        .filter_map(|m| trend_line(trends, *m))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::batting::calculate_batting_stats;
    use crate::analysis::batting::tests::ball;

    fn trend(year: i32, strike_rate: f64) -> SeasonalTrend {
        SeasonalTrend {
            year,
            strike_rate,
            boundary_percentage: 10.0,
            dot_ball_percentage: 40.0,
            six_percentage: 4.0,
            four_percentage: 6.0,
            runs_scored: 100.0,
            balls_faced: 80.0,
            run_rate: 8.0,
        }
    }

    #[test]
    fn test_seasonal_means_and_run_rate() {
        let rows = vec![
            // 2008: A scores 4 off 2, B scores 0 off 1
            ball(Some(2008), "A", 4, false),
            ball(Some(2008), "A", 0, false),
            ball(Some(2008), "B", 0, false),
            // 2009: A scores 6 off 1
            ball(Some(2009), "A", 6, false),
        ];
        let batting = calculate_batting_stats(&rows);
        let trends = calculate_seasonal_trends(&batting, &rows);

        assert_eq!(trends.len(), 2);
        let t2008 = &trends[0];
        assert_eq!(t2008.year, 2008);
        // mean of 200.0 and 0.0
        assert_eq!(t2008.strike_rate, 100.0);
        assert_eq!(t2008.boundary_percentage, 25.0);
        assert_eq!(t2008.runs_scored, 2.0);
        assert_eq!(t2008.balls_faced, 1.5);
        // 4 runs off 3 deliveries
        assert!((t2008.run_rate - 8.0).abs() < 1e-12);

        assert_eq!(trends[1].run_rate, 36.0);
    }

    #[test]
    fn test_seasons_without_batting_rows_are_dropped() {
        let rows = vec![ball(Some(2008), "A", 1, false), ball(Some(2009), "", 1, false)];
        let batting = calculate_batting_stats(&rows);
        let trends = calculate_seasonal_trends(&batting, &rows);
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].year, 2008);
    }

    #[test]
    fn test_trend_line() {
        let trends = vec![trend(2010, 130.0), trend(2008, 120.0), trend(2009, 125.0)];
        let line = trend_line(&trends, TrendMetric::StrikeRate).unwrap();

        assert_eq!(line.first_year, 2008);
        assert_eq!(line.last_year, 2010);
        assert!((line.slope - 5.0).abs() < 1e-9);
        assert_eq!(line.total_change, 10.0);
        assert_eq!(line.annual_change, 5.0);

        assert!(trend_line(&trends[..1], TrendMetric::StrikeRate).is_none());
        assert_eq!(all_trend_lines(&trends).len(), TrendMetric::ALL.len());
    }
}
