//! Read-only JSON API over the processed analysis outputs
//!
//! Serves `seasonal_trends.csv` and `batting_stats.csv` as written by
//! `ipl analyze`. Missing files leave the matching endpoints empty.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use serde_json::{json, Value};

use crate::analysis::era::era_summary;
use crate::analysis::top::top_by;
use crate::analysis::{BattingStats, SeasonalTrend};
use crate::data::export::{read_headers, read_records};
use crate::{AnalysisConfig, Config, IplError, Result};

pub const TRENDS_FILE: &str = "seasonal_trends.csv";
pub const BATTING_FILE: &str = "batting_stats.csv";

/// Players listed by `/api/top_players`
const TOP_PLAYERS: usize = 10;

/// Analysis outputs loaded at start-up
#[derive(Debug, Default)]
pub struct AppState {
    pub seasonal_trends: Option<Vec<SeasonalTrend>>,
    pub trend_columns: Vec<String>,
    pub batting_stats: Option<Vec<BattingStats>>,
    pub analysis: AnalysisConfig,
}

impl AppState {
    /// Load processed CSVs from `config.data.processed_dir`
    pub fn load(config: &Config) -> Self {
        let trends_path = config.processed_file(TRENDS_FILE);
        let batting_path = config.processed_file(BATTING_FILE);

        let seasonal_trends = load_table::<SeasonalTrend>(&trends_path);
        let trend_columns = if seasonal_trends.is_some() {
            read_headers(&trends_path).unwrap_or_default()
        } else {
            Vec::new()
        };

        AppState {
            seasonal_trends,
            trend_columns,
            batting_stats: load_table::<BattingStats>(&batting_path),
            analysis: config.analysis.clone(),
        }
    }
}

fn load_table<T: serde::de::DeserializeOwned>(path: &Path) -> Option<Vec<T>> {
    match read_records(path) {
        Ok(rows) => {
            log::info!("Loaded {} rows from {}", rows.len(), path.display());
            Some(rows)
        }
        Err(e) => {
            log::error!("Error loading {}: {}", path.display(), e);
            None
        }
    }
}

/// Row of `/api/top_players`
#[derive(Debug, Clone, Serialize)]
struct TopPlayer {
    batter: String,
    strike_rate: f64,
    year: i32,
    balls_faced: u32,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/trends", get(trends_handler))
        .route("/api/top_players", get(top_players_handler))
        .route("/api/era_comparison", get(era_comparison_handler))
        .route("/api/debug", get(debug_handler))
        .with_state(state)
}

/// Start the HTTP server and block until it exits
pub async fn serve(config: &Config, port: Option<u16>) -> Result<()> {
    let state = Arc::new(AppState::load(config));
    let app = router(state);

    let port = port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", config.server.host, port)
        .parse()
        .map_err(|e| IplError::Config(format!("Invalid server address: {}", e)))?;

    log::info!("Starting IPL analysis API on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index_handler() -> impl IntoResponse {
    Json(json!({
        "name": "IPL batting evolution analysis",
        "routes": ["/api/trends", "/api/top_players", "/api/era_comparison", "/api/debug"],
    }))
}

async fn trends_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.seasonal_trends {
        Some(trends) => Json(json!(trends)),
        None => Json(json!([])),
    }
}

async fn top_players_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let Some(batting) = &state.batting_stats else {
        return Json(json!([]));
    };
    let top: Vec<TopPlayer> = top_by(batting, state.analysis.top_min_balls, TOP_PLAYERS, |s| s.strike_rate)
        .into_iter()
        .map(|s| TopPlayer {
            batter: s.batter,
            strike_rate: s.strike_rate,
            year: s.year,
            balls_faced: s.balls_faced,
        })
        .collect();
    Json(json!(top))
}

async fn era_comparison_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.seasonal_trends {
        Some(trends) => Json(json!(era_summary(trends, state.analysis.era1, state.analysis.era2))),
        None => Json(json!({})),
    }
}

async fn debug_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let Some(trends) = &state.seasonal_trends else {
        return (StatusCode::OK, Json(json!({ "error": "No data loaded" })));
    };
    let years: Vec<i32> = trends.iter().map(|t| t.year).collect();
    let sample: Vec<&SeasonalTrend> = trends.iter().take(3).collect();
    let body: Value = json!({
        "columns": state.trend_columns,
        "years": years,
        "sample_data": sample,
    });
    (StatusCode::OK, Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn trend(year: i32, strike_rate: f64, boundary_percentage: f64) -> SeasonalTrend {
        SeasonalTrend {
            year,
            strike_rate,
            boundary_percentage,
            dot_ball_percentage: 35.0,
            six_percentage: 5.0,
            four_percentage: 10.0,
            runs_scored: 120.0,
            balls_faced: 95.0,
            run_rate: 8.1,
        }
    }

    fn batting(year: i32, batter: &str, balls: u32, strike_rate: f64) -> BattingStats {
        BattingStats {
            year,
            batter: batter.to_string(),
            runs_scored: (strike_rate * balls as f64 / 100.0) as u32,
            balls_faced: balls,
            boundaries: 0,
            dot_balls: 0,
            wickets: 1,
            sixes: 0,
            fours: 0,
            strike_rate,
            boundary_percentage: 0.0,
            dot_ball_percentage: 0.0,
            six_percentage: 0.0,
            four_percentage: 0.0,
            average: Some(10.0),
        }
    }

    async fn get(state: AppState, uri: &str) -> Value {
        let response = router(Arc::new(state))
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn loaded_state() -> AppState {
        AppState {
            seasonal_trends: Some(vec![
                trend(2008, 110.0, 12.0),
                trend(2012, 120.0, 14.0),
                trend(2020, 140.0, 18.0),
                trend(2023, 150.0, 20.0),
            ]),
            trend_columns: vec!["year".to_string(), "strike_rate".to_string()],
            batting_stats: Some(vec![
                batting(2008, "Gilchrist", 150, 140.0),
                batting(2023, "Russell", 99, 220.0),
                batting(2023, "Maxwell", 100, 180.0),
            ]),
            analysis: AnalysisConfig::default(),
        }
    }

    #[tokio::test]
    async fn test_empty_state() {
        assert_eq!(get(AppState::default(), "/api/trends").await, json!([]));
        assert_eq!(get(AppState::default(), "/api/top_players").await, json!([]));
        assert_eq!(get(AppState::default(), "/api/era_comparison").await, json!({}));
        assert_eq!(
            get(AppState::default(), "/api/debug").await,
            json!({ "error": "No data loaded" })
        );
    }

    #[tokio::test]
    async fn test_trends() {
        let body = get(loaded_state(), "/api/trends").await;
        assert_eq!(body.as_array().unwrap().len(), 4);
        assert_eq!(body[0]["year"], 2008);
        assert_eq!(body[3]["strike_rate"], 150.0);
    }

    #[tokio::test]
    async fn test_top_players() {
        let body = get(loaded_state(), "/api/top_players").await;
        let players = body.as_array().unwrap();
        // Russell has fewer than 100 balls
        assert_eq!(players.len(), 2);
        assert_eq!(players[0]["batter"], "Maxwell");
        assert_eq!(players[0]["balls_faced"], 100);
        assert_eq!(players[1]["year"], 2008);
        assert!(players[0].get("wickets").is_none());
    }

    #[tokio::test]
    async fn test_era_comparison() {
        let body = get(loaded_state(), "/api/era_comparison").await;
        assert_eq!(body["era1"]["name"], "2008-2013");
        assert_eq!(body["era1"]["avg_strike_rate"], 115.0);
        assert_eq!(body["era2"]["avg_boundary_pct"], 19.0);
    }

    #[tokio::test]
    async fn test_debug() {
        let body = get(loaded_state(), "/api/debug").await;
        assert_eq!(body["years"], json!([2008, 2012, 2020, 2023]));
        assert_eq!(body["sample_data"].as_array().unwrap().len(), 3);
        assert_eq!(body["columns"][1], "strike_rate");
    }

    #[tokio::test]
    async fn test_index() {
        let body = get(AppState::default(), "/").await;
        assert_eq!(body["routes"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_load_from_processed_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data.processed_dir = dir.path().to_str().unwrap().to_string();

        let empty = AppState::load(&config);
        assert!(empty.seasonal_trends.is_none());
        assert!(empty.batting_stats.is_none());

        crate::data::export::write_records(config.processed_file(TRENDS_FILE), &[trend(2008, 110.0, 12.0)])
            .unwrap();
        let state = AppState::load(&config);
        assert_eq!(state.seasonal_trends.as_ref().map(|t| t.len()), Some(1));
        assert_eq!(state.trend_columns[0], "year");
        assert_eq!(state.trend_columns.len(), 9);
        assert!(state.batting_stats.is_none());
    }
}
