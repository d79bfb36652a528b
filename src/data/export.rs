//! CSV output of cleaned data and analysis tables

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{MergedDelivery, Result};

/// Flat row of the cleaned, merged dataset
#[derive(Debug, Serialize)]
struct CleanedRow<'a> {
    match_id: i64,
    inning: u8,
    batting_team: &'a str,
    bowling_team: &'a str,
    over: u16,
    ball: u16,
    batter: &'a str,
    bowler: &'a str,
    non_striker: &'a str,
    batsman_runs: u16,
    extra_runs: u16,
    total_runs: u16,
    extras_type: &'a str,
    is_wicket: u8,
    player_dismissed: &'a str,
    dismissal_kind: &'a str,
    fielder: &'a str,
    year: Option<i32>,
    team1: Option<&'a str>,
    team2: Option<&'a str>,
    is_boundary: bool,
    is_dot_ball: bool,
    is_six: bool,
    is_four: bool,
}

impl<'a> From<&'a MergedDelivery> for CleanedRow<'a> {
    fn from(row: &'a MergedDelivery) -> Self {
        let d = &row.delivery;
        CleanedRow {
            match_id: d.match_id,
            inning: d.inning,
            batting_team: &d.batting_team,
            bowling_team: &d.bowling_team,
            over: d.over,
            ball: d.ball,
            batter: &d.batter,
            bowler: &d.bowler,
            non_striker: &d.non_striker,
            batsman_runs: d.batsman_runs,
            extra_runs: d.extra_runs,
            total_runs: d.total_runs,
            extras_type: &d.extras_type,
            is_wicket: d.is_wicket as u8,
            player_dismissed: &d.player_dismissed,
            dismissal_kind: &d.dismissal_kind,
            fielder: &d.fielder,
            year: row.year,
            team1: row.team1.as_deref(),
            team2: row.team2.as_deref(),
            is_boundary: d.is_boundary(),
            is_dot_ball: d.is_dot_ball(),
            is_six: d.is_six(),
            is_four: d.is_four(),
        }
    }
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Write the cleaned dataset with its derived flags
pub fn write_cleaned<P: AsRef<Path>>(path: P, rows: &[MergedDelivery]) -> Result<usize> {
    let path = path.as_ref();
    create_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(CleanedRow::from(row))?;
    }
    writer.flush()?;
    log::info!("Cleaned data saved to {}", path.display());
    Ok(rows.len())
}

/// Write any serializable table as CSV with a header row
pub fn write_records<T: Serialize, P: AsRef<Path>>(path: P, records: &[T]) -> Result<()> {
    let path = path.as_ref();
    create_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    log::info!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}

/// Read a CSV table written by [`write_records`]
pub fn read_records<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

/// Column names of a CSV file
pub fn read_headers<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path)?;
    Ok(reader.headers()?.iter().map(str::to_string).collect())
}

/// Render a table as CSV text (for stdout)
pub fn to_csv_string<T: Serialize>(records: &[T]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| crate::IplError::Io(std::io::Error::other(e.to_string())))?;
    String::from_utf8(bytes).map_err(|e| crate::IplError::Parse(e.to_string()))
}
