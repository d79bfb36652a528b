//! Raw CSV ingestion and cleaning
//!
//! Reads the ball-by-ball and match list exports, fills missing values and
//! derives the season year.

use std::collections::HashMap;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use crate::{Delivery, IplError, MatchInfo, MergedDelivery, Result, TossDecision, NOT_OUT, NO_EXTRAS};

/// Delivery row as it appears in the raw export
#[derive(Debug, Deserialize)]
struct RawDelivery {
    match_id: i64,
    inning: u8,
    batting_team: String,
    bowling_team: String,
    over: u16,
    ball: u16,
    batter: Option<String>,
    bowler: Option<String>,
    non_striker: Option<String>,
    batsman_runs: u16,
    extra_runs: u16,
    total_runs: u16,
    extras_type: Option<String>,
    is_wicket: i64,
    player_dismissed: Option<String>,
    dismissal_kind: Option<String>,
    fielder: Option<String>,
}

/// Match row as it appears in the raw export
#[derive(Debug, Deserialize)]
struct RawMatch {
    id: i64,
    season: String,
    city: Option<String>,
    date: String,
    match_type: Option<String>,
    player_of_match: Option<String>,
    venue: Option<String>,
    team1: String,
    team2: String,
    toss_winner: Option<String>,
    toss_decision: Option<String>,
    winner: Option<String>,
    result: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    result_margin: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    target_runs: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    target_overs: Option<f64>,
    super_over: Option<String>,
    method: Option<String>,
}

/// Treat empty cells and the literal `NA` as missing
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "NA")
}

fn fill(value: Option<String>, default: &str) -> String {
    present(value).unwrap_or_else(|| default.to_string())
}

/// Extract the season year: the first four digits of the season label
///
/// `"2007/08"` gives 2007 and `"2008"` gives 2008.
pub fn season_year(season: &str) -> Option<i32> {
    let digits: String = season.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() >= 4 {
        digits[..4].parse().ok()
    } else {
        None
    }
}

/// Parse a match date in any of the formats seen in IPL exports
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

impl From<RawDelivery> for Delivery {
    fn from(raw: RawDelivery) -> Self {
        Delivery {
            match_id: raw.match_id,
            inning: raw.inning,
            batting_team: raw.batting_team,
            bowling_team: raw.bowling_team,
            over: raw.over,
            ball: raw.ball,
            batter: present(raw.batter).unwrap_or_default(),
            bowler: present(raw.bowler).unwrap_or_default(),
            non_striker: present(raw.non_striker).unwrap_or_default(),
            batsman_runs: raw.batsman_runs,
            extra_runs: raw.extra_runs,
            total_runs: raw.total_runs,
            extras_type: fill(raw.extras_type, NO_EXTRAS),
            is_wicket: raw.is_wicket != 0,
            player_dismissed: fill(raw.player_dismissed, NOT_OUT),
            dismissal_kind: fill(raw.dismissal_kind, NOT_OUT),
            fielder: fill(raw.fielder, "none"),
        }
    }
}

impl TryFrom<RawMatch> for MatchInfo {
    type Error = IplError;

    fn try_from(raw: RawMatch) -> Result<Self> {
        let date = parse_date(&raw.date).ok_or_else(|| {
            IplError::Parse(format!("Match {}: invalid date '{}'", raw.id, raw.date))
        })?;
        let year = season_year(&raw.season).unwrap_or_else(|| date.year());

        Ok(MatchInfo {
            id: raw.id,
            season: raw.season,
            year,
            city: present(raw.city),
            date,
            match_type: present(raw.match_type),
            player_of_match: present(raw.player_of_match),
            venue: present(raw.venue),
            team1: raw.team1,
            team2: raw.team2,
            toss_winner: present(raw.toss_winner),
            toss_decision: present(raw.toss_decision)
                .and_then(|d| TossDecision::from_str_loose(&d)),
            winner: present(raw.winner),
            result: present(raw.result),
            result_margin: raw.result_margin,
            target_runs: raw.target_runs,
            target_overs: raw.target_overs,
            super_over: present(raw.super_over),
            method: present(raw.method),
        })
    }
}

/// Read and clean the ball-by-ball export
pub fn load_deliveries<P: AsRef<Path>>(path: P) -> Result<Vec<Delivery>> {
    let path = path.as_ref();
    log::info!("Loading deliveries from {}", path.display());
    let mut reader = csv::Reader::from_path(path)?;
    read_deliveries(&mut reader)
}

/// Read and clean the match list export
pub fn load_matches<P: AsRef<Path>>(path: P) -> Result<Vec<MatchInfo>> {
    let path = path.as_ref();
    log::info!("Loading matches from {}", path.display());
    let mut reader = csv::Reader::from_path(path)?;
    read_matches(&mut reader)
}

pub fn read_deliveries<R: std::io::Read>(reader: &mut csv::Reader<R>) -> Result<Vec<Delivery>> {
    let mut deliveries = Vec::new();
    for row in reader.deserialize::<RawDelivery>() {
        deliveries.push(Delivery::from(row?));
    }
    log::debug!("Read {} deliveries", deliveries.len());
    Ok(deliveries)
}

pub fn read_matches<R: std::io::Read>(reader: &mut csv::Reader<R>) -> Result<Vec<MatchInfo>> {
    let mut matches = Vec::new();
    for row in reader.deserialize::<RawMatch>() {
        matches.push(MatchInfo::try_from(row?)?);
    }
    log::debug!("Read {} matches", matches.len());
    Ok(matches)
}

/// Left-join deliveries with their matches
pub fn merge(deliveries: Vec<Delivery>, matches: &[MatchInfo]) -> Vec<MergedDelivery> {
    let by_id: HashMap<i64, &MatchInfo> = matches.iter().map(|m| (m.id, m)).collect();

    let mut unmatched = 0usize;
    let merged: Vec<MergedDelivery> = deliveries
        .into_iter()
        .map(|delivery| {
            let info = by_id.get(&delivery.match_id);
            if info.is_none() {
                unmatched += 1;
            }
            MergedDelivery {
                year: info.map(|m| m.year),
                team1: info.map(|m| m.team1.clone()),
                team2: info.map(|m| m.team2.clone()),
                delivery,
            }
        })
        .collect();

    if unmatched > 0 {
        log::warn!("{} deliveries reference unknown matches", unmatched);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELIVERIES: &str = "\
match_id,inning,batting_team,bowling_team,over,ball,batter,bowler,non_striker,batsman_runs,extra_runs,total_runs,extras_type,is_wicket,player_dismissed,dismissal_kind,fielder
335982,1,Kolkata Knight Riders,Royal Challengers Bangalore,0,1,SC Ganguly,P Kumar,BB McCullum,0,1,1,legbyes,0,NA,NA,NA
335982,1,Kolkata Knight Riders,Royal Challengers Bangalore,0,2,BB McCullum,P Kumar,SC Ganguly,4,0,4,,0,,,
335982,1,Kolkata Knight Riders,Royal Challengers Bangalore,0,3,BB McCullum,P Kumar,SC Ganguly,0,0,0,NA,1,BB McCullum,caught,V Kohli
";

    const MATCHES: &str = "\
id,season,city,date,match_type,player_of_match,venue,team1,team2,toss_winner,toss_decision,winner,result,result_margin,target_runs,target_overs,super_over,method,umpire1,umpire2
335982,2007/08,Bangalore,2008-04-18,League,BB McCullum,M Chinnaswamy Stadium,Royal Challengers Bangalore,Kolkata Knight Riders,Royal Challengers Bangalore,field,Kolkata Knight Riders,runs,140,223,20,N,NA,Asad Rauf,RE Koertzen
419111,2010,Mumbai,21/03/2010,League,NA,Brabourne,Mumbai Indians,Rajasthan Royals,Mumbai Indians,bat,NA,no result,NA,NA,NA,N,NA,A,B
";

    #[test]
    fn test_season_year() {
        assert_eq!(season_year("2007/08"), Some(2007));
        assert_eq!(season_year("2008"), Some(2008));
        assert_eq!(season_year("2020/21"), Some(2020));
        assert_eq!(season_year("IPL"), None);
        assert_eq!(season_year("08"), None);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2010, 3, 21).unwrap();
        assert_eq!(parse_date("2010-03-21"), Some(expected));
        assert_eq!(parse_date("21/03/2010"), Some(expected));
        assert_eq!(parse_date("21-03-2010"), Some(expected));
        assert_eq!(parse_date("March 21"), None);
    }

    #[test]
    fn test_read_deliveries_fills_missing() {
        let mut reader = csv::Reader::from_reader(DELIVERIES.as_bytes());
        let deliveries = read_deliveries(&mut reader).unwrap();
        assert_eq!(deliveries.len(), 3);

        assert_eq!(deliveries[0].extras_type, "legbyes");
        assert_eq!(deliveries[0].player_dismissed, NOT_OUT);
        assert_eq!(deliveries[0].fielder, "none");

        assert_eq!(deliveries[1].extras_type, NO_EXTRAS);
        assert!(deliveries[1].is_boundary());
        assert!(!deliveries[1].is_dot_ball());

        assert!(deliveries[2].is_wicket);
        assert!(deliveries[2].is_dot_ball());
        assert_eq!(deliveries[2].dismissal_kind, "caught");
    }

    #[test]
    fn test_read_matches() {
        let mut reader = csv::Reader::from_reader(MATCHES.as_bytes());
        let matches = read_matches(&mut reader).unwrap();
        assert_eq!(matches.len(), 2);

        let first = &matches[0];
        assert_eq!(first.year, 2007);
        assert_eq!(first.toss_decision, Some(TossDecision::Field));
        assert_eq!(first.result_margin, Some(140.0));
        assert_eq!(first.method, None);
        assert_eq!(first.team1_won(), Some(false));

        let second = &matches[1];
        assert_eq!(second.year, 2010);
        assert_eq!(second.winner, None);
        assert_eq!(second.result_margin, None);
        assert_eq!(second.player_of_match, None);
    }

    #[test]
    fn test_invalid_date_is_error() {
        let data = "\
id,season,city,date,match_type,player_of_match,venue,team1,team2,toss_winner,toss_decision,winner,result,result_margin,target_runs,target_overs,super_over,method
1,2009,X,someday,League,NA,V,A,B,A,bat,A,runs,1,2,20,N,NA
";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let err = read_matches(&mut reader).unwrap_err();
        assert!(matches!(err, IplError::Parse(_)));
    }

    #[test]
    fn test_merge_left_join() {
        let mut reader = csv::Reader::from_reader(DELIVERIES.as_bytes());
        let mut deliveries = read_deliveries(&mut reader).unwrap();
        let mut reader = csv::Reader::from_reader(MATCHES.as_bytes());
        let matches = read_matches(&mut reader).unwrap();

        deliveries[2].match_id = 999;
        let merged = merge(deliveries, &matches);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].year, Some(2007));
        assert_eq!(merged[0].team1.as_deref(), Some("Royal Challengers Bangalore"));
        assert_eq!(merged[2].year, None);
    }
}
