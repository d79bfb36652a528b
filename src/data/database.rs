//! SQLite database management for cleaned IPL data

use std::collections::BTreeSet;
use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::{Delivery, MatchInfo, MergedDelivery, Result, TossDecision};

const DATE_FORMAT: &str = "%Y-%m-%d";

const DELIVERY_COLUMNS: &str = "d.match_id, d.inning, d.batting_team, d.bowling_team, d.over, d.ball,
     d.batter, d.bowler, d.non_striker, d.batsman_runs, d.extra_runs, d.total_runs,
     d.extras_type, d.is_wicket, d.player_dismissed, d.dismissal_kind, d.fielder";

const MATCH_COLUMNS: &str = "id, season, year, city, date, match_type, player_of_match, venue,
     team1, team2, toss_winner, toss_decision, winner, result, result_margin,
     target_runs, target_overs, super_over, method";

/// Database connection and operations
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS matches (
                id INTEGER PRIMARY KEY,
                season TEXT NOT NULL,
                year INTEGER NOT NULL,
                city TEXT,
                date TEXT NOT NULL,
                match_type TEXT,
                player_of_match TEXT,
                venue TEXT,
                team1 TEXT NOT NULL,
                team2 TEXT NOT NULL,
                toss_winner TEXT,
                toss_decision TEXT,
                winner TEXT,
                result TEXT,
                result_margin REAL,
                target_runs REAL,
                target_overs REAL,
                super_over TEXT,
                method TEXT
            );

            CREATE TABLE IF NOT EXISTS deliveries (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                match_id INTEGER NOT NULL,
                inning INTEGER NOT NULL,
                batting_team TEXT NOT NULL,
                bowling_team TEXT NOT NULL,
                over INTEGER NOT NULL,
                ball INTEGER NOT NULL,
                batter TEXT NOT NULL,
                bowler TEXT NOT NULL,
                non_striker TEXT NOT NULL,
                batsman_runs INTEGER NOT NULL,
                extra_runs INTEGER NOT NULL,
                total_runs INTEGER NOT NULL,
                extras_type TEXT NOT NULL,
                is_wicket INTEGER NOT NULL,
                player_dismissed TEXT NOT NULL,
                dismissal_kind TEXT NOT NULL,
                fielder TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_matches_date ON matches(date);
            CREATE INDEX IF NOT EXISTS idx_matches_year ON matches(year);
            CREATE INDEX IF NOT EXISTS idx_deliveries_match ON deliveries(match_id);
            "#,
        )?;
        Ok(())
    }

    // ==================== Import ====================

    /// Store matches and deliveries, replacing anything already held for the
    /// same match ids
    pub fn import(&mut self, matches: &[MatchInfo], deliveries: &[Delivery]) -> Result<ImportSummary> {
        let tx = self.conn.transaction()?;

        let mut replaced_ids: BTreeSet<i64> = matches.iter().map(|m| m.id).collect();
        replaced_ids.extend(deliveries.iter().map(|d| d.match_id));
        {
            let mut delete = tx.prepare("DELETE FROM deliveries WHERE match_id = ?1")?;
            for id in &replaced_ids {
                delete.execute(params![id])?;
            }
        }

        {
            let mut insert = tx.prepare(
                r#"
                INSERT INTO matches (id, season, year, city, date, match_type, player_of_match,
                                     venue, team1, team2, toss_winner, toss_decision, winner,
                                     result, result_margin, target_runs, target_overs,
                                     super_over, method)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                        ?17, ?18, ?19)
                ON CONFLICT(id) DO UPDATE SET
                    season = excluded.season,
                    year = excluded.year,
                    city = excluded.city,
                    date = excluded.date,
                    match_type = excluded.match_type,
                    player_of_match = excluded.player_of_match,
                    venue = excluded.venue,
                    team1 = excluded.team1,
                    team2 = excluded.team2,
                    toss_winner = excluded.toss_winner,
                    toss_decision = excluded.toss_decision,
                    winner = excluded.winner,
                    result = excluded.result,
                    result_margin = excluded.result_margin,
                    target_runs = excluded.target_runs,
                    target_overs = excluded.target_overs,
                    super_over = excluded.super_over,
                    method = excluded.method
                "#,
            )?;
            for m in matches {
                insert.execute(params![
                    m.id,
                    m.season,
                    m.year,
                    m.city,
                    m.date.format(DATE_FORMAT).to_string(),
                    m.match_type,
                    m.player_of_match,
                    m.venue,
                    m.team1,
                    m.team2,
                    m.toss_winner,
                    m.toss_decision.map(|d| d.to_string()),
                    m.winner,
                    m.result,
                    m.result_margin,
                    m.target_runs,
                    m.target_overs,
                    m.super_over,
                    m.method,
                ])?;
            }
        }

        {
            let mut insert = tx.prepare(
                r#"
                INSERT INTO deliveries (match_id, inning, batting_team, bowling_team, over, ball,
                                        batter, bowler, non_striker, batsman_runs, extra_runs,
                                        total_runs, extras_type, is_wicket, player_dismissed,
                                        dismissal_kind, fielder)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
                "#,
            )?;
            for d in deliveries {
                insert.execute(params![
                    d.match_id,
                    d.inning,
                    d.batting_team,
                    d.bowling_team,
                    d.over,
                    d.ball,
                    d.batter,
                    d.bowler,
                    d.non_striker,
                    d.batsman_runs,
                    d.extra_runs,
                    d.total_runs,
                    d.extras_type,
                    d.is_wicket,
                    d.player_dismissed,
                    d.dismissal_kind,
                    d.fielder,
                ])?;
            }
        }

        tx.commit()?;

        Ok(ImportSummary {
            matches: matches.len(),
            deliveries: deliveries.len(),
        })
    }

    // ==================== Match Operations ====================

    /// Get all matches in chronological order
    pub fn get_matches(&self) -> Result<Vec<MatchInfo>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM matches ORDER BY date, id",
            MATCH_COLUMNS
        ))?;
        let matches = stmt
            .query_map([], Self::row_to_match)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(matches)
    }

    /// All team names appearing in the match list
    pub fn get_teams(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT team1 FROM matches UNION SELECT team2 FROM matches ORDER BY 1")?;
        let teams = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(teams)
    }

    /// Resolve a team name case-insensitively
    pub fn find_team(&self, name: &str) -> Result<Option<String>> {
        let team = self
            .conn
            .query_row(
                "SELECT name FROM (SELECT team1 AS name FROM matches UNION SELECT team2 FROM matches)
                 WHERE LOWER(name) = LOWER(?1)",
                params![name.trim()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(team)
    }

    fn row_to_match(row: &rusqlite::Row) -> rusqlite::Result<MatchInfo> {
        let date_str: String = row.get(4)?;
        let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let toss_decision: Option<String> = row.get(11)?;

        Ok(MatchInfo {
            id: row.get(0)?,
            season: row.get(1)?,
            year: row.get(2)?,
            city: row.get(3)?,
            date,
            match_type: row.get(5)?,
            player_of_match: row.get(6)?,
            venue: row.get(7)?,
            team1: row.get(8)?,
            team2: row.get(9)?,
            toss_winner: row.get(10)?,
            toss_decision: toss_decision.and_then(|d| TossDecision::from_str_loose(&d)),
            winner: row.get(12)?,
            result: row.get(13)?,
            result_margin: row.get(14)?,
            target_runs: row.get(15)?,
            target_overs: row.get(16)?,
            super_over: row.get(17)?,
            method: row.get(18)?,
        })
    }

    // ==================== Delivery Operations ====================

    /// All deliveries left-joined with their match, in import order
    pub fn get_merged_deliveries(&self) -> Result<Vec<MergedDelivery>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {}, m.year, m.team1, m.team2
             FROM deliveries d LEFT JOIN matches m ON d.match_id = m.id
             ORDER BY d.seq",
            DELIVERY_COLUMNS
        ))?;
        let rows = stmt
            .query_map([], Self::row_to_merged)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Deliveries from matches in the inclusive season range
    pub fn get_deliveries_in_years(&self, start: i32, end: i32) -> Result<Vec<MergedDelivery>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {}, m.year, m.team1, m.team2
             FROM deliveries d JOIN matches m ON d.match_id = m.id
             WHERE m.year >= ?1 AND m.year <= ?2
             ORDER BY d.seq",
            DELIVERY_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![start, end], Self::row_to_merged)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn row_to_merged(row: &rusqlite::Row) -> rusqlite::Result<MergedDelivery> {
        let delivery = Delivery {
            match_id: row.get(0)?,
            inning: row.get(1)?,
            batting_team: row.get(2)?,
            bowling_team: row.get(3)?,
            over: row.get(4)?,
            ball: row.get(5)?,
            batter: row.get(6)?,
            bowler: row.get(7)?,
            non_striker: row.get(8)?,
            batsman_runs: row.get(9)?,
            extra_runs: row.get(10)?,
            total_runs: row.get(11)?,
            extras_type: row.get(12)?,
            is_wicket: row.get(13)?,
            player_dismissed: row.get(14)?,
            dismissal_kind: row.get(15)?,
            fielder: row.get(16)?,
        };
        Ok(MergedDelivery {
            delivery,
            year: row.get(17)?,
            team1: row.get(18)?,
            team2: row.get(19)?,
        })
    }

    /// Runs and deliveries per (match, batting team), for team form features
    ///
    /// Only the two regular innings count; super overs are left out.
    pub fn get_innings_totals(&self) -> Result<Vec<InningsTotal>> {
        let mut stmt = self.conn.prepare(
            "SELECT match_id, batting_team, SUM(total_runs), COUNT(*)
             FROM deliveries
             WHERE inning <= 2
             GROUP BY match_id, batting_team
             ORDER BY match_id, batting_team",
        )?;
        let totals = stmt
            .query_map([], |row| {
                Ok(InningsTotal {
                    match_id: row.get(0)?,
                    batting_team: row.get(1)?,
                    runs: row.get(2)?,
                    deliveries: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(totals)
    }

    // ==================== Statistics ====================

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let match_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM matches", [], |row| row.get(0))?;

        let delivery_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM deliveries", [], |row| row.get(0))?;

        let min_date: Option<String> = self
            .conn
            .query_row("SELECT MIN(date) FROM matches", [], |row| row.get(0))
            .optional()?
            .flatten();

        let max_date: Option<String> = self
            .conn
            .query_row("SELECT MAX(date) FROM matches", [], |row| row.get(0))
            .optional()?
            .flatten();

        Ok(DatabaseStats {
            match_count: match_count as usize,
            delivery_count: delivery_count as usize,
            earliest_match: min_date.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok()),
            latest_match: max_date.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok()),
        })
    }

    /// Summary of the merged dataset
    pub fn summary(&self) -> Result<DatasetSummary> {
        let (total_matches, total_balls, unique_players): (i64, i64, i64) = self.conn.query_row(
            "SELECT COUNT(DISTINCT match_id), COUNT(*), COUNT(DISTINCT NULLIF(batter, ''))
             FROM deliveries",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let (total_seasons, first_season, last_season): (i64, Option<i32>, Option<i32>) =
            self.conn.query_row(
                "SELECT COUNT(DISTINCT m.year), MIN(m.year), MAX(m.year)
                 FROM deliveries d JOIN matches m ON d.match_id = m.id",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;

        let unique_teams: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM (SELECT team1 FROM matches UNION SELECT team2 FROM matches)",
            [],
            |row| row.get(0),
        )?;

        Ok(DatasetSummary {
            total_matches: total_matches as usize,
            total_balls: total_balls as usize,
            total_seasons: total_seasons as usize,
            first_season,
            last_season,
            unique_players: unique_players as usize,
            unique_teams: unique_teams as usize,
        })
    }
}

/// Counts written by an import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub matches: usize,
    pub deliveries: usize,
}

/// Runs scored by one side in one match
#[derive(Debug, Clone, PartialEq)]
pub struct InningsTotal {
    pub match_id: i64,
    pub batting_team: String,
    pub runs: i64,
    pub deliveries: i64,
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub match_count: usize,
    pub delivery_count: usize,
    pub earliest_match: Option<NaiveDate>,
    pub latest_match: Option<NaiveDate>,
}

/// Headline numbers for the merged dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub total_matches: usize,
    pub total_balls: usize,
    pub total_seasons: usize,
    pub first_season: Option<i32>,
    pub last_season: Option<i32>,
    pub unique_players: usize,
    pub unique_teams: usize,
}

impl DatasetSummary {
    pub fn seasons_range(&self) -> String {
        match (self.first_season, self.last_season) {
            (Some(first), Some(last)) => format!("{}-{}", first, last),
            _ => "n/a".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{sample_delivery as delivery, sample_match};

    #[test]
    fn test_create_database() {
        let db = Database::in_memory().unwrap();
        let stats = db.get_stats().unwrap();
        assert_eq!(stats.match_count, 0);
        assert_eq!(stats.delivery_count, 0);
        assert!(stats.earliest_match.is_none());
    }

    #[test]
    fn test_import_and_read_back() {
        let mut db = Database::in_memory().unwrap();
        let matches = vec![
            sample_match(2, 2009, "Mumbai Indians", "Chennai Super Kings", Some("Mumbai Indians")),
            sample_match(1, 2008, "Chennai Super Kings", "Mumbai Indians", None),
        ];
        let deliveries = vec![
            delivery(1, "Chennai Super Kings", "MS Dhoni", 4),
            delivery(2, "Mumbai Indians", "SR Tendulkar", 6),
            delivery(3, "Unknown", "Nobody", 1),
        ];

        let summary = db.import(&matches, &deliveries).unwrap();
        assert_eq!(summary.matches, 2);
        assert_eq!(summary.deliveries, 3);

        let stored = db.get_matches().unwrap();
        assert_eq!(stored.len(), 2);
        // Chronological order
        assert_eq!(stored[0].id, 1);
        assert_eq!(stored[0], matches[1]);

        let merged = db.get_merged_deliveries().unwrap();
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].year, Some(2008));
        assert_eq!(merged[2].year, None);

        let in_2009 = db.get_deliveries_in_years(2009, 2009).unwrap();
        assert_eq!(in_2009.len(), 1);
        assert_eq!(in_2009[0].delivery.batter, "SR Tendulkar");
    }

    #[test]
    fn test_reimport_replaces_match() {
        let mut db = Database::in_memory().unwrap();
        let matches = vec![sample_match(1, 2008, "A", "B", Some("A"))];
        let deliveries = vec![delivery(1, "A", "x", 1), delivery(1, "A", "y", 2)];

        db.import(&matches, &deliveries).unwrap();
        db.import(&matches, &deliveries).unwrap();

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.match_count, 1);
        assert_eq!(stats.delivery_count, 2);
    }

    #[test]
    fn test_find_team_case_insensitive() {
        let mut db = Database::in_memory().unwrap();
        db.import(&[sample_match(1, 2008, "Mumbai Indians", "Deccan Chargers", None)], &[])
            .unwrap();

        assert_eq!(
            db.find_team("mumbai indians").unwrap().as_deref(),
            Some("Mumbai Indians")
        );
        assert_eq!(
            db.find_team("DECCAN CHARGERS").unwrap().as_deref(),
            Some("Deccan Chargers")
        );
        assert_eq!(db.find_team("Gujarat Titans").unwrap(), None);
        assert_eq!(db.get_teams().unwrap().len(), 2);
    }

    #[test]
    fn test_summary_and_innings_totals() {
        let mut db = Database::in_memory().unwrap();
        let matches = vec![
            sample_match(1, 2008, "A", "B", Some("A")),
            sample_match(2, 2010, "B", "C", Some("C")),
        ];
        let deliveries = vec![
            delivery(1, "A", "x", 4),
            delivery(1, "A", "y", 1),
            delivery(1, "B", "z", 0),
            delivery(2, "C", "x", 6),
        ];
        db.import(&matches, &deliveries).unwrap();

        let summary = db.summary().unwrap();
        assert_eq!(summary.total_matches, 2);
        assert_eq!(summary.total_balls, 4);
        assert_eq!(summary.total_seasons, 2);
        assert_eq!(summary.seasons_range(), "2008-2010");
        assert_eq!(summary.unique_players, 3);
        assert_eq!(summary.unique_teams, 3);

        let totals = db.get_innings_totals().unwrap();
        assert_eq!(totals.len(), 3);
        assert_eq!(totals[0].batting_team, "A");
        assert_eq!(totals[0].runs, 5);
        assert_eq!(totals[0].deliveries, 2);
    }

    #[test]
    fn test_innings_totals_skip_super_over() {
        let mut db = Database::in_memory().unwrap();
        let mut super_over = delivery(1, "A", "x", 6);
        super_over.inning = 3;
        let deliveries = vec![delivery(1, "A", "x", 2), delivery(1, "A", "y", 1), super_over];
        db.import(&[sample_match(1, 2008, "A", "B", Some("A"))], &deliveries)
            .unwrap();

        let totals = db.get_innings_totals().unwrap();
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].runs, 3);
        assert_eq!(totals[0].deliveries, 2);
    }
}
