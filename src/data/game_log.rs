//! Season game-log collection
//!
//! Fetches the regular-season and playoff game logs for a season and merges
//! the home and away halves of each game into one [`GameRecord`].

use crate::data::client::StatsClient;
use crate::table::StatTable;
use crate::{GameRecord, Result, SpreadError};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Collect and process every game of a season (regular season plus playoffs).
///
/// Remote failures propagate; there is no retry at this layer.
pub fn collect_season_games(client: &StatsClient, season: &str) -> Result<Vec<GameRecord>> {
    let mut logs = client.league_game_log(season, "Regular Season")?;
    let playoffs = client.league_game_log(season, "Playoffs")?;
    logs.append(playoffs)?;

    process_game_logs(&logs, chrono::Local::now().date_naive())
}

/// Merge raw per-team log rows into one record per game.
///
/// Rows dated `today` are dropped as possibly incomplete, duplicates on
/// (game id, team id) are removed, and the home half (" vs. " matchup) is
/// inner-joined to the away half (" @ " matchup) on (game id, date).
pub fn process_game_logs(logs: &StatTable, today: NaiveDate) -> Result<Vec<GameRecord>> {
    let game_id_idx = require_column(logs, "GAME_ID")?;
    let team_id_idx = require_column(logs, "TEAM_ID")?;
    let team_idx = require_column(logs, "TEAM_ABBREVIATION")?;
    let date_idx = require_column(logs, "GAME_DATE")?;
    let matchup_idx = require_column(logs, "MATCHUP")?;
    let pts_idx = require_column(logs, "PTS")?;

    struct Half {
        team: String,
        pts: u32,
    }

    let mut seen: HashSet<(String, String)> = HashSet::new();
    // Home halves in fetch order; away halves keyed for the join.
    let mut home: Vec<(String, NaiveDate, Half)> = Vec::new();
    let mut away: HashMap<(String, NaiveDate), Half> = HashMap::new();

    for row in logs.rows() {
        let game_id = row[game_id_idx].trim().to_string();
        let date = parse_date(&row[date_idx])?;
        if date == today {
            continue;
        }
        if !seen.insert((game_id.clone(), row[team_id_idx].trim().to_string())) {
            continue;
        }

        let half = Half {
            team: row[team_idx].trim().to_string(),
            pts: parse_points(&row[pts_idx])?,
        };
        let matchup = &row[matchup_idx];
        if matchup.contains(" vs. ") {
            home.push((game_id, date, half));
        } else if matchup.contains(" @ ") {
            away.insert((game_id, date), half);
        }
    }

    let mut games = Vec::with_capacity(home.len());
    for (game_id, date, home_half) in home {
        if let Some(away_half) = away.remove(&(game_id.clone(), date)) {
            games.push(GameRecord {
                game_id,
                date,
                home_team: home_half.team,
                home_pts: home_half.pts,
                away_team: away_half.team,
                away_pts: away_half.pts,
            });
        }
    }
    Ok(games)
}

fn require_column(table: &StatTable, name: &str) -> Result<usize> {
    table
        .column_index(name)
        .ok_or_else(|| SpreadError::MissingColumn(name.to_string()))
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| SpreadError::Parse(format!("bad game date: {:?}", value)))
}

fn parse_points(value: &str) -> Result<u32> {
    value
        .trim()
        .parse::<f64>()
        .map(|p| p.round() as u32)
        .map_err(|_| SpreadError::Parse(format!("bad points value: {:?}", value)))
}

const GAMES_HEADER: [&str; 7] = [
    "",
    "gameId",
    "date",
    "homeTeam",
    "homePts",
    "awayTeam",
    "awayPts",
];

/// Write the processed game log with a leading index column.
pub fn save_games<P: AsRef<Path>>(path: P, games: &[GameRecord]) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    writer.write_record(GAMES_HEADER)?;
    for (i, game) in games.iter().enumerate() {
        writer.write_record([
            i.to_string(),
            game.game_id.clone(),
            game.date.format("%Y-%m-%d").to_string(),
            game.home_team.clone(),
            game.home_pts.to_string(),
            game.away_team.clone(),
            game.away_pts.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a processed game log written by [`save_games`] (or the externally
/// produced `all_games.csv`, which shares the layout).
pub fn load_games<P: AsRef<Path>>(path: P) -> Result<Vec<GameRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path.as_ref())?;
    let headers = reader.headers()?.clone();
    let find = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| SpreadError::MissingColumn(name.to_string()))
    };
    let game_id_idx = find("gameId")?;
    let date_idx = find("date")?;
    let home_team_idx = find("homeTeam")?;
    let home_pts_idx = find("homePts")?;
    let away_team_idx = find("awayTeam")?;
    let away_pts_idx = find("awayPts")?;

    let mut games = Vec::new();
    for record in reader.records() {
        let record = record?;
        games.push(GameRecord {
            game_id: record[game_id_idx].trim().to_string(),
            date: parse_date(&record[date_idx])?,
            home_team: record[home_team_idx].trim().to_string(),
            home_pts: parse_points(&record[home_pts_idx])?,
            away_team: record[away_team_idx].trim().to_string(),
            away_pts: parse_points(&record[away_pts_idx])?,
        });
    }
    Ok(games)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG_COLUMNS: [&str; 6] = [
        "GAME_ID",
        "TEAM_ID",
        "TEAM_ABBREVIATION",
        "GAME_DATE",
        "MATCHUP",
        "PTS",
    ];

    fn log_table(rows: &[[&str; 6]]) -> StatTable {
        let mut table = StatTable::new(LOG_COLUMNS.iter().map(|c| c.to_string()).collect());
        for row in rows {
            table
                .push_row(row.iter().map(|v| v.to_string()).collect())
                .unwrap();
        }
        table
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_home_away_merge() {
        let table = log_table(&[
            ["0022300001", "1", "BOS", "2024-01-05", "BOS vs. NYK", "112"],
            ["0022300001", "2", "NYK", "2024-01-05", "NYK @ BOS", "104"],
        ]);
        let games = process_game_logs(&table, today()).unwrap();
        assert_eq!(games.len(), 1);
        let game = &games[0];
        assert_eq!(game.home_team, "BOS");
        assert_eq!(game.away_team, "NYK");
        assert_eq!(game.spread(), 8);
    }

    #[test]
    fn test_no_duplicate_games_after_merge() {
        // Duplicate (game id, team id) rows collapse to one merged record.
        let table = log_table(&[
            ["0022300001", "1", "BOS", "2024-01-05", "BOS vs. NYK", "112"],
            ["0022300001", "1", "BOS", "2024-01-05", "BOS vs. NYK", "112"],
            ["0022300001", "2", "NYK", "2024-01-05", "NYK @ BOS", "104"],
        ]);
        let games = process_game_logs(&table, today()).unwrap();
        assert_eq!(games.len(), 1);
    }

    #[test]
    fn test_rows_dated_today_are_dropped() {
        let table = log_table(&[
            ["0022300009", "1", "BOS", "2024-03-01", "BOS vs. NYK", "50"],
            ["0022300009", "2", "NYK", "2024-03-01", "NYK @ BOS", "48"],
            ["0022300001", "1", "BOS", "2024-01-05", "BOS vs. NYK", "112"],
            ["0022300001", "2", "NYK", "2024-01-05", "NYK @ BOS", "104"],
        ]);
        let games = process_game_logs(&table, today()).unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].game_id, "0022300001");
    }

    #[test]
    fn test_unpaired_half_is_excluded() {
        // Home row with no matching away row: inner join drops it.
        let table = log_table(&[[
            "0022300002", "1", "BOS", "2024-01-06", "BOS vs. PHI", "99",
        ]]);
        let games = process_game_logs(&table, today()).unwrap();
        assert!(games.is_empty());
    }

    #[test]
    fn test_games_csv_roundtrip() {
        let dir = std::env::temp_dir().join(format!("hoops-games-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("games.csv");

        let games = vec![GameRecord {
            game_id: "0022300001".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            home_team: "BOS".to_string(),
            home_pts: 112,
            away_team: "NYK".to_string(),
            away_pts: 104,
        }];
        save_games(&path, &games).unwrap();
        let loaded = load_games(&path).unwrap();
        assert_eq!(loaded, games);

        std::fs::remove_dir_all(&dir).ok();
    }
}
