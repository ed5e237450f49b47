//! Rolling team averages input
//!
//! `all_team_averages.csv` is produced by an external aggregation step and
//! only read here. Early-season rows (low game counts) are noisy and are
//! excluded before modeling.

use crate::{Result, SpreadError};
use std::path::Path;

/// Rows below this game count are excluded from modeling.
pub const MIN_GAME_COUNT: u32 = 10;

/// Columns that are not statistics.
const RESERVED: [&str; 5] = ["gameId", "teamTricode", "date", "game_count", "playoff"];

/// One team's rolling averages as of one game.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamAverageRow {
    pub game_id: i64,
    pub team: String,
    pub game_count: u32,
    pub playoff: bool,
    /// Values aligned with [`AveragesTable::stat_columns`]. `None` marks a
    /// missing cell.
    pub stats: Vec<Option<f64>>,
}

/// The full averages dataset with its statistic column names.
#[derive(Debug, Clone, Default)]
pub struct AveragesTable {
    pub stat_columns: Vec<String>,
    pub rows: Vec<TeamAverageRow>,
}

/// Load the averages CSV, dropping the date column and rows with
/// `game_count < min_game_count`.
pub fn load_averages<P: AsRef<Path>>(path: P, min_game_count: u32) -> Result<AveragesTable> {
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
    let team_idx = find("teamTricode")?;
    let game_count_idx = find("game_count")?;
    let playoff_idx = find("playoff")?;

    // Everything that is neither reserved nor the leading index column is a
    // statistic.
    let stat_indices: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(i, h)| *i > 0 && !h.is_empty() && !RESERVED.contains(h))
        .map(|(i, _)| i)
        .collect();
    let stat_columns: Vec<String> = stat_indices
        .iter()
        .map(|&i| headers[i].to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let game_count: u32 = record[game_count_idx]
            .trim()
            .parse::<f64>()
            .map(|c| c.round() as u32)
            .map_err(|_| {
                SpreadError::Parse(format!("bad game_count: {:?}", &record[game_count_idx]))
            })?;
        if game_count < min_game_count {
            continue;
        }

        let game_id: i64 = record[game_id_idx].trim().parse().map_err(|_| {
            SpreadError::Parse(format!("bad game id: {:?}", &record[game_id_idx]))
        })?;

        let stats = stat_indices
            .iter()
            .map(|&i| parse_stat(&record[i]))
            .collect::<Result<Vec<_>>>()?;

        rows.push(TeamAverageRow {
            game_id,
            team: record[team_idx].trim().to_string(),
            game_count,
            playoff: parse_flag(&record[playoff_idx]),
            stats,
        });
    }

    Ok(AveragesTable { stat_columns, rows })
}

fn parse_stat(value: &str) -> Result<Option<f64>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|_| SpreadError::Parse(format!("bad stat value: {:?}", value)))
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "1.0")
}
