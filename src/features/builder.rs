//! Training matrix assembly
//!
//! Joins rolling team averages against the home and away side of each game,
//! one-hot-encodes team identity, builds home-minus-away difference columns,
//! and splits the result by a date cutoff.

use crate::features::averages::{AveragesTable, TeamAverageRow};
use crate::{GameRecord, Result, SpreadError};
use chrono::NaiveDate;
use ndarray::{Array1, Array2};
use std::collections::{BTreeSet, HashMap};

/// The assembled feature matrix, one row per game, sorted by game id.
#[derive(Debug, Clone)]
pub struct TrainingData {
    pub feature_names: Vec<String>,
    pub game_ids: Vec<i64>,
    pub features: Array2<f64>,
    /// Spread (home points minus away points) in matrix row order.
    pub targets: Array1<f64>,
}

/// Train/test partition of a [`TrainingData`] by game date.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: Array2<f64>,
    pub y_train: Array1<f64>,
    pub train_game_ids: Vec<i64>,
    pub x_test: Array2<f64>,
    pub y_test: Array1<f64>,
    pub test_game_ids: Vec<i64>,
}

/// Build the full training matrix from games with known outcomes and the
/// rolling averages table.
///
/// Averages are joined twice: once matching each row's team to the game's
/// home side, once to the away side. Only games with both perspectives
/// survive. Missing statistic cells count as zero, both in the feature
/// columns and on either side of a difference.
pub fn build_training_data(
    games: &[GameRecord],
    averages: &AveragesTable,
) -> Result<TrainingData> {
    let mut games_by_id: HashMap<i64, &GameRecord> = HashMap::new();
    for game in games {
        games_by_id.insert(game.game_id_int()?, game);
    }

    // Home and away perspective joins on (game id, team code).
    let mut home: HashMap<i64, &TeamAverageRow> = HashMap::new();
    let mut away: HashMap<i64, &TeamAverageRow> = HashMap::new();
    for row in &averages.rows {
        if let Some(game) = games_by_id.get(&row.game_id) {
            if game.home_team == row.team {
                home.insert(row.game_id, row);
            } else if game.away_team == row.team {
                away.insert(row.game_id, row);
            }
        }
    }

    // One-hot vocabulary over every team in the averages table, so home and
    // away columns line up.
    let teams: Vec<String> = averages
        .rows
        .iter()
        .map(|r| r.team.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    // Numeric (non-identity) columns: game_count plus every statistic.
    let mut numeric_names = vec!["game_count".to_string()];
    numeric_names.extend(averages.stat_columns.iter().cloned());

    let mut feature_names = Vec::new();
    for team in &teams {
        feature_names.push(format!("team_{}", team));
    }
    feature_names.extend(numeric_names.iter().cloned());
    for team in &teams {
        feature_names.push(format!("team_{}_away", team));
    }
    feature_names.extend(numeric_names.iter().map(|n| format!("{}_away", n)));
    feature_names.extend(numeric_names.iter().map(|n| format!("diff_{}", n)));

    // Inner join of the two perspectives, ascending by game id.
    let game_ids: Vec<i64> = home
        .keys()
        .filter(|id| away.contains_key(*id))
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let width = feature_names.len();
    let mut flat = Vec::with_capacity(game_ids.len() * width);
    let mut targets = Vec::with_capacity(game_ids.len());

    for id in &game_ids {
        let home_row = &home[id];
        let away_row = &away[id];
        let home_numeric = numeric_values(home_row);
        let away_numeric = numeric_values(away_row);

        flat.extend(one_hot(&teams, &home_row.team));
        flat.extend(home_numeric.iter().map(|v| v.unwrap_or(0.0)));
        flat.extend(one_hot(&teams, &away_row.team));
        flat.extend(away_numeric.iter().map(|v| v.unwrap_or(0.0)));
        flat.extend(
            home_numeric
                .iter()
                .zip(&away_numeric)
                .map(|(h, a)| h.unwrap_or(0.0) - a.unwrap_or(0.0)),
        );

        let game = games_by_id
            .get(id)
            .ok_or_else(|| SpreadError::Parse(format!("no game record for id {}", id)))?;
        targets.push(game.spread() as f64);
    }

    let features = Array2::from_shape_vec((game_ids.len(), width), flat)
        .map_err(|e| SpreadError::Parse(format!("feature matrix shape error: {}", e)))?;

    Ok(TrainingData {
        feature_names,
        game_ids,
        features,
        targets: Array1::from_vec(targets),
    })
}

fn numeric_values(row: &TeamAverageRow) -> Vec<Option<f64>> {
    let mut values = Vec::with_capacity(row.stats.len() + 1);
    values.push(Some(row.game_count as f64));
    values.extend(row.stats.iter().copied());
    values
}

fn one_hot<'a>(teams: &'a [String], team: &'a str) -> impl Iterator<Item = f64> + 'a {
    teams
        .iter()
        .map(move |t| if t.as_str() == team { 1.0 } else { 0.0 })
}

/// Partition rows by game date: strictly before the cutoff trains, on or
/// after the cutoff tests.
pub fn split_by_date(
    data: &TrainingData,
    games: &[GameRecord],
    cutoff: NaiveDate,
) -> Result<TrainTestSplit> {
    let mut dates: HashMap<i64, NaiveDate> = HashMap::new();
    for game in games {
        dates.insert(game.game_id_int()?, game.date);
    }

    let mut train_rows = Vec::new();
    let mut test_rows = Vec::new();
    for (row, id) in data.game_ids.iter().enumerate() {
        let date = dates
            .get(id)
            .ok_or_else(|| SpreadError::Parse(format!("no date for game id {}", id)))?;
        if *date < cutoff {
            train_rows.push(row);
        } else {
            test_rows.push(row);
        }
    }

    let select = |rows: &[usize]| -> (Array2<f64>, Array1<f64>, Vec<i64>) {
        let width = data.features.ncols();
        let mut flat = Vec::with_capacity(rows.len() * width);
        let mut targets = Vec::with_capacity(rows.len());
        let mut ids = Vec::with_capacity(rows.len());
        for &row in rows {
            flat.extend(data.features.row(row).iter().copied());
            targets.push(data.targets[row]);
            ids.push(data.game_ids[row]);
        }
        let features = Array2::from_shape_vec((rows.len(), width), flat)
            .expect("row selection preserves width");
        (features, Array1::from_vec(targets), ids)
    };

    let (x_train, y_train, train_game_ids) = select(&train_rows);
    let (x_test, y_test, test_game_ids) = select(&test_rows);

    Ok(TrainTestSplit {
        x_train,
        y_train,
        train_game_ids,
        x_test,
        y_test,
        test_game_ids,
    })
}
