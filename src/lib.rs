//! NBA spread prediction pipeline
//!
//! Collects per-game box scores from the stats API, maintains incremental CSV
//! datasets, and trains gradient-boosted models on home/away team averages.

pub mod data;
pub mod features;
pub mod model;
pub mod table;
pub mod training;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The five box-score breakdowns fetched per game.
///
/// The orchestrator walks these in the order given by [`Category::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Advanced,
    Hustle,
    Misc,
    Track,
    Traditional,
}

impl Category {
    /// Fixed fetch order.
    pub const ALL: [Category; 5] = [
        Category::Advanced,
        Category::Hustle,
        Category::Misc,
        Category::Track,
        Category::Traditional,
    ];

    /// Lowercase name used in artifact filenames and endpoint dispatch.
    pub fn name(&self) -> &'static str {
        match self {
            Category::Advanced => "advanced",
            Category::Hustle => "hustle",
            Category::Misc => "misc",
            Category::Track => "track",
            Category::Traditional => "traditional",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "advanced" => Some(Category::Advanced),
            "hustle" => Some(Category::Hustle),
            "misc" => Some(Category::Misc),
            "track" => Some(Category::Track),
            "traditional" => Some(Category::Traditional),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One merged game: the home and away halves of the league game log joined
/// on (game id, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Game id as the API reports it (zero-padded string, e.g. "0022300062").
    pub game_id: String,
    pub date: NaiveDate,
    pub home_team: String,
    pub home_pts: u32,
    pub away_team: String,
    pub away_pts: u32,
}

impl GameRecord {
    /// Scoring margin, positive when the home team wins. The regression target.
    pub fn spread(&self) -> i32 {
        self.home_pts as i32 - self.away_pts as i32
    }

    /// Game id compared as an integer (membership tests, join keys).
    pub fn game_id_int(&self) -> Result<i64> {
        self.game_id
            .trim()
            .parse()
            .map_err(|_| SpreadError::Parse(format!("bad game id: {:?}", self.game_id)))
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum SpreadError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status} from {url}")]
    Api { status: u16, url: String },

    #[error("malformed response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing column: {0}")]
    MissingColumn(String),

    #[error("column mismatch: {0}")]
    ColumnMismatch(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("fetch interrupted")]
    Interrupted,
}

impl SpreadError {
    /// True for the malformed/empty-body failures the box-score retry loop
    /// is allowed to retry.
    pub fn is_decode(&self) -> bool {
        matches!(self, SpreadError::Decode { .. })
    }
}

pub type Result<T> = std::result::Result<T, SpreadError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub fetch: FetchConfig,
    pub training: TrainingConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Seasons in "YYYY-YY" format, fetched sequentially.
    pub seasons: Vec<String>,
    /// Directory holding per-season CSV artifacts.
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of independently configured models to train.
    pub models: usize,
    /// Games strictly before this date train; the rest are held out.
    pub cutoff_date: String,
    /// Stop boosting after this many rounds without held-out improvement.
    pub early_stopping_rounds: usize,
    /// Seed for hyperparameter draws. Unset means a fresh seed per run.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Merged game log used for modeling (produced externally or by `fetch`).
    pub games_path: String,
    /// Rolling team averages, produced by the external aggregation step.
    pub averages_path: String,
    /// Directory for trained model artifacts.
    pub model_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            fetch: FetchConfig {
                seasons: vec![
                    "2023-24".to_string(),
                    "2022-23".to_string(),
                    "2021-22".to_string(),
                ],
                data_dir: "data".to_string(),
            },
            training: TrainingConfig {
                models: 5,
                cutoff_date: "2024-08-01".to_string(),
                early_stopping_rounds: 50,
                seed: None,
            },
            data: DataConfig {
                games_path: "data/all_games.csv".to_string(),
                averages_path: "data/all_team_averages.csv".to_string(),
                model_dir: "model".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SpreadError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| SpreadError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SpreadError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Cutoff date parsed from config.
    pub fn cutoff(&self) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(&self.training.cutoff_date, "%Y-%m-%d").map_err(|_| {
            SpreadError::Config(format!(
                "cutoff_date must be YYYY-MM-DD, got {:?}",
                self.training.cutoff_date
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spread_sign() {
        let game = GameRecord {
            game_id: "0022300001".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            home_team: "BOS".to_string(),
            home_pts: 100,
            away_team: "NYK".to_string(),
            away_pts: 90,
        };
        assert_eq!(game.spread(), 10);
        assert_eq!(game.game_id_int().unwrap(), 22300001);
    }

    #[test]
    fn test_category_order_and_names() {
        let names: Vec<_> = Category::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec!["advanced", "hustle", "misc", "track", "traditional"]
        );
        assert_eq!(Category::from_name("Track"), Some(Category::Track));
        assert_eq!(Category::from_name("nope"), None);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.fetch.seasons, config.fetch.seasons);
        assert_eq!(parsed.training.models, 5);
        assert!(parsed.cutoff().is_ok());
    }
}
