//! Stats API client
//!
//! Thin blocking client over the league stats endpoints. Every endpoint
//! returns tabular JSON result sets (`resultSets: [{name, headers, rowSet}]`)
//! which are lifted into [`StatTable`]s.

use crate::table::StatTable;
use crate::{Category, Result, SpreadError};
use serde::Deserialize;

const BASE_URL: &str = "https://stats.nba.com/stats";

/// Result set holding the per-team rows of a box score.
const TEAM_STATS_SET: &str = "TeamStats";
/// Result set holding the league game log.
const GAME_LOG_SET: &str = "LeagueGameLog";

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(rename = "resultSets", default)]
    result_sets: Vec<ResultSet>,
}

#[derive(Debug, Deserialize)]
struct ResultSet {
    name: String,
    headers: Vec<String>,
    #[serde(rename = "rowSet")]
    row_set: Vec<Vec<serde_json::Value>>,
}

/// Blocking client for the stats API.
pub struct StatsClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl Default for StatsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsClient {
    pub fn new() -> Self {
        let client = reqwest::blocking::Client::builder()
            .user_agent("hoops/0.1")
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        StatsClient {
            client,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Point the client at a different base URL (local fixtures, proxies).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// League game log for one season and season type ("Regular Season" or
    /// "Playoffs"). No retry here; callers needing resilience wrap this.
    pub fn league_game_log(&self, season: &str, season_type: &str) -> Result<StatTable> {
        let params = [
            ("Counter", "0".to_string()),
            ("Direction", "ASC".to_string()),
            ("LeagueID", "00".to_string()),
            ("PlayerOrTeam", "T".to_string()),
            ("Season", season.to_string()),
            ("SeasonType", season_type.to_string()),
            ("Sorter", "DATE".to_string()),
        ];
        self.fetch_result_set("leaguegamelog", &params, GAME_LOG_SET)
    }

    /// Team-level box score rows for one game and category.
    ///
    /// The advanced/traditional/misc endpoints take the whole-game structural
    /// parameters (all period/range fields zero); hustle and track take only
    /// the game id.
    pub fn box_score(&self, game_id: &str, category: Category) -> Result<StatTable> {
        let endpoint = match category {
            Category::Advanced => "boxscoreadvancedv3",
            Category::Traditional => "boxscoretraditionalv3",
            Category::Misc => "boxscoremiscv3",
            Category::Hustle => "boxscorehustlev2",
            Category::Track => "boxscoreplayertrackv3",
        };

        match category {
            Category::Advanced | Category::Traditional | Category::Misc => {
                let params = [
                    ("EndPeriod", "0".to_string()),
                    ("EndRange", "0".to_string()),
                    ("GameID", game_id.to_string()),
                    ("RangeType", "0".to_string()),
                    ("StartPeriod", "0".to_string()),
                    ("StartRange", "0".to_string()),
                ];
                self.fetch_result_set(endpoint, &params, TEAM_STATS_SET)
            }
            Category::Hustle | Category::Track => {
                let params = [("GameID", game_id.to_string())];
                self.fetch_result_set(endpoint, &params, TEAM_STATS_SET)
            }
        }
    }

    /// GET an endpoint and extract one named result set as a table.
    fn fetch_result_set(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        set_name: &str,
    ) -> Result<StatTable> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self.client.get(&url).query(params).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpreadError::Api {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text()?;
        let parsed: ApiResponse =
            serde_json::from_str(&body).map_err(|e| SpreadError::Decode {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;

        let set = parsed
            .result_sets
            .into_iter()
            .find(|s| s.name == set_name)
            .ok_or_else(|| SpreadError::Decode {
                endpoint: endpoint.to_string(),
                message: format!("result set {:?} not present", set_name),
            })?;

        let mut table = StatTable::new(set.headers);
        for row in set.row_set {
            table.push_row(row.iter().map(render_value).collect())?;
        }
        Ok(table)
    }
}

/// Render a JSON cell the way it should appear in CSV.
fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_value() {
        assert_eq!(render_value(&serde_json::json!("BOS")), "BOS");
        assert_eq!(render_value(&serde_json::json!(98.5)), "98.5");
        assert_eq!(render_value(&serde_json::json!(12)), "12");
        assert_eq!(render_value(&serde_json::Value::Null), "");
    }

    #[test]
    fn test_result_set_extraction() {
        let body = serde_json::json!({
            "resultSets": [
                {
                    "name": "TeamStats",
                    "headers": ["gameId", "teamTricode", "pace"],
                    "rowSet": [["0022300001", "BOS", 98.5]]
                }
            ]
        })
        .to_string();

        let parsed: ApiResponse = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed.result_sets.len(), 1);
        assert_eq!(parsed.result_sets[0].headers.len(), 3);
        assert_eq!(parsed.result_sets[0].row_set[0].len(), 3);
    }
}
