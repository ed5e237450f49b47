//! Incremental category datasets
//!
//! One CSV artifact per (season, category). Fetch runs only ever append rows
//! for game ids the artifact does not already hold; the merged result is
//! rewritten in full.

use crate::table::StatTable;
use crate::{Category, Result};
use std::path::{Path, PathBuf};

/// Storage for one season's five category datasets.
pub struct CategoryStore {
    dir: PathBuf,
    season: String,
}

impl CategoryStore {
    pub fn new<P: AsRef<Path>>(dir: P, season: &str) -> Self {
        CategoryStore {
            dir: dir.as_ref().to_path_buf(),
            season: season.to_string(),
        }
    }

    pub fn season(&self) -> &str {
        &self.season
    }

    /// Artifact path: `{season}_{category}_stats.csv`.
    pub fn path(&self, category: Category) -> PathBuf {
        self.dir
            .join(format!("{}_{}_stats.csv", self.season, category.name()))
    }

    /// Load the saved dataset for a category. Absent or unreadable files are
    /// treated as an empty dataset.
    pub fn load(&self, category: Category) -> StatTable {
        let path = self.path(category);
        match StatTable::read_csv(&path) {
            Ok(table) => table,
            Err(err) => {
                if path.exists() {
                    log::warn!(
                        "could not read {}, starting empty: {}",
                        path.display(),
                        err
                    );
                }
                StatTable::default()
            }
        }
    }

    /// Persist the full dataset for a category, overwriting the artifact.
    pub fn save(&self, category: Category, table: &StatTable) -> Result<()> {
        table.write_csv(self.path(category))
    }
}

/// Whether a game id is already present in a stored dataset.
///
/// An empty dataset holds nothing. Game ids are compared as integers, so a
/// zero-padded id matches its unpadded form.
pub fn data_exists(existing: &StatTable, game_id: i64) -> bool {
    if existing.is_empty() {
        return false;
    }
    match existing.game_ids() {
        Ok(ids) => ids.contains(&game_id),
        Err(_) => false,
    }
}

/// Merge newly fetched batches into an existing dataset.
///
/// Existing rows come first, then the new batches in fetch order. An empty
/// batch list leaves the existing dataset unchanged; an empty existing
/// dataset becomes the concatenation of the batches.
pub fn merge(existing: StatTable, new_batches: Vec<StatTable>) -> Result<StatTable> {
    let mut merged = existing;
    for batch in new_batches {
        merged.append(batch)?;
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::GAME_ID_COLUMN;

    fn team_rows(game_id: &str, teams: &[&str]) -> StatTable {
        let mut table = StatTable::new(vec![
            GAME_ID_COLUMN.to_string(),
            "teamTricode".to_string(),
            "pace".to_string(),
        ]);
        for team in teams {
            table
                .push_row(vec![
                    game_id.to_string(),
                    team.to_string(),
                    "100.0".to_string(),
                ])
                .unwrap();
        }
        table
    }

    #[test]
    fn test_data_exists_false_on_empty() {
        assert!(!data_exists(&StatTable::default(), 22300001));
    }

    #[test]
    fn test_data_exists_integer_comparison() {
        let table = team_rows("0022300001", &["BOS", "NYK"]);
        assert!(data_exists(&table, 22300001));
        assert!(!data_exists(&table, 22300002));
    }

    #[test]
    fn test_merge_existing_then_new_in_fetch_order() {
        let existing = team_rows("0022300001", &["BOS", "NYK"]);
        let batches = vec![
            team_rows("0022300002", &["PHI", "MIA"]),
            team_rows("0022300003", &["LAL", "DEN"]),
        ];
        let merged = merge(existing, batches).unwrap();
        assert_eq!(merged.len(), 6);
        let ids = merged.game_ids().unwrap();
        assert_eq!(
            ids,
            vec![22300001, 22300001, 22300002, 22300002, 22300003, 22300003]
        );
    }

    #[test]
    fn test_merge_empty_batches_keeps_existing() {
        let existing = team_rows("0022300001", &["BOS", "NYK"]);
        let merged = merge(existing.clone(), Vec::new()).unwrap();
        assert_eq!(merged, existing);
    }

    #[test]
    fn test_merge_into_empty_existing() {
        let merged = merge(
            StatTable::default(),
            vec![team_rows("0022300002", &["PHI", "MIA"])],
        )
        .unwrap();
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_merge_is_idempotent_against_membership() {
        // A second run against the merged output fetches nothing new, so the
        // batch list is empty and no duplicate game ids appear.
        let existing = team_rows("0022300001", &["BOS", "NYK"]);
        let merged = merge(existing, vec![team_rows("0022300002", &["PHI", "MIA"])]).unwrap();

        let new_batches: Vec<StatTable> = [22300001, 22300002]
            .iter()
            .filter(|id| !data_exists(&merged, **id))
            .map(|_| unreachable!("both game ids are already present"))
            .collect();
        let remerged = merge(merged.clone(), new_batches).unwrap();
        assert_eq!(remerged, merged);
    }

    #[test]
    fn test_store_load_missing_is_empty_and_roundtrip() {
        let dir = std::env::temp_dir().join(format!("hoops-store-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let store = CategoryStore::new(&dir, "2023-24");

        assert!(store.load(Category::Advanced).is_empty());

        let table = team_rows("0022300001", &["BOS", "NYK"]);
        store.save(Category::Advanced, &table).unwrap();
        assert!(store
            .path(Category::Advanced)
            .to_string_lossy()
            .ends_with("2023-24_advanced_stats.csv"));

        let loaded = store.load(Category::Advanced);
        assert_eq!(loaded, table);

        std::fs::remove_dir_all(&dir).ok();
    }
}
