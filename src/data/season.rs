//! Season fetch orchestration
//!
//! Walks every game of a season across the five box-score categories,
//! buffering newly fetched rows in memory. Buffers are flushed to the
//! category store on every exit path: normal completion, interruption,
//! and unexpected failure.

use crate::data::box_score::fetch_box_score;
use crate::data::client::StatsClient;
use crate::data::store::{data_exists, merge, CategoryStore};
use crate::table::StatTable;
use crate::{Category, GameRecord, Result, SpreadError};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Progress is reported every this many games.
const PROGRESS_INTERVAL: usize = 10;

/// Per-category fetch state: what the artifact already holds plus the rows
/// buffered by this run.
struct CategoryBuffer {
    existing: StatTable,
    pending: Vec<StatTable>,
}

/// Drives the skip-or-fetch loop for one season.
pub struct SeasonFetcher<'a> {
    client: &'a StatsClient,
    store: CategoryStore,
    interrupt: Arc<AtomicBool>,
}

impl<'a> SeasonFetcher<'a> {
    pub fn new(client: &'a StatsClient, store: CategoryStore, interrupt: Arc<AtomicBool>) -> Self {
        SeasonFetcher {
            client,
            store,
            interrupt,
        }
    }

    /// Fetch box scores for every game not yet present in each category
    /// dataset, then flush. The flush also runs when the loop is interrupted
    /// or fails, so no buffered rows are lost.
    pub fn fetch_season(&self, games: &[GameRecord]) -> Result<()> {
        let mut state: BTreeMap<Category, CategoryBuffer> = Category::ALL
            .iter()
            .map(|&category| {
                (
                    category,
                    CategoryBuffer {
                        existing: self.store.load(category),
                        pending: Vec::new(),
                    },
                )
            })
            .collect();

        let run_result = self.run(games, &mut state);

        // Single cleanup point for every exit path.
        if let Err(flush_err) = self.flush(&mut state) {
            match run_result {
                Ok(()) => return Err(flush_err),
                Err(_) => log::error!(
                    "flush after failed run also failed for season {}: {}",
                    self.store.season(),
                    flush_err
                ),
            }
        }
        run_result
    }

    fn run(
        &self,
        games: &[GameRecord],
        state: &mut BTreeMap<Category, CategoryBuffer>,
    ) -> Result<()> {
        for (i, game) in games.iter().enumerate() {
            if self.interrupt.load(Ordering::SeqCst) {
                log::info!("interrupt received, flushing buffered results");
                return Err(SpreadError::Interrupted);
            }

            let game_id_int = game.game_id_int()?;
            'categories: for category in Category::ALL {
                let buffer = state
                    .get_mut(&category)
                    .ok_or_else(|| SpreadError::Parse(format!("no buffer for {}", category)))?;
                if data_exists(&buffer.existing, game_id_int) {
                    continue;
                }

                match fetch_box_score(self.client, &game.game_id, category) {
                    Ok(table) => buffer.pending.push(table),
                    Err(err) if err.is_decode() => {
                        // Retries exhausted; this game stays absent and will
                        // be picked up by a future run.
                        log::warn!(
                            "skipping game {} after decode failures in {}: {}",
                            game.game_id,
                            category,
                            err
                        );
                        break 'categories;
                    }
                    Err(err) => return Err(err),
                }
            }

            if (i + 1) % PROGRESS_INTERVAL == 0 {
                log::info!(
                    "season {}: processed {}/{} games",
                    self.store.season(),
                    i + 1,
                    games.len()
                );
            }
        }
        Ok(())
    }

    /// Merge each category's pending batches into its dataset and persist.
    fn flush(&self, state: &mut BTreeMap<Category, CategoryBuffer>) -> Result<()> {
        for (&category, buffer) in state.iter_mut() {
            let existing = std::mem::take(&mut buffer.existing);
            let pending = std::mem::take(&mut buffer.pending);
            if existing.is_empty() && pending.is_empty() {
                continue;
            }

            let fetched = pending.len();
            let merged = merge(existing, pending)?;
            self.store.save(category, &merged)?;
            // Keeps a repeated flush consistent with what is on disk.
            buffer.existing = merged;

            if fetched > 0 {
                log::info!(
                    "season {}: saved {} ({} new games, {} rows total)",
                    self.store.season(),
                    category,
                    fetched,
                    buffer.existing.len()
                );
            }
        }
        Ok(())
    }
}
