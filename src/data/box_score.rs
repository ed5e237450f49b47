//! Box-score fetching with bounded retry
//!
//! The stats API intermittently returns malformed or empty bodies. Those
//! decode failures are retried on a short fixed backoff; anything else
//! propagates immediately.

use crate::data::client::StatsClient;
use crate::table::StatTable;
use crate::{Category, Result};
use std::time::Duration;

/// Total attempts before a decode failure becomes terminal.
const MAX_ATTEMPTS: usize = 10;
/// Fixed pause between attempts.
const RETRY_DELAY: Duration = Duration::from_millis(100);

/// Fetch the team-level box score for one game and category, retrying
/// decode failures up to [`MAX_ATTEMPTS`] times.
pub fn fetch_box_score(
    client: &StatsClient,
    game_id: &str,
    category: Category,
) -> Result<StatTable> {
    let label = format!("{} box score for game {}", category, game_id);
    with_retry(&label, || client.box_score(game_id, category))
}

/// Run `op`, retrying only decode failures. The final attempt's error is
/// returned once the bound is exhausted.
pub fn with_retry<T, F>(label: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => {
                if attempt > 1 {
                    log::debug!("{} succeeded on attempt {}", label, attempt);
                }
                return Ok(value);
            }
            Err(err) if err.is_decode() => {
                if attempt >= MAX_ATTEMPTS {
                    log::warn!("{} failed after {} attempts: {}", label, attempt, err);
                    return Err(err);
                }
                log::warn!(
                    "{}: malformed response (attempt {}/{}), retrying",
                    label,
                    attempt,
                    MAX_ATTEMPTS
                );
                std::thread::sleep(RETRY_DELAY);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
