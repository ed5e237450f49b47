//! Data fetching and storage
//!
//! Stats API client, game-log collection, box-score fetching with retry,
//! and the incremental per-category CSV store.

pub mod box_score;
pub mod client;
pub mod game_log;
pub mod season;
pub mod store;

pub use client::StatsClient;
pub use season::SeasonFetcher;
pub use store::CategoryStore;
