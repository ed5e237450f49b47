//! Feature engineering
//!
//! Turns the game log and rolling team averages into the model-ready matrix.

pub mod averages;
pub mod builder;

pub use averages::{load_averages, AveragesTable, TeamAverageRow, MIN_GAME_COUNT};
pub use builder::{build_training_data, split_by_date, TrainTestSplit, TrainingData};
