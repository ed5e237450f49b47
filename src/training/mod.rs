//! Model training
//!
//! Hyperparameter sampling, the multi-model training loop, and regression
//! metrics.

pub mod metrics;
pub mod trainer;

pub use metrics::{BoostHistory, RegressionMetrics};
pub use trainer::{sample_params, train_models, ModelReport};
