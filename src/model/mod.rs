//! Boosted regression model
//!
//! Weak-learner trees and the boosted ensemble the trainer fits and
//! persists.

pub mod gbdt;
pub mod tree;

pub use gbdt::{GbdtParams, SpreadModel};
pub use tree::RegressionTree;
