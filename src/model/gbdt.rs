//! Gradient-boosted spread regression
//!
//! Residual boosting over depth-limited regression trees with a mean base
//! score. The held-out set is scored every round; boosting stops once the
//! held-out RMSE has not improved for a configured window, and the model is
//! truncated to its best round.

use crate::model::tree::{RegressionTree, TreeParams};
use crate::training::metrics::{rmse, BoostHistory, RegressionMetrics};
use crate::{Result, SpreadError};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Boosting hyperparameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GbdtParams {
    pub max_depth: usize,
    pub learning_rate: f64,
    pub n_estimators: usize,
    /// L1 regularization on leaf outputs.
    pub alpha: f64,
    /// Stop after this many rounds without held-out improvement.
    pub early_stopping_rounds: usize,
    pub min_samples_leaf: usize,
}

impl Default for GbdtParams {
    fn default() -> Self {
        GbdtParams {
            max_depth: 6,
            learning_rate: 0.01,
            n_estimators: 1000,
            alpha: 0.01,
            early_stopping_rounds: 50,
            min_samples_leaf: 5,
        }
    }
}

/// A fitted boosted ensemble.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpreadModel {
    params: GbdtParams,
    base_score: f64,
    trees: Vec<RegressionTree>,
    best_iteration: usize,
    best_rmse: f64,
}

impl SpreadModel {
    /// Fit against the training rows, using the held-out rows for early
    /// stopping.
    pub fn fit(
        params: GbdtParams,
        x_train: &Array2<f64>,
        y_train: &Array1<f64>,
        x_eval: &Array2<f64>,
        y_eval: &Array1<f64>,
    ) -> Result<Self> {
        if x_train.nrows() == 0 {
            return Err(SpreadError::Config("no training rows".to_string()));
        }
        if x_eval.nrows() == 0 {
            return Err(SpreadError::Config(
                "held-out evaluation set is empty".to_string(),
            ));
        }

        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_leaf: params.min_samples_leaf,
            alpha: params.alpha,
        };

        let base_score = y_train.mean().unwrap_or(0.0);
        let mut preds_train = vec![base_score; x_train.nrows()];
        let mut preds_eval = vec![base_score; x_eval.nrows()];
        let truth_eval: Vec<f64> = y_eval.iter().copied().collect();

        let mut trees: Vec<RegressionTree> = Vec::new();
        let mut history = BoostHistory::new();

        for round in 0..params.n_estimators {
            let residuals: Vec<f64> = y_train
                .iter()
                .zip(&preds_train)
                .map(|(y, p)| y - p)
                .collect();

            let tree = RegressionTree::fit(x_train, &residuals, &tree_params);
            for (i, pred) in preds_train.iter_mut().enumerate() {
                *pred += params.learning_rate * tree.predict_row(x_train.row(i));
            }
            for (i, pred) in preds_eval.iter_mut().enumerate() {
                *pred += params.learning_rate * tree.predict_row(x_eval.row(i));
            }
            trees.push(tree);

            let eval_rmse = rmse(&truth_eval, &preds_eval);
            history.record(round, eval_rmse);

            if history.should_early_stop(params.early_stopping_rounds) {
                log::debug!(
                    "early stop at round {} (best round {}, rmse {:.4})",
                    round,
                    history.best_round,
                    history.best_rmse
                );
                break;
            }
        }

        trees.truncate(history.best_round + 1);

        Ok(SpreadModel {
            params,
            base_score,
            trees,
            best_iteration: history.best_round,
            best_rmse: history.best_rmse,
        })
    }

    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let boost: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
        self.base_score + self.params.learning_rate * boost
    }

    pub fn predict(&self, x: &Array2<f64>) -> Array1<f64> {
        (0..x.nrows()).map(|i| self.predict_row(x.row(i))).collect()
    }

    pub fn evaluate(&self, x: &Array2<f64>, y: &Array1<f64>) -> RegressionMetrics {
        let preds = self.predict(x);
        let truth: Vec<f64> = y.iter().copied().collect();
        RegressionMetrics::compute(&truth, &preds.to_vec())
    }

    pub fn params(&self) -> &GbdtParams {
        &self.params
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn best_iteration(&self) -> usize {
        self.best_iteration
    }

    pub fn best_rmse(&self) -> f64 {
        self.best_rmse
    }

    /// Persist the model as JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path.as_ref())?;
        serde_json::to_writer(std::io::BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let model = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn linear_fixture() -> (Array2<f64>, Array1<f64>, Array2<f64>, Array1<f64>) {
        // y = 3x, train on a grid, hold out interior points.
        let x_train = array![
            [0.0],
            [1.0],
            [2.0],
            [3.0],
            [4.0],
            [5.0],
            [6.0],
            [7.0],
            [8.0],
            [9.0]
        ];
        let y_train = x_train.column(0).mapv(|v| 3.0 * v);
        let x_eval = array![[1.5], [4.5], [7.5]];
        let y_eval = x_eval.column(0).mapv(|v| 3.0 * v);
        (x_train, y_train, x_eval, y_eval)
    }

    fn quick_params() -> GbdtParams {
        GbdtParams {
            max_depth: 3,
            learning_rate: 0.3,
            n_estimators: 100,
            alpha: 0.0,
            early_stopping_rounds: 20,
            min_samples_leaf: 1,
        }
    }

    #[test]
    fn test_fit_beats_base_score() {
        let (x_train, y_train, x_eval, y_eval) = linear_fixture();
        let model = SpreadModel::fit(quick_params(), &x_train, &y_train, &x_eval, &y_eval).unwrap();

        let base_rmse = rmse(
            &y_eval.to_vec(),
            &vec![y_train.mean().unwrap(); y_eval.len()],
        );
        let metrics = model.evaluate(&x_eval, &y_eval);
        assert!(
            metrics.rmse < base_rmse / 2.0,
            "boosting should sharply reduce eval rmse: {} vs {}",
            metrics.rmse,
            base_rmse
        );
    }

    #[test]
    fn test_trees_truncated_to_best_round() {
        let (x_train, y_train, x_eval, y_eval) = linear_fixture();
        let model = SpreadModel::fit(quick_params(), &x_train, &y_train, &x_eval, &y_eval).unwrap();
        assert_eq!(model.n_trees(), model.best_iteration() + 1);
        assert!(model.n_trees() <= 100);
    }

    #[test]
    fn test_empty_eval_set_is_rejected() {
        let (x_train, y_train, _, _) = linear_fixture();
        let x_eval = Array2::<f64>::zeros((0, 1));
        let y_eval = Array1::<f64>::zeros(0);
        assert!(SpreadModel::fit(quick_params(), &x_train, &y_train, &x_eval, &y_eval).is_err());
    }

    #[test]
    fn test_save_load_roundtrip_preserves_predictions() {
        let dir = std::env::temp_dir().join(format!("hoops-model-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("spread_model_1.json");

        let (x_train, y_train, x_eval, y_eval) = linear_fixture();
        let model = SpreadModel::fit(quick_params(), &x_train, &y_train, &x_eval, &y_eval).unwrap();
        model.save(&path).unwrap();
        let loaded = SpreadModel::load(&path).unwrap();

        let before = model.predict(&x_eval);
        let after = loaded.predict(&x_eval);
        assert_eq!(before, after);

        std::fs::remove_dir_all(&dir).ok();
    }
}
