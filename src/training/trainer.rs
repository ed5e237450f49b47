//! Spread model training
//!
//! Fits N independently configured boosted models against the same
//! train/test split and persists every one of them, numbered 1..N. There is
//! no model-selection step; picking among the artifacts is left to the
//! consumer.

use crate::features::TrainTestSplit;
use crate::model::{GbdtParams, SpreadModel};
use crate::training::metrics::RegressionMetrics;
use crate::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};

/// Outcome of one model's training run.
#[derive(Debug, Clone)]
pub struct ModelReport {
    pub index: usize,
    pub params: GbdtParams,
    pub best_iteration: usize,
    pub train: RegressionMetrics,
    pub test: RegressionMetrics,
    pub path: PathBuf,
}

/// Draw one model's hyperparameters from the fixed search ranges.
pub fn sample_params<R: Rng>(rng: &mut R, early_stopping_rounds: usize) -> GbdtParams {
    GbdtParams {
        max_depth: rng.gen_range(4..=10),
        learning_rate: rng.gen_range(5..20) as f64 / 1000.0,
        n_estimators: rng.gen_range(700..=1500),
        alpha: rng.gen_range(5..20) as f64 / 1000.0,
        early_stopping_rounds,
        min_samples_leaf: 5,
    }
}

/// Train `n` models and persist each as `spread_model_{i}.json` under
/// `model_dir`.
pub fn train_models(
    split: &TrainTestSplit,
    n: usize,
    model_dir: &Path,
    early_stopping_rounds: usize,
    seed: Option<u64>,
) -> Result<Vec<ModelReport>> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut reports = Vec::with_capacity(n);
    for index in 1..=n {
        log::info!("training model {}/{}", index, n);
        let params = sample_params(&mut rng, early_stopping_rounds);
        log::debug!(
            "model {}: depth={} lr={} estimators={} alpha={}",
            index,
            params.max_depth,
            params.learning_rate,
            params.n_estimators,
            params.alpha
        );

        let model = SpreadModel::fit(
            params,
            &split.x_train,
            &split.y_train,
            &split.x_test,
            &split.y_test,
        )?;

        let train = model.evaluate(&split.x_train, &split.y_train);
        let test = model.evaluate(&split.x_test, &split.y_test);
        log::info!(
            "model {}: {} rounds | train {} | test {}",
            index,
            model.n_trees(),
            train,
            test
        );

        let path = model_dir.join(format!("spread_model_{}.json", index));
        model.save(&path)?;

        reports.push(ModelReport {
            index,
            params: *model.params(),
            best_iteration: model.best_iteration(),
            train,
            test,
            path,
        });
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    #[test]
    fn test_sampled_params_stay_in_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let params = sample_params(&mut rng, 50);
            assert!((4..=10).contains(&params.max_depth));
            assert!(params.learning_rate >= 0.005 && params.learning_rate < 0.020);
            assert!((700..=1500).contains(&params.n_estimators));
            assert!(params.alpha >= 0.005 && params.alpha < 0.020);
            assert_eq!(params.early_stopping_rounds, 50);
        }
    }

    #[test]
    fn test_seeded_draws_are_reproducible() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        let pa = sample_params(&mut a, 50);
        let pb = sample_params(&mut b, 50);
        assert_eq!(pa.max_depth, pb.max_depth);
        assert_eq!(pa.learning_rate, pb.learning_rate);
        assert_eq!(pa.n_estimators, pb.n_estimators);
        assert_eq!(pa.alpha, pb.alpha);
    }

    #[test]
    fn test_every_model_is_persisted() {
        let dir = std::env::temp_dir().join(format!("hoops-trainer-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        // Small linear problem so the fits stay fast.
        let x_train =
            Array2::from_shape_vec((8, 1), (0..8).map(|v| v as f64).collect()).unwrap();
        let y_train = x_train.column(0).mapv(|v| 2.0 * v);
        let x_test = Array2::from_shape_vec((2, 1), vec![1.5, 6.5]).unwrap();
        let y_test = x_test.column(0).mapv(|v| 2.0 * v);
        let split = TrainTestSplit {
            x_train,
            y_train: Array1::from_vec(y_train.to_vec()),
            train_game_ids: (0..8).collect(),
            x_test,
            y_test: Array1::from_vec(y_test.to_vec()),
            test_game_ids: vec![100, 101],
        };

        let reports = train_models(&split, 2, &dir, 10, Some(1)).unwrap();
        assert_eq!(reports.len(), 2);
        for (i, report) in reports.iter().enumerate() {
            assert_eq!(report.index, i + 1);
            assert!(report.path.exists(), "missing {:?}", report.path);
        }

        std::fs::remove_dir_all(&dir).ok();
    }
}
