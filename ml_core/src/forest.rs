use std::num::NonZeroUsize;

use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{DecisionTreeRegressor, MlError, Regressor, Result};

/// An averaging ensemble of regression trees fitted on bootstrap samples.
///
/// Every tree considers all features at each split; the randomness comes from
/// the bootstrap only. With a fixed `random_state` fitting is deterministic,
/// regardless of how rayon schedules the trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    n_estimators: NonZeroUsize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    bootstrap: bool,
    random_state: Option<u64>,
    n_features: Option<usize>,
    trees: Vec<DecisionTreeRegressor>,
}

impl RandomForestRegressor {
    /// Creates a new unfitted `RandomForestRegressor`.
    ///
    /// # Args
    /// * `n_estimators` - The amount of trees in the forest.
    ///
    /// # Returns
    /// A forest with unlimited depth, bootstrap enabled and no fixed seed.
    pub fn new(n_estimators: NonZeroUsize) -> Self {
        Self {
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap: true,
            random_state: None,
            n_features: None,
            trees: Vec::new(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Fixes the seed used to draw the bootstrap samples.
    pub fn with_random_state(mut self, random_state: Option<u64>) -> Self {
        self.random_state = random_state;
        self
    }

    /// Returns the fitted trees, empty before fit.
    #[cfg(test)]
    fn trees(&self) -> &[DecisionTreeRegressor] {
        &self.trees
    }

    /// Derives one seed per tree from the forest's random state.
    fn tree_seeds(&self) -> Vec<u64> {
        let mut rng = match self.random_state {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        (0..self.n_estimators.get()).map(|_| rng.random()).collect()
    }

    fn blank_tree(&self) -> DecisionTreeRegressor {
        DecisionTreeRegressor::new()
            .with_max_depth(self.max_depth)
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf)
    }
}

impl Regressor for RandomForestRegressor {
    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<()> {
        let rows = x.nrows();

        if rows != y.len() {
            return Err(MlError::ShapeMismatch {
                what: "targets",
                got: y.len(),
                expected: rows,
            });
        }
        if rows == 0 {
            return Err(MlError::InvalidInput("cannot fit a forest on zero samples"));
        }
        if x.ncols() == 0 {
            return Err(MlError::InvalidInput("cannot fit a forest on zero features"));
        }

        let bootstrap = self.bootstrap;
        let trees = self
            .tree_seeds()
            .into_par_iter()
            .map(|seed| -> Result<DecisionTreeRegressor> {
                let samples = if bootstrap {
                    let mut rng = StdRng::seed_from_u64(seed);
                    (0..rows).map(|_| rng.random_range(0..rows)).collect()
                } else {
                    (0..rows).collect()
                };

                let mut tree = self.blank_tree();
                tree.fit_samples(x, y, samples)?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "fitted {} trees on {rows} samples x {} features",
            trees.len(),
            x.ncols()
        );

        self.trees = trees;
        self.n_features = Some(x.ncols());
        Ok(())
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        let expected = self.n_features.ok_or(MlError::NotFitted("random forest"))?;
        if x.ncols() != expected {
            return Err(MlError::ShapeMismatch {
                what: "forest features",
                got: x.ncols(),
                expected,
            });
        }

        let n_trees = self.trees.len() as f64;
        x.rows()
            .into_iter()
            .map(|row| -> Result<f64> {
                let mut total = 0.0;
                for tree in &self.trees {
                    total += tree.predict_row(row)?;
                }
                Ok(total / n_trees)
            })
            .collect()
    }

    fn n_features_in(&self) -> Option<usize> {
        self.n_features
    }
}
