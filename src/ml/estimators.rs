//! Inference-only estimators for pre-trained tabular models.
//!
//! Trees use the parallel-array layout scikit-learn exports: node `i` splits
//! on `feature[i]` at `threshold[i]` (values `<=` go left), and a negative
//! feature marks a leaf. Children always have a larger index than their
//! parent, which `validate` enforces so traversal cannot loop.

use crate::error::{AppError, Result};
use crate::ml::models::ModelType;
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for fitted binary estimators over encoded rows
pub trait Estimator: Debug + Send + Sync {
    /// Class probabilities, one `[P(safe), P(not safe)]` row per input row
    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array2<f64>>;

    /// Expected width of an encoded row
    fn n_features(&self) -> usize;

    /// Get model type
    fn model_type(&self) -> ModelType;
}

/// A decision tree in parallel-array form with leaf payloads of type `V`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree<V> {
    pub feature: Vec<i32>,
    pub threshold: Vec<f64>,
    pub left: Vec<i32>,
    pub right: Vec<i32>,
    pub value: Vec<V>,
}

impl<V> Tree<V> {
    /// Check array consistency and that every split references a column
    /// inside `n_features`
    pub fn validate(&self, n_features: usize) -> Result<()> {
        let n = self.feature.len();
        if n == 0 {
            return Err(AppError::ClassifierUnavailable("empty tree".to_string()));
        }
        if self.threshold.len() != n
            || self.left.len() != n
            || self.right.len() != n
            || self.value.len() != n
        {
            return Err(AppError::ClassifierUnavailable(
                "inconsistent tree array lengths".to_string(),
            ));
        }

        for i in 0..n {
            if self.feature[i] < 0 {
                continue;
            }
            if self.feature[i] as usize >= n_features {
                return Err(AppError::ClassifierUnavailable(format!(
                    "node {} splits on column {} but rows have {} columns",
                    i, self.feature[i], n_features
                )));
            }
            if !self.threshold[i].is_finite() {
                return Err(AppError::ClassifierUnavailable(format!(
                    "node {} has a non-finite threshold",
                    i
                )));
            }
            for child in [self.left[i], self.right[i]] {
                if child <= i as i32 || child as usize >= n {
                    return Err(AppError::ClassifierUnavailable(format!(
                        "node {} has invalid child {}",
                        i, child
                    )));
                }
            }
        }

        Ok(())
    }

    /// Walk from the root to the leaf that `row` falls into
    pub fn leaf(&self, row: ArrayView1<'_, f64>) -> &V {
        let mut idx = 0usize;
        loop {
            let feature = self.feature[idx];
            if feature < 0 {
                return &self.value[idx];
            }
            idx = if row[feature as usize] <= self.threshold[idx] {
                self.left[idx] as usize
            } else {
                self.right[idx] as usize
            };
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn check_width(features: &Array2<f64>, expected: usize) -> Result<()> {
    if features.ncols() != expected {
        return Err(AppError::Schema(format!(
            "encoded row has {} columns, estimator expects {}",
            features.ncols(),
            expected
        )));
    }
    Ok(())
}

fn binary_rows(p_not_safe: impl Iterator<Item = f64>, n_rows: usize) -> Array2<f64> {
    let mut proba = Array2::zeros((n_rows, 2));
    for (i, p) in p_not_safe.enumerate() {
        proba[[i, 0]] = 1.0 - p;
        proba[[i, 1]] = p;
    }
    proba
}

/// Binary gradient boosting: sigmoid of the boosted log-odds gives
/// P(not safe)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoosting {
    /// Log-odds baseline before any tree
    pub init_score: f64,
    pub learning_rate: f64,
    pub trees: Vec<Tree<f64>>,
    #[serde(skip)]
    n_features: usize,
}

impl GradientBoosting {
    pub fn new(init_score: f64, learning_rate: f64, trees: Vec<Tree<f64>>) -> Self {
        Self {
            init_score,
            learning_rate,
            trees,
            n_features: 0,
        }
    }

    /// Validate against the encoded row width and bind to it
    pub fn bind(mut self, n_features: usize) -> Result<Self> {
        if self.trees.is_empty() {
            return Err(AppError::ClassifierUnavailable("empty GBM".to_string()));
        }
        if !self.init_score.is_finite() || !self.learning_rate.is_finite() {
            return Err(AppError::ClassifierUnavailable(
                "non-finite boosting parameters".to_string(),
            ));
        }
        for tree in &self.trees {
            tree.validate(n_features)?;
        }
        self.n_features = n_features;
        Ok(self)
    }

    fn raw_score(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.trees.iter().fold(self.init_score, |score, tree| {
            score + self.learning_rate * tree.leaf(row)
        })
    }
}

impl Estimator for GradientBoosting {
    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        check_width(features, self.n_features)?;
        let scores = features.rows().into_iter().map(|row| sigmoid(self.raw_score(row)));
        Ok(binary_rows(scores, features.nrows()))
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn model_type(&self) -> ModelType {
        ModelType::GradientBoosting
    }
}

/// Random forest: leaves hold class weights, probabilities are the mean of
/// the normalized leaf distributions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub trees: Vec<Tree<[f64; 2]>>,
    #[serde(skip)]
    n_features: usize,
}

impl RandomForest {
    pub fn new(trees: Vec<Tree<[f64; 2]>>) -> Self {
        Self {
            trees,
            n_features: 0,
        }
    }

    /// Validate, normalize leaf weights and bind to the row width
    pub fn bind(mut self, n_features: usize) -> Result<Self> {
        if self.trees.is_empty() {
            return Err(AppError::ClassifierUnavailable("empty forest".to_string()));
        }
        for tree in &mut self.trees {
            tree.validate(n_features)?;
            for (i, weights) in tree.value.iter_mut().enumerate() {
                if tree.feature[i] >= 0 {
                    continue;
                }
                let total = weights[0] + weights[1];
                if weights.iter().any(|w| !w.is_finite() || *w < 0.0) || total <= 0.0 {
                    return Err(AppError::ClassifierUnavailable(format!(
                        "leaf {} has invalid class weights {:?}",
                        i, weights
                    )));
                }
                weights[0] /= total;
                weights[1] /= total;
            }
        }
        self.n_features = n_features;
        Ok(self)
    }
}

impl Estimator for RandomForest {
    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        check_width(features, self.n_features)?;
        let n_trees = self.trees.len() as f64;
        let scores = features.rows().into_iter().map(|row| {
            self.trees.iter().map(|tree| tree.leaf(row)[1]).sum::<f64>() / n_trees
        });
        Ok(binary_rows(scores, features.nrows()))
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn model_type(&self) -> ModelType {
        ModelType::RandomForest
    }
}

/// Logistic regression over the encoded row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LogisticRegression {
    pub fn bind(self, n_features: usize) -> Result<Self> {
        if self.coefficients.len() != n_features {
            return Err(AppError::ClassifierUnavailable(format!(
                "{} coefficients for {} encoded columns",
                self.coefficients.len(),
                n_features
            )));
        }
        if self.coefficients.iter().any(|c| !c.is_finite()) || !self.intercept.is_finite() {
            return Err(AppError::ClassifierUnavailable(
                "non-finite logistic regression weights".to_string(),
            ));
        }
        Ok(self)
    }
}

impl Estimator for LogisticRegression {
    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        check_width(features, self.coefficients.len())?;
        let weights = ArrayView1::from(&self.coefficients[..]);
        let scores = features
            .rows()
            .into_iter()
            .map(|row| sigmoid(row.dot(&weights) + self.intercept));
        Ok(binary_rows(scores, features.nrows()))
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn model_type(&self) -> ModelType {
        ModelType::LogisticRegression
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// Splits on column 0 at 7.5: low values lean safe
    fn stump(low: f64, high: f64) -> Tree<f64> {
        Tree {
            feature: vec![0, -2, -2],
            threshold: vec![7.5, 0.0, 0.0],
            left: vec![1, -1, -1],
            right: vec![2, -1, -1],
            value: vec![0.0, low, high],
        }
    }

    #[test]
    fn test_gbm_probabilities() {
        let gbm = GradientBoosting::new(0.0, 1.0, vec![stump(-2.0, 2.0)])
            .bind(2)
            .unwrap();

        let proba = gbm.predict_proba(&array![[7.0, 0.0], [8.0, 0.0]]).unwrap();
        assert_eq!(proba.shape(), &[2, 2]);
        assert!((proba[[0, 1]] - sigmoid(-2.0)).abs() < 1e-12);
        assert!((proba[[1, 1]] - sigmoid(2.0)).abs() < 1e-12);
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_gbm_learning_rate_scales_trees() {
        let gbm = GradientBoosting::new(0.5, 0.1, vec![stump(-1.0, 1.0), stump(-1.0, 1.0)])
            .bind(1)
            .unwrap();
        let proba = gbm.predict_proba(&array![[9.0]]).unwrap();
        assert!((proba[[0, 1]] - sigmoid(0.5 + 0.2)).abs() < 1e-12);
    }

    #[test]
    fn test_empty_gbm_rejected() {
        assert!(GradientBoosting::new(0.0, 0.1, vec![]).bind(3).is_err());
    }

    #[test]
    fn test_tree_validation() {
        let mut tree = stump(0.0, 1.0);
        assert!(tree.validate(1).is_ok());
        assert!(tree.validate(0).is_err());

        tree.left[0] = 0;
        assert!(tree.validate(1).is_err());

        let mut tree = stump(0.0, 1.0);
        tree.value.pop();
        assert!(tree.validate(1).is_err());
    }

    #[test]
    fn test_forest_averages_normalized_leaves() {
        let tree = |low: [f64; 2], high: [f64; 2]| Tree {
            feature: vec![0, -2, -2],
            threshold: vec![7.5, 0.0, 0.0],
            left: vec![1, -1, -1],
            right: vec![2, -1, -1],
            value: vec![[0.0, 0.0], low, high],
        };
        let forest = RandomForest::new(vec![
            tree([30.0, 10.0], [5.0, 15.0]),
            tree([1.0, 1.0], [0.0, 4.0]),
        ])
        .bind(1)
        .unwrap();

        let proba = forest.predict_proba(&array![[7.0], [8.0]]).unwrap();
        assert!((proba[[0, 1]] - (0.25 + 0.5) / 2.0).abs() < 1e-12);
        assert!((proba[[1, 1]] - (0.75 + 1.0) / 2.0).abs() < 1e-12);
        assert!((proba.row(0).sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_forest_rejects_empty_leaf() {
        let tree = Tree {
            feature: vec![-2],
            threshold: vec![0.0],
            left: vec![-1],
            right: vec![-1],
            value: vec![[0.0, 0.0]],
        };
        assert!(RandomForest::new(vec![tree]).bind(1).is_err());
    }

    #[test]
    fn test_logistic_regression() {
        let model = LogisticRegression {
            coefficients: vec![0.5, -1.0],
            intercept: 0.25,
        }
        .bind(2)
        .unwrap();

        let proba = model.predict_proba(&array![[2.0, 1.0]]).unwrap();
        assert!((proba[[0, 1]] - sigmoid(0.25)).abs() < 1e-12);
        assert!(model.predict_proba(&array![[2.0]]).is_err());
    }

    #[test]
    fn test_logistic_regression_width_mismatch() {
        let model = LogisticRegression {
            coefficients: vec![0.5],
            intercept: 0.0,
        };
        assert!(model.bind(3).is_err());
    }
}
