use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::Display;

/// Binary potability label
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Potability {
    #[strum(to_string = "SAFE")]
    Safe,
    #[strum(to_string = "NOT SAFE")]
    NotSafe,
}

/// Outcome of a single prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// P(safe), as returned by the classifier
    pub prob_safe: f64,

    /// P(not safe), as returned by the classifier
    pub prob_not_safe: f64,

    /// Label derived from `prob_not_safe` and `threshold`
    pub label: Potability,

    /// Decision threshold that produced the label
    pub threshold: f64,
}

impl PredictionResult {
    /// Confidence of the reported label (not of the argmax)
    pub fn confidence(&self) -> f64 {
        match self.label {
            Potability::Safe => self.prob_safe,
            Potability::NotSafe => self.prob_not_safe,
        }
    }

    /// Whether the threshold flipped the verdict relative to a 0.5 cutoff
    pub fn differs_from_argmax(&self) -> bool {
        let argmax_not_safe = self.prob_not_safe > self.prob_safe;
        argmax_not_safe != (self.label == Potability::NotSafe)
    }
}

/// Model metadata carried by the artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model name
    pub name: String,

    /// Model version
    pub version: String,

    /// Model type
    pub model_type: ModelType,

    /// Training timestamp
    #[serde(default)]
    pub trained_at: Option<chrono::DateTime<chrono::Utc>>,

    /// Number of raw input columns
    pub n_features: usize,

    /// Width of the encoded row the estimator consumes
    #[serde(default)]
    pub n_encoded_features: usize,

    /// Free-form training parameters
    #[serde(default)]
    pub hyperparameters: HashMap<String, String>,
}

/// Model type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Logistic regression
    LogisticRegression,

    /// Random forest
    RandomForest,

    /// Gradient boosting
    GradientBoosting,
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelType::LogisticRegression => write!(f, "Logistic Regression"),
            ModelType::RandomForest => write!(f, "Random Forest"),
            ModelType::GradientBoosting => write!(f, "Gradient Boosting"),
        }
    }
}
