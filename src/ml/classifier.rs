use crate::error::{AppError, Result};
use crate::ml::encoding::FeatureEncoder;
use crate::ml::estimators::Estimator;
use crate::ml::features::FeatureRecord;
use crate::ml::models::{ModelMetadata, ModelType};

/// Trait for classifiers
///
/// Implementations are immutable once built; every method takes `&self`
/// and they are shared across threads behind an `Arc`.
pub trait Classifier: Send + Sync {
    /// Column names, in order, the classifier was trained on
    fn feature_names(&self) -> &[String];

    /// Predict `[P(safe), P(not safe)]` for one record
    fn predict_proba(&self, record: &FeatureRecord) -> Result<[f64; 2]>;

    /// Get model metadata
    fn metadata(&self) -> &ModelMetadata;

    /// Get model type
    fn model_type(&self) -> ModelType {
        self.metadata().model_type
    }
}

/// Preprocessing plus estimator, as loaded from an artifact
#[derive(Debug)]
pub struct PipelineClassifier {
    metadata: ModelMetadata,
    features: Vec<String>,
    encoder: FeatureEncoder,
    estimator: Box<dyn Estimator>,
}

impl PipelineClassifier {
    pub fn new(
        metadata: ModelMetadata,
        features: Vec<String>,
        encoder: FeatureEncoder,
        estimator: Box<dyn Estimator>,
    ) -> Self {
        Self {
            metadata,
            features,
            encoder,
            estimator,
        }
    }

    /// Metadata without going through the trait object
    pub fn metadata_ref(&self) -> &ModelMetadata {
        &self.metadata
    }
}

impl Classifier for PipelineClassifier {
    fn feature_names(&self) -> &[String] {
        &self.features
    }

    fn predict_proba(&self, record: &FeatureRecord) -> Result<[f64; 2]> {
        let features = self.encoder.encode_matrix(record)?;
        let proba = self.estimator.predict_proba(&features)?;

        if proba.shape() != [1, 2] {
            return Err(AppError::Inference(format!(
                "expected a 1x2 probability matrix, got {:?}",
                proba.shape()
            )));
        }

        Ok([proba[[0, 0]], proba[[0, 1]]])
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}
