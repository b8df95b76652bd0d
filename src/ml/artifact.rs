//! On-disk model artifact.
//!
//! A pre-trained pipeline is shipped as one JSON document: metadata, the
//! ordered training columns, per-column categorical encoders and a tagged
//! estimator. Loading is the only place the artifact is parsed; anything
//! wrong with it is reported as [`AppError::ClassifierUnavailable`].

use crate::error::{AppError, Result};
use crate::ml::classifier::PipelineClassifier;
use crate::ml::encoding::{ColumnEncoding, FeatureEncoder};
use crate::ml::estimators::{Estimator, GradientBoosting, LogisticRegression, RandomForest};
use crate::ml::models::{ModelMetadata, ModelType};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Estimator section of the artifact, tagged by `type`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EstimatorSpec {
    GradientBoosting(GradientBoosting),
    RandomForest(RandomForest),
    LogisticRegression(LogisticRegression),
}

impl EstimatorSpec {
    pub fn model_type(&self) -> ModelType {
        match self {
            EstimatorSpec::GradientBoosting(_) => ModelType::GradientBoosting,
            EstimatorSpec::RandomForest(_) => ModelType::RandomForest,
            EstimatorSpec::LogisticRegression(_) => ModelType::LogisticRegression,
        }
    }

    /// Validate against the encoded row width and box the estimator
    pub fn build(self, n_features: usize) -> Result<Box<dyn Estimator>> {
        Ok(match self {
            EstimatorSpec::GradientBoosting(gbm) => Box::new(gbm.bind(n_features)?),
            EstimatorSpec::RandomForest(forest) => Box::new(forest.bind(n_features)?),
            EstimatorSpec::LogisticRegression(lr) => Box::new(lr.bind(n_features)?),
        })
    }
}

/// Serialized pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub trained_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Training columns, in order
    pub features: Vec<String>,
    #[serde(default)]
    pub encoders: HashMap<String, ColumnEncoding>,
    pub estimator: EstimatorSpec,
    #[serde(default)]
    pub hyperparameters: HashMap<String, String>,
}

impl ModelArtifact {
    /// Parse an artifact from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| AppError::ClassifierUnavailable(format!("malformed artifact: {}", e)))
    }

    /// Validate the artifact and turn it into a ready classifier
    pub fn into_classifier(self) -> Result<PipelineClassifier> {
        if self.features.is_empty() {
            return Err(AppError::ClassifierUnavailable(
                "artifact declares no features".to_string(),
            ));
        }

        let encoder = FeatureEncoder::new(&self.features, &self.encoders)?;
        let model_type = self.estimator.model_type();
        let estimator = self.estimator.build(encoder.width())?;

        let metadata = ModelMetadata {
            name: self.name,
            version: self.version,
            model_type,
            trained_at: self.trained_at,
            n_features: self.features.len(),
            n_encoded_features: encoder.width(),
            hyperparameters: self.hyperparameters,
        };

        Ok(PipelineClassifier::new(
            metadata,
            self.features,
            encoder,
            estimator,
        ))
    }
}

/// Hex SHA-256 digest of `bytes`
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Read, optionally verify, and build the classifier stored at `path`
pub fn load_artifact(path: &Path, expected_sha256: Option<&str>) -> Result<PipelineClassifier> {
    info!("Loading classifier artifact from {}", path.display());

    let bytes = std::fs::read(path).map_err(|e| {
        AppError::ClassifierUnavailable(format!("cannot read {}: {}", path.display(), e))
    })?;

    let digest = sha256_hex(&bytes);
    debug!(sha256 = %digest, bytes = bytes.len(), "Artifact read");

    if let Some(expected) = expected_sha256 {
        if !digest.eq_ignore_ascii_case(expected.trim()) {
            return Err(AppError::ClassifierUnavailable(format!(
                "checksum mismatch for {}: expected {}, found {}",
                path.display(),
                expected,
                digest
            )));
        }
    }

    let text = std::str::from_utf8(&bytes).map_err(|e| {
        AppError::ClassifierUnavailable(format!("{} is not UTF-8: {}", path.display(), e))
    })?;

    let classifier = ModelArtifact::from_json(text)?.into_classifier()?;
    let metadata = classifier.metadata_ref();
    info!(
        "✅ Classifier loaded: {} v{} ({}, {} encoded columns)",
        metadata.name, metadata.version, metadata.model_type, metadata.n_encoded_features
    );

    Ok(classifier)
}
