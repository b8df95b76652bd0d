/// Machine learning module for water potability prediction
///
/// This module provides:
/// - The canonical 18-column feature schema and input assembly
/// - Categorical encoding of records into estimator rows
/// - Tree ensemble and linear estimators loaded from a JSON artifact
/// - The decision threshold applied to P(not safe)
/// - A build-once holder for the shared classifier

pub mod artifact;
pub mod classifier;
pub mod encoding;
pub mod estimators;
pub mod features;
pub mod models;
pub mod service;
pub mod threshold;

pub use artifact::{load_artifact, sha256_hex, EstimatorSpec, ModelArtifact};
pub use classifier::{Classifier, PipelineClassifier};
pub use encoding::{ColumnEncoding, FeatureEncoder};
pub use estimators::{Estimator, GradientBoosting, LogisticRegression, RandomForest, Tree};
pub use features::{
    feature_names, FeatureKind, FeatureRecord, FeatureSpec, FeatureValue, InputAssembler,
    RawSample, FEATURE_COUNT, FEATURE_SCHEMA,
};
pub use models::{ModelMetadata, ModelType, Potability, PredictionResult};
pub use service::{init_predictor, ClassifierCell, PotabilityPredictor, PROBABILITY_TOLERANCE};
pub use threshold::{DecisionThreshold, DEFAULT_THRESHOLD};
