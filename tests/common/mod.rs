//! Shared helpers for the integration tests.

use std::path::PathBuf;
use std::sync::Arc;
use water_potability::ml::{
    load_artifact, Classifier, DecisionThreshold, PotabilityPredictor, DEFAULT_THRESHOLD,
};

/// Path of a file under `tests/fixtures`
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Load a fixture artifact into a shared classifier
pub fn classifier(name: &str) -> Arc<dyn Classifier> {
    Arc::new(load_artifact(&fixture(name), None).expect("fixture artifact should load"))
}

/// Predictor over a fixture artifact with the default threshold
pub fn predictor(name: &str) -> PotabilityPredictor {
    predictor_with_threshold(name, DEFAULT_THRESHOLD)
}

pub fn predictor_with_threshold(name: &str, threshold: f64) -> PotabilityPredictor {
    PotabilityPredictor::new(
        classifier(name),
        DecisionThreshold::new(threshold).expect("valid threshold"),
    )
}
