use crate::error::{AppError, Result};
use crate::ml::artifact::load_artifact;
use crate::ml::classifier::Classifier;
use crate::ml::features::{feature_names, FeatureRecord, FEATURE_COUNT};
use crate::ml::models::{ModelMetadata, PredictionResult};
use crate::ml::threshold::DecisionThreshold;
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Tolerance on P(safe) + P(not safe) == 1
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Where an artifact-backed classifier came from
#[derive(Debug, Clone, PartialEq, Eq)]
struct ArtifactOrigin {
    path: PathBuf,
    sha256: Option<String>,
}

impl ArtifactOrigin {
    fn new(path: &Path, sha256: Option<&str>) -> Self {
        Self {
            path: path.to_path_buf(),
            sha256: sha256.map(|digest| digest.trim().to_ascii_lowercase()),
        }
    }
}

/// Build-once holder for the shared classifier.
///
/// The loader runs at most once, even when several threads race on the
/// first call. A failed load leaves the cell empty and the error goes back
/// to the caller; nothing is cached in its place.
pub struct ClassifierCell {
    cell: OnceCell<Arc<dyn Classifier>>,
    origin: OnceCell<ArtifactOrigin>,
}

static GLOBAL_CLASSIFIER: ClassifierCell = ClassifierCell::new();

impl ClassifierCell {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
            origin: OnceCell::new(),
        }
    }

    /// Process-wide instance, torn down only at exit
    pub fn global() -> &'static ClassifierCell {
        &GLOBAL_CLASSIFIER
    }

    /// Return the classifier, running `loader` if none is loaded yet
    pub fn get_or_load<F>(&self, loader: F) -> Result<Arc<dyn Classifier>>
    where
        F: FnOnce() -> Result<Arc<dyn Classifier>>,
    {
        self.cell.get_or_try_init(loader).map(Arc::clone)
    }

    /// Return the classifier, loading the artifact at `path` on first use.
    ///
    /// Once an artifact is loaded, asking for a different path or digest is
    /// a `Configuration` error rather than a silent reuse of the first one.
    pub fn get_or_load_artifact(
        &self,
        path: &Path,
        expected_sha256: Option<&str>,
    ) -> Result<Arc<dyn Classifier>> {
        let requested = ArtifactOrigin::new(path, expected_sha256);

        let classifier = self.get_or_load(|| {
            let classifier = load_artifact(path, expected_sha256)?;
            // Set before the cell is filled, so readers of the cell see it
            let _ = self.origin.set(requested.clone());
            Ok(Arc::new(classifier) as Arc<dyn Classifier>)
        })?;

        if let Some(loaded) = self.origin.get() {
            if *loaded != requested {
                return Err(AppError::Configuration(format!(
                    "classifier already loaded from {} (sha256: {}), cannot switch to {} (sha256: {})",
                    loaded.path.display(),
                    loaded.sha256.as_deref().unwrap_or("unchecked"),
                    requested.path.display(),
                    requested.sha256.as_deref().unwrap_or("unchecked"),
                )));
            }
        }

        Ok(classifier)
    }

    /// The loaded classifier, if any
    pub fn get(&self) -> Option<Arc<dyn Classifier>> {
        self.cell.get().cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl Default for ClassifierCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the decision threshold to a shared classifier's output.
///
/// Pure: the result depends only on the record, the classifier and the
/// threshold.
#[derive(Clone)]
pub struct PotabilityPredictor {
    classifier: Arc<dyn Classifier>,
    threshold: DecisionThreshold,
}

impl PotabilityPredictor {
    pub fn new(classifier: Arc<dyn Classifier>, threshold: DecisionThreshold) -> Self {
        Self {
            classifier,
            threshold,
        }
    }

    pub fn threshold(&self) -> DecisionThreshold {
        self.threshold
    }

    /// Same classifier, different cutoff
    pub fn with_threshold(&self, threshold: DecisionThreshold) -> Self {
        Self {
            classifier: Arc::clone(&self.classifier),
            threshold,
        }
    }

    pub fn metadata(&self) -> &ModelMetadata {
        self.classifier.metadata()
    }

    /// The classifier must expect exactly the canonical columns, in order
    pub fn check_schema(&self) -> Result<()> {
        let expected = self.classifier.feature_names();
        let conforms = expected.len() == FEATURE_COUNT
            && expected
                .iter()
                .zip(feature_names())
                .all(|(trained, column)| trained == column);

        if !conforms {
            return Err(AppError::Schema(format!(
                "classifier expects columns [{}], records provide [{}]",
                expected.join(", "),
                feature_names().collect::<Vec<_>>().join(", ")
            )));
        }
        Ok(())
    }

    /// Predict potability for one record
    pub fn predict(&self, record: &FeatureRecord) -> Result<PredictionResult> {
        self.check_schema()?;

        let [prob_safe, prob_not_safe] = self.classifier.predict_proba(record)?;

        let in_unit = |p: f64| p.is_finite() && (0.0..=1.0).contains(&p);
        if !in_unit(prob_safe) || !in_unit(prob_not_safe) {
            return Err(AppError::Inference(format!(
                "probabilities out of range: [{}, {}]",
                prob_safe, prob_not_safe
            )));
        }
        if (prob_safe + prob_not_safe - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(AppError::Inference(format!(
                "probabilities do not sum to 1: [{}, {}]",
                prob_safe, prob_not_safe
            )));
        }

        let label = self.threshold.decide(prob_not_safe);
        debug!(
            prob_safe,
            prob_not_safe,
            threshold = self.threshold.value(),
            label = %label,
            "Prediction computed"
        );

        Ok(PredictionResult {
            prob_safe,
            prob_not_safe,
            label,
            threshold: self.threshold.value(),
        })
    }
}

impl std::fmt::Debug for PotabilityPredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PotabilityPredictor")
            .field("model", &self.classifier.metadata().name)
            .field("threshold", &self.threshold.value())
            .finish()
    }
}

/// Load (or reuse) the process-wide classifier and wrap it in a predictor.
/// Fails when the artifact cannot be loaded or does not match the schema,
/// so no predictor exists without a usable classifier. The process holds one
/// classifier: a later call naming another artifact or digest fails with
/// `Configuration`, while the threshold may differ per call.
pub fn init_predictor(
    path: &Path,
    expected_sha256: Option<&str>,
    threshold: DecisionThreshold,
) -> Result<PotabilityPredictor> {
    let classifier = ClassifierCell::global().get_or_load_artifact(path, expected_sha256)?;
    let predictor = PotabilityPredictor::new(classifier, threshold);

    predictor.check_schema().map_err(|e| {
        AppError::ClassifierUnavailable(format!("artifact does not match feature schema: {}", e))
    })?;

    info!(
        "Predictor ready (model: {}, threshold: {})",
        predictor.metadata().name,
        threshold.value()
    );
    Ok(predictor)
}
