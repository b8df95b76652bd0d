use crate::error::Result;
use crate::ml::{
    InputAssembler, ModelType, Potability, PotabilityPredictor, PredictionResult, RawSample,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, info_span, warn};
use uuid::Uuid;

/// A prediction request is the raw form submission
pub type PredictRequest = RawSample;

/// Predict potability for one submission
pub fn handle_predict(
    predictor: &PotabilityPredictor,
    request: &PredictRequest,
) -> Result<PredictResponse> {
    let request_id = Uuid::new_v4();
    let span = info_span!("predict", %request_id);
    let _guard = span.enter();

    let outcome = InputAssembler::new()
        .assemble(request)
        .and_then(|record| predictor.predict(&record));

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            warn!(code = e.error_code(), "Prediction rejected: {}", e);
            return Err(e);
        }
    };

    info!(
        label = %result.label,
        prob_not_safe = result.prob_not_safe,
        confidence = result.confidence(),
        "Prediction served"
    );

    let metadata = predictor.metadata();
    Ok(PredictResponse {
        request_id,
        model: ModelInfo {
            name: metadata.name.clone(),
            version: metadata.version.clone(),
            model_type: metadata.model_type,
        },
        verdict: Verdict::from(&result),
        result,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub request_id: Uuid,
    pub result: PredictionResult,
    pub verdict: Verdict,
    pub model: ModelInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInfo {
    pub name: String,
    pub version: String,
    pub model_type: ModelType,
}

/// Human-readable rendering of a [`PredictionResult`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Verdict {
    pub headline: String,
    pub confidence: String,
    pub advisory: String,
}

impl From<&PredictionResult> for Verdict {
    fn from(result: &PredictionResult) -> Self {
        let (headline, advisory) = match result.label {
            Potability::Safe => (
                "SAFE for consumption",
                "This water sample appears to be POTABLE and safe for drinking based on the analyzed parameters.",
            ),
            Potability::NotSafe => (
                "NOT SAFE for consumption",
                "This water sample appears to be NON-POTABLE and may not be safe for drinking. Consider water treatment or alternative sources.",
            ),
        };

        Self {
            headline: headline.to_string(),
            confidence: format!(
                "Safe: {:.2}% | Not Safe: {:.2}%",
                result.prob_safe * 100.0,
                result.prob_not_safe * 100.0
            ),
            advisory: advisory.to_string(),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Prediction Result: {}", self.headline)?;
        writeln!(f, "Model Confidence: {}", self.confidence)?;
        write!(f, "{}", self.advisory)
    }
}
