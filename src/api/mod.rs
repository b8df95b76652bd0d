pub mod handlers;

pub use handlers::{handle_predict, ModelInfo, PredictRequest, PredictResponse, Verdict};
