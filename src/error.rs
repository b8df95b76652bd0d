use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Classifier artifact missing, unreadable or structurally invalid
    #[error("Classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    /// Record does not conform to the classifier's feature schema
    #[error("Schema error: {0}")]
    Schema(String),

    /// A raw input value violates its declared bound
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Classifier produced an output that breaks the probability contract
    #[error("Inference error: {0}")]
    Inference(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::ClassifierUnavailable(_) => "CLASSIFIER_UNAVAILABLE",
            AppError::Schema(_) => "SCHEMA_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Inference(_) => "INFERENCE_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Startup-class errors: the process cannot serve any prediction
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::ClassifierUnavailable(_) | AppError::Configuration(_)
        )
    }

    /// Per-request errors that are reported back to the caller
    pub fn is_request_error(&self) -> bool {
        matches!(self, AppError::Schema(_) | AppError::Validation(_))
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
