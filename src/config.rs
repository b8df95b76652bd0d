use crate::error::{AppError, Result};
use crate::ml::DecisionThreshold;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an optional override file
pub const CONFIG_PATH_ENV: &str = "POTABILITY_CONFIG_PATH";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Classifier artifact configuration
    pub model: ModelConfig,

    /// Decision configuration
    #[serde(default)]
    pub prediction: PredictionConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from embedded defaults, an optional file and the
    /// environment. An explicit `path` wins over `POTABILITY_CONFIG_PATH`
    /// and must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ));

        builder = match path {
            Some(path) => builder.add_source(config::File::from(path).required(true)),
            None => match std::env::var(CONFIG_PATH_ENV) {
                Ok(env_path) => builder.add_source(config::File::with_name(&env_path).required(false)),
                Err(_) => builder,
            },
        };

        let config: Config = builder
            // Override with environment variables (prefix: POTABILITY__)
            .add_source(
                config::Environment::with_prefix("POTABILITY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values no prediction can be made with
    pub fn validate(&self) -> Result<()> {
        if self.model.artifact_path.as_os_str().is_empty() {
            return Err(AppError::Configuration(
                "model.artifact_path must not be empty".to_string(),
            ));
        }

        if let Some(sha256) = &self.model.sha256 {
            let sha256 = sha256.trim();
            if sha256.len() != 64 || !sha256.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(AppError::Configuration(format!(
                    "model.sha256 is not a hex SHA-256 digest: '{}'",
                    sha256
                )));
            }
        }

        self.prediction.decision_threshold()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the serialized classifier
    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,

    /// Expected SHA-256 of the artifact file
    #[serde(default)]
    pub sha256: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            artifact_path: default_artifact_path(),
            sha256: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// Cutoff on P(not safe)
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl PredictionConfig {
    pub fn decision_threshold(&self) -> Result<DecisionThreshold> {
        DecisionThreshold::new(self.threshold)
    }
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from("models/final_model.json")
}

fn default_threshold() -> f64 {
    crate::ml::DEFAULT_THRESHOLD
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_embedded_defaults() {
        let file = config_file("");
        let config = Config::load(Some(file.path())).unwrap();

        assert_eq!(config.prediction.threshold, 0.4);
        assert_eq!(
            config.model.artifact_path,
            PathBuf::from("models/final_model.json")
        );
        assert!(config.model.sha256.is_none());
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_file_overrides_threshold() {
        let file = config_file("[prediction]\nthreshold = 0.45\n");
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.prediction.threshold, 0.45);
        assert_eq!(config.prediction.decision_threshold().unwrap().value(), 0.45);
    }

    #[test]
    fn test_rejects_threshold_outside_unit_interval() {
        for bad in ["0.0", "1.0", "1.5", "-0.2"] {
            let file = config_file(&format!("[prediction]\nthreshold = {}\n", bad));
            let err = Config::load(Some(file.path())).unwrap_err();
            assert!(matches!(err, AppError::Configuration(_)), "{}", bad);
            assert!(err.is_fatal());
        }
    }

    #[test]
    fn test_rejects_malformed_digest() {
        let file = config_file("[model]\nsha256 = \"not-a-digest\"\n");
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("sha256"));
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/nonexistent/potability.toml"))).unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }
}
