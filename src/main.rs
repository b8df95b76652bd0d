use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use water_potability::{
    api::{handle_predict, PredictRequest},
    config::Config,
    ml::{init_predictor, FEATURE_SCHEMA},
};

#[derive(Parser)]
#[command(name = "water-potability")]
#[command(about = "Predict whether a water sample is safe to drink", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (overrides $POTABILITY_CONFIG_PATH)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict potability for one sample read as JSON
    Predict {
        /// Input file, or "-" for stdin
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Print the full response as JSON
        #[arg(long)]
        json: bool,

        /// Override the configured decision threshold
        #[arg(short, long)]
        threshold: Option<f64>,
    },

    /// Print the form's default sample as JSON
    Defaults,

    /// Print the feature schema
    Schema,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("water_potability={}", config.observability.log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.observability.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    match cli.command {
        Commands::Predict {
            input,
            json,
            threshold,
        } => {
            let mut prediction = config.prediction.clone();
            if let Some(threshold) = threshold {
                prediction.threshold = threshold;
            }
            let threshold = prediction.decision_threshold()?;

            tracing::info!("Starting water potability predictor v{}", env!("CARGO_PKG_VERSION"));

            // No predictor without a classifier: a failed load ends the process
            let predictor = init_predictor(
                &config.model.artifact_path,
                config.model.sha256.as_deref(),
                threshold,
            )
            .with_context(|| {
                format!(
                    "Cannot start without a classifier ({})",
                    config.model.artifact_path.display()
                )
            })?;

            let request = read_request(&input)?;
            let response = handle_predict(&predictor, &request)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!("{}", response.verdict);
            }
        }

        Commands::Defaults => {
            println!(
                "{}",
                serde_json::to_string_pretty(&PredictRequest::defaults())?
            );
        }

        Commands::Schema => {
            let schema: Vec<_> = FEATURE_SCHEMA
                .iter()
                .map(|spec| -> serde_json::Result<serde_json::Value> {
                    let mut entry = serde_json::to_value(spec)?;
                    let allowed = spec.allowed_values();
                    if !allowed.is_empty() {
                        entry["allowed_values"] = json!(allowed);
                    }
                    Ok(entry)
                })
                .collect::<serde_json::Result<_>>()?;
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }

    Ok(())
}

fn read_request(input: &str) -> anyhow::Result<PredictRequest> {
    let text = if input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read sample from stdin")?;
        text
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))?
    };

    serde_json::from_str(&text).context("Sample is not a valid JSON object")
}
