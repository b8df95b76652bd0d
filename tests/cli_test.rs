/// Integration tests for the `water-potability` binary
///
/// These tests run the compiled CLI and verify:
/// - Startup fails with a non-zero exit when the classifier cannot load
/// - Threshold overrides from the command line, environment and config file
/// - `defaults` and `schema` output
/// - Per-request validation failures

mod common;

use common::fixture;
use std::io::Write;
use std::process::{Command, Output, Stdio};
use water_potability::api::PredictRequest;

/// Run the binary with a clean POTABILITY_* environment pointed at the
/// gradient boosting fixture
fn run(args: &[&str], envs: &[(&str, &str)], stdin: Option<&str>) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_water-potability"));
    command
        .args(args)
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .env_remove("POTABILITY_CONFIG_PATH")
        .env_remove("POTABILITY__PREDICTION__THRESHOLD")
        .env_remove("RUST_LOG")
        .env(
            "POTABILITY__MODEL__ARTIFACT_PATH",
            fixture("gradient_boosting.json"),
        )
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in envs {
        command.env(key, value);
    }

    let mut child = command.spawn().expect("binary should start");
    {
        let mut pipe = child.stdin.take().expect("stdin is piped");
        if let Some(input) = stdin {
            pipe.write_all(input.as_bytes()).unwrap();
        }
    }
    child.wait_with_output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn defaults_json() -> String {
    serde_json::to_string(&PredictRequest::defaults()).unwrap()
}

#[test]
fn test_missing_artifact_exits_non_zero() {
    let output = run(
        &["predict"],
        &[("POTABILITY__MODEL__ARTIFACT_PATH", "/nonexistent/final_model.json")],
        Some(&defaults_json()),
    );

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Cannot start without a classifier"), "{}", stderr);
}

#[test]
fn test_predict_defaults_is_safe() {
    let output = run(&["predict"], &[], Some(&defaults_json()));

    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("Prediction Result: SAFE for consumption"), "{}", stdout);
    assert!(stdout.contains("Safe: 94.78% | Not Safe: 5.22%"), "{}", stdout);
}

#[test]
fn test_threshold_flag_overrides_config() {
    let output = run(
        &["predict", "--threshold", "0.01"],
        &[],
        Some(&defaults_json()),
    );

    assert!(output.status.success());
    assert!(stdout(&output).contains("NOT SAFE for consumption"));
}

#[test]
fn test_defaults_piped_into_predict() {
    let defaults = run(&["defaults"], &[], None);
    assert!(defaults.status.success());

    let output = run(
        &["predict", "--threshold", "0.01"],
        &[],
        Some(&stdout(&defaults)),
    );
    assert!(output.status.success());
    assert!(stdout(&output).contains("NOT SAFE for consumption"));
}

#[test]
fn test_invalid_threshold_flag_rejected() {
    let output = run(
        &["predict", "--threshold", "1.5"],
        &[],
        Some(&defaults_json()),
    );
    assert!(!output.status.success());
}

#[test]
fn test_env_threshold_override() {
    let output = run(
        &["predict"],
        &[("POTABILITY__PREDICTION__THRESHOLD", "0.01")],
        Some(&defaults_json()),
    );

    assert!(output.status.success());
    assert!(stdout(&output).contains("NOT SAFE for consumption"));
}

#[test]
fn test_config_path_env_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(b"[prediction]\nthreshold = 0.01\n").unwrap();
    let path = file.path().to_str().unwrap();

    let output = run(
        &["predict"],
        &[("POTABILITY_CONFIG_PATH", path)],
        Some(&defaults_json()),
    );
    assert!(output.status.success());
    assert!(stdout(&output).contains("NOT SAFE for consumption"));

    // --config wins over the environment
    let mut lenient = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    lenient.write_all(b"[prediction]\nthreshold = 0.5\n").unwrap();
    let output = run(
        &["--config", lenient.path().to_str().unwrap(), "predict"],
        &[("POTABILITY_CONFIG_PATH", path)],
        Some(&defaults_json()),
    );
    assert!(output.status.success());
    assert!(stdout(&output).contains("Prediction Result: SAFE for consumption"));
}

#[test]
fn test_json_output() {
    let output = run(&["predict", "--json"], &[], Some(&defaults_json()));
    assert!(output.status.success());

    let response: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(response["result"]["label"], "SAFE");
    assert_eq!(response["result"]["threshold"], 0.4);
    assert_eq!(response["model"]["model_type"], "gradient_boosting");
    assert_eq!(response["verdict"]["headline"], "SAFE for consumption");
}

#[test]
fn test_defaults_output() {
    let output = run(&["defaults"], &[], None);
    assert!(output.status.success());

    let request: PredictRequest = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(request, PredictRequest::defaults());
}

#[test]
fn test_schema_output() {
    let output = run(&["schema"], &[], None);
    assert!(output.status.success());

    let schema: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(schema.len(), 18);
    assert_eq!(schema[0]["name"], "pH");
    assert_eq!(schema[0]["max"], 14.0);
    assert_eq!(schema[6]["name"], "Color");
    assert_eq!(schema[6]["allowed_values"].as_array().unwrap().len(), 5);
    assert_eq!(schema[17]["name"], "Day");
    assert_eq!(schema[17]["kind"], "integer");
}

#[test]
fn test_invalid_sample_exits_non_zero() {
    let mut request = PredictRequest::defaults();
    request.day = Some(0);

    let output = run(
        &["predict"],
        &[],
        Some(&serde_json::to_string(&request).unwrap()),
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Validation error"));
}

#[test]
fn test_input_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(defaults_json().as_bytes()).unwrap();

    let output = run(
        &["predict", "--input", file.path().to_str().unwrap()],
        &[],
        None,
    );
    assert!(output.status.success());
    assert!(stdout(&output).contains("SAFE for consumption"));
}
