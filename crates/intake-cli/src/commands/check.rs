use anyhow::{Context, Result};
use intake_pipeline::IntakeConfig;
use intake_validate::{AsyncValidator, FormatValidator, ValidationOutcome};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct CheckReport<'a> {
    file: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

/// Validate one file. Returns whether it was accepted.
pub async fn execute(config: &IntakeConfig, file: &Path) -> Result<bool> {
    let extension = file
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let validator = AsyncValidator::new(
        FormatValidator::new().with_max_file_size(config.validation.max_file_size_bytes),
    )
    .with_timeout(config.validation.timeout());

    let outcome = validator.validate_file(file, &extension).await;
    let name = file.to_string_lossy();
    let report = CheckReport {
        file: &name,
        status: status(&outcome),
        reason: outcome.reason(),
    };

    println!(
        "{}",
        serde_json::to_string(&report).context("Failed to serialize report")?
    );
    Ok(outcome.is_accepted())
}

fn status(outcome: &ValidationOutcome) -> &'static str {
    match outcome {
        ValidationOutcome::Accepted => "accepted",
        ValidationOutcome::Rejected { .. } => "invalid-format",
        ValidationOutcome::Internal { .. } => "error",
    }
}
