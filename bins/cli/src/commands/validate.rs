use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, to_json_line};
use serde_json::json;
use spread_schema_config::{
    DocumentKind, ValidatedDocument, ValidationReport, detect_document_kind, read_document,
    validate_project, validate_task,
};
use spread_schema_shared::ErrorEnvelope;
use std::path::Path;
use tracing::info;

/// Validate one document file.
///
/// The kind is taken from the file name when not given.
pub fn run_validate(
    mode: OutputMode,
    path: &Path,
    kind: Option<DocumentKind>,
) -> Result<CliOutput, CliError> {
    let kind = kind.unwrap_or_else(|| detect_document_kind(path));
    info!(path = %path.display(), document = kind.file_name(), "validating");

    let raw = match read_document(path) {
        Ok(raw) => raw,
        Err(error) => return envelope_output(mode, path, &error),
    };
    let validated = match kind {
        DocumentKind::Project => validate_project(&raw).map(ValidatedDocument::Project),
        DocumentKind::Task => validate_task(&raw).map(ValidatedDocument::Task),
    };
    match validated {
        Ok(document) => valid_output(mode, path, kind, &document),
        Err(report) => report_output(mode, path, kind, &report),
    }
}

fn valid_output(
    mode: OutputMode,
    path: &Path,
    kind: DocumentKind,
    document: &ValidatedDocument,
) -> Result<CliOutput, CliError> {
    let stdout = if mode.is_json() {
        let canonical = match document.to_value() {
            Ok(value) => value,
            Err(error) => return envelope_output(mode, path, &error),
        };
        to_json_line(&json!({
            "status": "ok",
            "path": path.display().to_string(),
            "kind": kind.file_name(),
            "document": canonical,
        }))?
    } else {
        format!("{}: valid {}\n", path.display(), kind.file_name())
    };
    Ok(CliOutput {
        stdout,
        exit_code: ExitCode::Ok,
    })
}

fn report_output(
    mode: OutputMode,
    path: &Path,
    kind: DocumentKind,
    report: &ValidationReport,
) -> Result<CliOutput, CliError> {
    let stdout = if mode.is_json() {
        to_json_line(&json!({
            "status": "invalid",
            "path": path.display().to_string(),
            "kind": kind.file_name(),
            "issues": report.issues(),
        }))?
    } else {
        format!("{}: {report}\n", path.display())
    };
    Ok(CliOutput {
        stdout,
        exit_code: ExitCode::InvalidInput,
    })
}

fn envelope_output(
    mode: OutputMode,
    path: &Path,
    error: &ErrorEnvelope,
) -> Result<CliOutput, CliError> {
    let stdout = if mode.is_json() {
        to_json_line(&json!({
            "status": "error",
            "path": path.display().to_string(),
            "error": error,
        }))?
    } else {
        format!("{}: {error}\n", path.display())
    };
    Ok(CliOutput {
        stdout,
        exit_code: ExitCode::for_envelope(error),
    })
}
