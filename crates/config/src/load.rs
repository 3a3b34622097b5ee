//! Document loading helpers.
//!
//! Parsing turns text into a raw mapping and hands it to the validation
//! entry points. Parse and read failures surface as `ErrorEnvelope`s;
//! validation failures are converted from the [`ValidationReport`].
//!
//! [`ValidationReport`]: crate::ValidationReport

use crate::validate::{
    DocumentKind, ValidatedSpreadYaml, ValidatedTaskYaml, validate_project, validate_task,
};
use serde_json::Value;
use spread_schema_shared::{ErrorCode, ErrorEnvelope, Result};
use std::path::Path;

/// Serialization format of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// YAML (`.yaml`, `.yml`).
    Yaml,
    /// JSON (`.json`).
    Json,
}

/// A validated document of either kind.
#[derive(Debug, Clone)]
pub enum ValidatedDocument {
    /// spread.yaml
    Project(ValidatedSpreadYaml),
    /// task.yaml
    Task(ValidatedTaskYaml),
}

impl ValidatedDocument {
    /// Canonical form of the document as JSON.
    pub fn to_value(&self) -> Result<Value> {
        let result = match self {
            Self::Project(project) => serde_json::to_value(project.as_ref()),
            Self::Task(task) => serde_json::to_value(task.as_ref()),
        };
        result.map_err(|error| {
            ErrorEnvelope::invariant(
                ErrorCode::internal(),
                format!("validated document failed to serialize: {error}"),
            )
        })
    }
}

/// Parse YAML text into a raw mapping.
///
/// Merge keys (`<<: *anchor`) are resolved before validation, so a mapping
/// that merges another one sees the merged fields as its own.
pub fn parse_yaml_document(input: &str) -> Result<Value> {
    let mut yaml: serde_yaml_ng::Value = serde_yaml_ng::from_str(input).map_err(invalid_yaml)?;
    yaml.apply_merge().map_err(invalid_yaml)?;
    let value = serde_json::to_value(yaml).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("schema", "invalid_yaml"),
            format!("unsupported YAML value: {error}"),
        )
    })?;
    require_mapping(value)
}

fn invalid_yaml(error: serde_yaml_ng::Error) -> ErrorEnvelope {
    ErrorEnvelope::expected(
        ErrorCode::new("schema", "invalid_yaml"),
        format!("invalid YAML: {error}"),
    )
}

/// Parse JSON text into a raw mapping.
pub fn parse_json_document(input: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("schema", "invalid_json"),
            format!("invalid JSON: {error}"),
        )
    })?;
    require_mapping(value)
}

/// Parse and validate a spread.yaml document.
pub fn parse_project_yaml(input: &str) -> Result<ValidatedSpreadYaml> {
    validate_project(&parse_yaml_document(input)?).map_err(Into::into)
}

/// Parse and validate a task.yaml document.
pub fn parse_task_yaml(input: &str) -> Result<ValidatedTaskYaml> {
    validate_task(&parse_yaml_document(input)?).map_err(Into::into)
}

/// Parse and validate a project document written as JSON.
pub fn parse_project_json(input: &str) -> Result<ValidatedSpreadYaml> {
    validate_project(&parse_json_document(input)?).map_err(Into::into)
}

/// Parse and validate a task document written as JSON.
pub fn parse_task_json(input: &str) -> Result<ValidatedTaskYaml> {
    validate_task(&parse_json_document(input)?).map_err(Into::into)
}

/// Read a document file and parse it according to its extension.
pub fn read_document(path: &Path) -> Result<Value> {
    let format = detect_document_format(path)?;
    let text = read_document_file(path)?;
    match format {
        DocumentFormat::Yaml => parse_yaml_document(&text),
        DocumentFormat::Json => parse_json_document(&text),
    }
    .map_err(|error| error.with_metadata("file", path.to_string_lossy().to_string()))
}

/// Guess the document kind from a file name (`task.yaml` is a task, anything
/// else a project).
#[must_use]
pub fn detect_document_kind(path: &Path) -> DocumentKind {
    let stem = path
        .file_stem()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase);
    match stem.as_deref() {
        Some("task") => DocumentKind::Task,
        _ => DocumentKind::Project,
    }
}

/// Read, parse, and validate a document file.
pub fn load_document(path: &Path, kind: DocumentKind) -> Result<ValidatedDocument> {
    let raw = read_document(path)?;
    let validated = match kind {
        DocumentKind::Project => validate_project(&raw).map(ValidatedDocument::Project),
        DocumentKind::Task => validate_task(&raw).map(ValidatedDocument::Task),
    };
    validated.map_err(|report| {
        ErrorEnvelope::from(report).with_metadata("file", path.to_string_lossy().to_string())
    })
}

fn require_mapping(value: Value) -> Result<Value> {
    if value.is_object() {
        return Ok(value);
    }
    Err(ErrorEnvelope::expected(
        ErrorCode::new("schema", "not_a_mapping"),
        format!(
            "document must be a mapping, found {}",
            crate::coerce::type_name(&value)
        ),
    ))
}

fn read_document_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|error| {
        ErrorEnvelope::from(error).with_metadata("path", path.to_string_lossy().to_string())
    })
}

fn detect_document_format(path: &Path) -> Result<DocumentFormat> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        None | Some("yaml" | "yml") => Ok(DocumentFormat::Yaml),
        Some("json") => Ok(DocumentFormat::Json),
        Some(other) => Err(ErrorEnvelope::expected(
            ErrorCode::new("schema", "unsupported_format"),
            "unsupported document format; use .yaml, .yml, or .json",
        )
        .with_metadata("extension", other.to_string())),
    }
}
