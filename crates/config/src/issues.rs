//! Validation issue taxonomy and the aggregated report.
//!
//! A single validation pass collects every issue it finds; the report is
//! only returned when at least one issue exists.

use serde::{Serialize, Serializer};
use spread_schema_shared::{ErrorCode, ErrorEnvelope};
use std::fmt;

/// Category of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A key that the target entity does not declare.
    UnknownField,
    /// A required key is absent.
    MissingRequiredField,
    /// A value of the wrong type that cannot be coerced.
    TypeMismatch,
    /// A value that fails a structural constraint.
    PatternViolation,
    /// A backend entry whose variant cannot be determined.
    DiscriminatorError,
}

impl IssueKind {
    /// Stable snake_case identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnknownField => "unknown_field",
            Self::MissingRequiredField => "missing_required_field",
            Self::TypeMismatch => "type_mismatch",
            Self::PatternViolation => "pattern_violation",
            Self::DiscriminatorError => "discriminator_error",
        }
    }

    fn error_code(self) -> ErrorCode {
        ErrorCode::new("schema", self.as_str())
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// One step in a document path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A mapping key, as written in the document.
    Key(String),
    /// A list index.
    Index(usize),
}

/// Location of a value within a document (`backends.google.location`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// The document root.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Extend the path with a mapping key.
    #[must_use]
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.into()));
        Self(segments)
    }

    /// Extend the path with a list index.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    /// Returns true for the document root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Path segments from the root.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return formatter.write_str("(root)");
        }
        for (position, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if position == 0 => formatter.write_str(key)?,
                PathSegment::Key(key) => write!(formatter, ".{key}")?,
                PathSegment::Index(index) => write!(formatter, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Failure category.
    pub kind: IssueKind,
    /// Location of the offending value.
    pub path: FieldPath,
    /// Human-readable reason.
    pub message: String,
}

impl ValidationIssue {
    /// Build an issue.
    pub fn new(kind: IssueKind, path: FieldPath, message: impl Into<String>) -> Self {
        Self {
            kind,
            path,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}: {} ({})", self.path, self.message, self.kind)
    }
}

/// Every issue found in one validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Build a report from collected issues, or `None` when there are none.
    #[must_use]
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Option<Self> {
        if issues.is_empty() {
            None
        } else {
            Some(Self { issues })
        }
    }

    /// Build a report carrying a single issue.
    #[must_use]
    pub fn single(issue: ValidationIssue) -> Self {
        Self {
            issues: vec![issue],
        }
    }

    /// All issues in discovery order.
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Number of issues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Always false; a report holds at least one issue.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// First issue at `path` (as displayed), if any.
    #[must_use]
    pub fn at(&self, path: &str) -> Option<&ValidationIssue> {
        self.issues
            .iter()
            .find(|issue| issue.path.to_string() == path)
    }

    /// Returns true when an issue of `kind` exists at `path`.
    #[must_use]
    pub fn has(&self, kind: IssueKind, path: &str) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.kind == kind && issue.path.to_string() == path)
    }

    /// Consume the report and return its issues.
    #[must_use]
    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues
    }

    fn shared_kind(&self) -> Option<IssueKind> {
        let first = self.issues.first()?.kind;
        self.issues
            .iter()
            .all(|issue| issue.kind == first)
            .then_some(first)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.issues.len();
        let noun = if count == 1 { "issue" } else { "issues" };
        write!(formatter, "{count} validation {noun}")?;
        for issue in &self.issues {
            write!(formatter, "\n  - {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

impl From<ValidationReport> for ErrorEnvelope {
    fn from(report: ValidationReport) -> Self {
        let code = report.shared_kind().map_or_else(
            || ErrorCode::new("schema", "invalid_document"),
            IssueKind::error_code,
        );
        let mut envelope =
            Self::expected(code, report.to_string()).with_metadata("issues", report.len().to_string());
        if let Some(first) = report.issues.first() {
            envelope = envelope.with_metadata("path", first.path.to_string());
        }
        envelope
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_render_dotted_with_indices() {
        let path = FieldPath::root()
            .key("backends")
            .key("lxd")
            .key("systems")
            .index(2);
        assert_eq!(path.to_string(), "backends.lxd.systems[2]");
        assert_eq!(FieldPath::root().to_string(), "(root)");
    }

    #[test]
    fn empty_issue_list_is_not_a_report() {
        assert!(ValidationReport::from_issues(Vec::new()).is_none());
    }

    #[test]
    fn envelope_uses_shared_kind_code() {
        let report = ValidationReport::single(ValidationIssue::new(
            IssueKind::UnknownField,
            FieldPath::root().key("foobar"),
            "unknown field `foobar`",
        ));
        let envelope = ErrorEnvelope::from(report);
        assert_eq!(envelope.code, ErrorCode::new("schema", "unknown_field"));
        assert_eq!(
            envelope.metadata.get("path").map(String::as_str),
            Some("foobar")
        );
    }

    #[test]
    fn envelope_falls_back_to_invalid_document() {
        let report = ValidationReport::from_issues(vec![
            ValidationIssue::new(IssueKind::UnknownField, FieldPath::root().key("a"), "a"),
            ValidationIssue::new(
                IssueKind::MissingRequiredField,
                FieldPath::root().key("b"),
                "b",
            ),
        ]);
        let envelope = report.map(ErrorEnvelope::from);
        assert_eq!(
            envelope.map(|envelope| envelope.code),
            Some(ErrorCode::new("schema", "invalid_document"))
        );
    }
}
