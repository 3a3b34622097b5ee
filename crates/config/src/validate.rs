//! Validation entry points.

use crate::fields::{SPREAD_YAML, TASK_YAML};
use crate::issues::ValidationReport;
use crate::model::{SpreadYaml, TaskYaml};
use crate::walk::validate_entity;
use serde_json::Value;
use spread_schema_shared::Validated;
use tracing::debug;

/// A project document that passed validation.
pub type ValidatedSpreadYaml = Validated<SpreadYaml>;

/// A task document that passed validation.
pub type ValidatedTaskYaml = Validated<TaskYaml>;

/// Which kind of document is being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// spread.yaml
    Project,
    /// task.yaml
    Task,
}

impl DocumentKind {
    /// Conventional file name.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Project => "spread.yaml",
            Self::Task => "task.yaml",
        }
    }
}

/// Validate a raw project document.
///
/// Every issue in the document is reported; there is no partial result.
pub fn validate_project(raw: &Value) -> Result<ValidatedSpreadYaml, ValidationReport> {
    let result = validate_entity::<SpreadYaml>(&SPREAD_YAML, raw);
    log_outcome(DocumentKind::Project, result.as_ref().err());
    result.map(Validated::new)
}

/// Validate a raw task document.
pub fn validate_task(raw: &Value) -> Result<ValidatedTaskYaml, ValidationReport> {
    let result = validate_entity::<TaskYaml>(&TASK_YAML, raw);
    log_outcome(DocumentKind::Task, result.as_ref().err());
    result.map(Validated::new)
}

fn log_outcome(kind: DocumentKind, report: Option<&ValidationReport>) {
    let issues = report.map_or(0, ValidationReport::len);
    debug!(document = kind.file_name(), issues, "validated document");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::IssueKind;
    use serde_json::json;
    use std::error::Error;

    fn minimal_project() -> Value {
        json!({
            "project": "hello-world",
            "path": "/home/test",
            "backends": {"lxd": {"systems": ["ubuntu-24.04-64"]}},
            "suites": {"tests/": {"summary": "integration tests"}},
        })
    }

    #[test]
    fn minimal_project_gets_defaults() -> Result<(), Box<dyn Error>> {
        let project = validate_project(&minimal_project())?.into_inner();
        assert_eq!(project.include, vec!["*".to_string()]);
        assert!(project.environment.is_empty());
        assert!(project.exclude.is_none());
        assert!(project.suite("tests/").is_some_and(|suite| !suite.manual));
        Ok(())
    }

    #[test]
    fn unknown_top_level_key_is_the_only_issue() {
        let mut raw = minimal_project();
        if let Some(map) = raw.as_object_mut() {
            map.insert("foobar".to_string(), json!(1));
        }
        let report = validate_project(&raw).err();
        assert_eq!(report.as_ref().map(ValidationReport::len), Some(1));
        assert_eq!(
            report.map(|report| report.has(IssueKind::UnknownField, "foobar")),
            Some(true)
        );
    }

    #[test]
    fn nested_issue_paths_are_dotted() {
        let raw = json!({
            "project": "p",
            "path": "/p",
            "backends": {"google": {"systems": ["fedora-41-64"]}},
            "suites": {"tests": {"summary": "s"}, "/abs/": {"summary": "s"}},
        });
        let report = validate_project(&raw).err();
        let has = |kind, path| report.as_ref().is_some_and(|report| report.has(kind, path));
        assert!(has(IssueKind::MissingRequiredField, "backends.google.location"));
        assert!(has(IssueKind::PatternViolation, "suites.tests"));
        assert!(has(IssueKind::PatternViolation, "suites./abs/"));
    }

    #[test]
    fn minimal_task_uses_declared_defaults() -> Result<(), Box<dyn Error>> {
        let task = validate_task(&json!({"summary": "s", "execute": "echo ok"}))?;
        assert_eq!(task.execute, "echo ok");
        assert_eq!(task.environment.as_ref().map(indexmap::IndexMap::len), Some(0));
        assert!(!task.manual);
        assert!(task.artifacts.is_none());
        assert!(task.prepare.is_none());
        Ok(())
    }

    #[test]
    fn task_without_execute_is_rejected() {
        let report = validate_task(&json!({"summary": "s"})).err();
        assert_eq!(
            report.map(|report| report.has(IssueKind::MissingRequiredField, "execute")),
            Some(true)
        );
    }
}
