//! # spread-schema-config
//!
//! Entity model, coercion, validation, and JSON Schema emission for
//! `spread.yaml` and `task.yaml`. This crate depends on `shared` only.
//!
//! Documents go through one pipeline: keys are matched in either naming
//! form, scalar values are coerced to strings where the field says so,
//! backends are resolved to exactly one variant, and every issue is
//! collected before a [`ValidationReport`] is returned.

/// Value coercion for string-typed fields.
pub mod coerce;
/// Field tables shared by the validator and the schema emitter.
pub mod fields;
/// Validation issues and reports.
pub mod issues;
/// Identifier naming translation.
pub mod naming;

/// Discriminated backend resolution.
pub mod backend;
/// Document loading helpers (text and files).
pub mod load;
/// Typed entities.
pub mod model;
/// JSON Schema emission.
pub mod schema;
/// Suite path rules.
pub mod suite;
/// Timeout strings.
pub mod timeout;
/// Validation entry points.
pub mod validate;

mod walk;

pub use backend::{BackendKind, TAG_FIELD, resolve_backend};
pub use coerce::{NotCoercible, coerce_string};
pub use issues::{FieldPath, IssueKind, PathSegment, ValidationIssue, ValidationReport};
pub use load::{
    DocumentFormat, ValidatedDocument, detect_document_kind, load_document, parse_json_document,
    parse_project_json, parse_project_yaml, parse_task_json, parse_task_yaml, parse_yaml_document,
    read_document,
};
pub use model::{
    AdhocBackend, Backend, BackendBase, Bios, Entity, Environment, GoogleBackend, Lifecycle,
    LinodeBackend, LxdBackend, QemuBackend, SpreadYaml, Suite, System, SystemEntry, TaskYaml,
};
pub use naming::{to_external, to_internal};
pub use schema::{JSON_SCHEMA_DIALECT, spread_schema, task_schema, to_pretty_json};
pub use suite::{SuitePath, SuitePathError};
pub use timeout::{InvalidTimeout, Timeout};
pub use validate::{
    DocumentKind, ValidatedSpreadYaml, ValidatedTaskYaml, validate_project, validate_task,
};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use spread_schema_shared::shared_crate_version;

    #[test]
    fn config_crate_compiles() {
        let version = config_crate_version();
        assert!(!version.is_empty());
    }

    #[test]
    fn config_and_shared_versions_match() {
        assert_eq!(config_crate_version(), shared_crate_version());
    }
}
