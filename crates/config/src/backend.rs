//! Discriminated backend resolution.
//!
//! A backend entry is resolved to exactly one variant before any of its
//! fields are checked: from its explicit `type`, or else from the name it
//! is stored under when that name is itself a backend type.

use crate::coerce::type_name;
use crate::fields::{
    ADHOC_BACKEND, EntitySpec, GOOGLE_BACKEND, LINODE_BACKEND, LXD_BACKEND, QEMU_BACKEND,
};
use crate::issues::{FieldPath, IssueKind, ValidationReport};
use crate::model::Backend;
use crate::walk::{Walker, into_typed};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::trace;

/// Discriminator field name.
pub const TAG_FIELD: &str = "type";

/// The closed set of backend variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Local containers.
    Lxd,
    /// Local virtual machines.
    Qemu,
    /// Google Cloud.
    Google,
    /// Linode.
    Linode,
    /// Custom allocate/discard scripts.
    Adhoc,
}

impl BackendKind {
    /// Every variant, in tag order.
    pub const ALL: [Self; 5] = [Self::Lxd, Self::Qemu, Self::Google, Self::Linode, Self::Adhoc];

    /// The literal discriminator value.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Lxd => "lxd",
            Self::Qemu => "qemu",
            Self::Google => "google",
            Self::Linode => "linode",
            Self::Adhoc => "adhoc",
        }
    }

    /// Look up a variant by its exact tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Field table of this variant.
    #[must_use]
    pub const fn spec(self) -> &'static EntitySpec {
        match self {
            Self::Lxd => &LXD_BACKEND,
            Self::Qemu => &QEMU_BACKEND,
            Self::Google => &GOOGLE_BACKEND,
            Self::Linode => &LINODE_BACKEND,
            Self::Adhoc => &ADHOC_BACKEND,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.tag())
    }
}

fn valid_tags() -> String {
    BackendKind::ALL.map(BackendKind::tag).join(", ")
}

fn discriminate(
    walker: &mut Walker,
    name: Option<&str>,
    entry: &Map<String, Value>,
    path: &FieldPath,
) -> Option<BackendKind> {
    let implicit = name.and_then(BackendKind::from_tag);
    let Some(explicit) = entry.get(TAG_FIELD) else {
        if implicit.is_none() {
            let message = match name {
                Some(name) => format!(
                    "backend `{name}` has no `type` and its name is not a backend type; expected one of: {}",
                    valid_tags()
                ),
                None => format!("backend has no `type`; expected one of: {}", valid_tags()),
            };
            walker.report(IssueKind::DiscriminatorError, path.clone(), message);
        }
        return implicit;
    };

    let type_path = path.key(TAG_FIELD);
    let Value::String(tag) = explicit else {
        walker.report(
            IssueKind::DiscriminatorError,
            type_path,
            format!(
                "backend type must be a string, found {}; expected one of: {}",
                type_name(explicit),
                valid_tags()
            ),
        );
        return None;
    };
    let Some(kind) = BackendKind::from_tag(tag) else {
        walker.report(
            IssueKind::DiscriminatorError,
            type_path,
            format!("unknown backend type `{tag}`; expected one of: {}", valid_tags()),
        );
        return None;
    };
    match implicit {
        Some(implicit) if implicit != kind => {
            walker.report(
                IssueKind::DiscriminatorError,
                type_path,
                format!(
                    "backend `{implicit}` must have type `{implicit}`, found `{kind}`; expected one of: {}",
                    valid_tags()
                ),
            );
            None
        },
        _ => Some(kind),
    }
}

/// Resolve and validate one backend entry, recording issues on `walker`.
///
/// Returns the normalized entry with an explicit `type`.
pub(crate) fn resolve_entry(
    walker: &mut Walker,
    name: Option<&str>,
    raw: &Value,
    path: &FieldPath,
) -> Option<Map<String, Value>> {
    let Value::Object(entry) = raw else {
        walker.report(
            IssueKind::TypeMismatch,
            path.clone(),
            format!("expected a backend mapping, found {}", type_name(raw)),
        );
        return None;
    };
    let kind = discriminate(walker, name, entry, path)?;
    trace!(backend = name.unwrap_or("<unnamed>"), kind = kind.tag(), "resolved backend variant");
    walker.entity(kind.spec(), raw, path)
}

/// Resolve a raw backend entry to its typed variant.
///
/// `name` is the mapping key the entry is stored under, if any; it supplies
/// the variant when the entry has no explicit `type`. Issue paths are
/// relative to the entry (`location`, not `backends.google.location`).
pub fn resolve_backend(name: Option<&str>, raw: &Value) -> Result<Backend, ValidationReport> {
    let mut walker = Walker::new();
    let root = FieldPath::root();
    let normalized = resolve_entry(&mut walker, name, raw, &root);
    walker.finish()?;
    into_typed(normalized.map_or(Value::Null, Value::Object), &root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn explicit_type_selects_the_variant() -> Result<(), ValidationReport> {
        let backend = resolve_backend(
            None,
            &json!({"type": "google", "location": "us-east1", "systems": ["fedora-41-64"]}),
        )?;
        assert_eq!(backend.kind(), BackendKind::Google);
        Ok(())
    }

    #[test]
    fn mapping_key_supplies_the_implicit_type() -> Result<(), ValidationReport> {
        let backend = resolve_backend(Some("lxd"), &json!({"systems": ["ubuntu-24.04-64"]}))?;
        assert_eq!(backend.kind(), BackendKind::Lxd);
        Ok(())
    }

    #[test]
    fn unknown_type_is_a_discriminator_error() {
        let report = resolve_backend(
            None,
            &json!({"type": "made-up", "location": "us-east1", "systems": ["fedora-41-64"]}),
        )
        .err();
        let issue = report.as_ref().and_then(|report| report.at("type"));
        assert_eq!(issue.map(|issue| issue.kind), Some(IssueKind::DiscriminatorError));
        let message = issue.map(|issue| issue.message.as_str()).unwrap_or_default();
        assert!(message.contains("made-up"));
        assert!(message.contains("lxd, qemu, google, linode, adhoc"));
    }

    #[test]
    fn unknown_name_without_type_is_a_discriminator_error() {
        let report = resolve_backend(Some("cloud"), &json!({"systems": []})).err();
        assert_eq!(
            report.map(|report| report.has(IssueKind::DiscriminatorError, "(root)")),
            Some(true)
        );
    }

    #[test]
    fn type_must_agree_with_a_known_name() {
        let report = resolve_backend(
            Some("lxd"),
            &json!({"type": "qemu", "systems": ["ubuntu-24.04-64"]}),
        )
        .err();
        let issue = report.as_ref().and_then(|report| report.at("type"));
        assert_eq!(issue.map(|issue| issue.kind), Some(IssueKind::DiscriminatorError));
        let message = issue.map(|issue| issue.message.as_str()).unwrap_or_default();
        assert!(message.contains("lxd, qemu, google, linode, adhoc"));
    }

    #[test]
    fn null_type_is_a_discriminator_error() {
        for name in [Some("cloud"), Some("lxd"), None] {
            let report = resolve_backend(
                name,
                &json!({"type": null, "systems": ["ubuntu-24.04-64"]}),
            )
            .err();
            let issue = report.as_ref().and_then(|report| report.at("type"));
            assert_eq!(
                issue.map(|issue| issue.kind),
                Some(IssueKind::DiscriminatorError),
                "{name:?}"
            );
            let message = issue.map(|issue| issue.message.as_str()).unwrap_or_default();
            assert!(message.contains("found null"), "{message}");
        }
    }

    #[test]
    fn linode_requires_a_key() {
        let report = resolve_backend(
            Some("linode"),
            &json!({"plan": "g6-standard-2", "systems": ["debian-12-64"]}),
        )
        .err();
        assert_eq!(
            report.map(|report| report.has(IssueKind::MissingRequiredField, "key")),
            Some(true)
        );
    }

    #[test]
    fn missing_location_is_reported_at_relative_path() {
        let report = resolve_backend(None, &json!({"type": "google", "systems": ["fedora-41-64"]}))
            .err();
        assert_eq!(
            report.map(|report| report.has(IssueKind::MissingRequiredField, "location")),
            Some(true)
        );
    }

    #[test]
    fn sibling_variant_fields_are_rejected() {
        let report = resolve_backend(
            Some("lxd"),
            &json!({"systems": ["ubuntu-24.04-64"], "location": "us-east1"}),
        )
        .err();
        assert_eq!(
            report.map(|report| report.has(IssueKind::UnknownField, "location")),
            Some(true)
        );
    }

    #[test]
    fn adhoc_requires_both_scripts() {
        let report = resolve_backend(
            Some("adhoc"),
            &json!({"systems": ["ubuntu-24.04-64"], "allocate": "ADDRESS localhost"}),
        )
        .err();
        assert_eq!(
            report.map(|report| report.has(IssueKind::MissingRequiredField, "discard")),
            Some(true)
        );
    }

    #[test]
    fn non_mapping_entry_is_a_type_mismatch() {
        let report = resolve_backend(Some("lxd"), &json!("ubuntu")).err();
        assert_eq!(
            report.map(|report| report.has(IssueKind::TypeMismatch, "(root)")),
            Some(true)
        );
    }

    #[test]
    fn tags_round_trip() {
        for kind in BackendKind::ALL {
            assert_eq!(BackendKind::from_tag(kind.tag()), Some(kind));
            assert_eq!(kind.spec().field("type").map(|field| field.name), Some("type"));
        }
        assert_eq!(BackendKind::from_tag("LXD"), None);
    }
}
