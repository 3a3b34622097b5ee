//! Table-driven validation of raw documents.
//!
//! The walker checks a raw value against an [`EntitySpec`], collecting every
//! issue instead of stopping at the first. Its output is a normalized tree:
//! hyphenated keys, defaults filled in, strings coerced, and backend tags
//! made explicit. That tree deserializes directly into the typed model.

use crate::backend;
use crate::coerce::{coerce_string, integral, type_name};
use crate::fields::{EntitySpec, FieldKind, FieldSpec, Presence, SUITE, SYSTEM};
use crate::issues::{FieldPath, IssueKind, ValidationIssue, ValidationReport};
use crate::suite::check_suite_path;
use crate::timeout::Timeout;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Issue collector for a single validation pass.
#[derive(Debug, Default)]
pub(crate) struct Walker {
    issues: Vec<ValidationIssue>,
}

impl Walker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn report(&mut self, kind: IssueKind, path: FieldPath, message: impl Into<String>) {
        self.issues.push(ValidationIssue::new(kind, path, message));
    }

    fn mismatch(&mut self, path: &FieldPath, message: impl Into<String>) {
        self.report(IssueKind::TypeMismatch, path.clone(), message);
    }

    /// Fail with the collected issues, if any.
    pub(crate) fn finish(self) -> Result<(), ValidationReport> {
        ValidationReport::from_issues(self.issues).map_or(Ok(()), Err)
    }

    /// Validate a raw mapping against an entity's field table.
    pub(crate) fn entity(
        &mut self,
        spec: &EntitySpec,
        raw: &Value,
        path: &FieldPath,
    ) -> Option<Map<String, Value>> {
        let Value::Object(raw_map) = raw else {
            self.mismatch(path, format!("expected a mapping, found {}", type_name(raw)));
            return None;
        };

        let mut supplied: Vec<(&'static FieldSpec, &str, &Value)> = Vec::new();
        for (key, value) in raw_map {
            let Some(field) = spec.field(key) else {
                self.report(
                    IssueKind::UnknownField,
                    path.key(key.as_str()),
                    format!("unknown field `{key}`"),
                );
                continue;
            };
            if supplied.iter().any(|(seen, ..)| seen.name == field.name) {
                self.report(
                    IssueKind::UnknownField,
                    path.key(key.as_str()),
                    format!("`{key}` duplicates field `{}`", field.key()),
                );
                continue;
            }
            supplied.push((field, key.as_str(), value));
        }

        let mut normalized = Map::new();
        for field in spec.fields() {
            let key = field.key();
            let written = supplied
                .iter()
                .find(|(seen, ..)| seen.name == field.name)
                .map(|(_, written, value)| (*written, *value));
            match (written, field.presence) {
                (Some((written, value)), _) => {
                    if let Some(value) = self.field(field, value, &path.key(written)) {
                        normalized.insert(key, value);
                    }
                },
                (None, Presence::Required) => {
                    let message = format!("missing required field `{key}`");
                    self.report(IssueKind::MissingRequiredField, path.key(key), message);
                },
                (None, Presence::Optional) => {},
                (None, Presence::Default(make) | Presence::Nullable(make)) => {
                    normalized.insert(key, make());
                },
            }
        }
        Some(normalized)
    }

    /// Validate and normalize a single field value.
    pub(crate) fn field(
        &mut self,
        field: &FieldSpec,
        raw: &Value,
        path: &FieldPath,
    ) -> Option<Value> {
        if raw.is_null() {
            if field.presence.accepts_null() {
                return Some(Value::Null);
            }
            self.mismatch(path, format!("expected {}, found null", expected(field.kind)));
            return None;
        }

        match field.kind {
            FieldKind::Text | FieldKind::Secret => self.text(raw, path).map(Value::String),
            FieldKind::Timeout => {
                let text = match (raw, integral(raw)) {
                    (Value::Number(_), Some(number @ (-1 | 0))) => number.to_string(),
                    _ => self.text(raw, path)?,
                };
                match Timeout::parse(&text) {
                    Ok(_) => Some(Value::String(text)),
                    Err(error) => {
                        self.report(IssueKind::PatternViolation, path.clone(), error.to_string());
                        None
                    },
                }
            },
            FieldKind::Path => match raw {
                Value::String(_) => Some(raw.clone()),
                other => {
                    self.mismatch(path, format!("expected a path string, found {}", type_name(other)));
                    None
                },
            },
            FieldKind::Flag => match raw {
                Value::Bool(_) => Some(raw.clone()),
                other => {
                    self.mismatch(path, format!("expected a boolean, found {}", type_name(other)));
                    None
                },
            },
            FieldKind::Integer { minimum } => self.integer(raw, path, minimum),
            FieldKind::Bios => match raw {
                Value::String(bios) if bios == "uefi" => Some(raw.clone()),
                Value::String(bios) => {
                    self.report(
                        IssueKind::PatternViolation,
                        path.clone(),
                        format!("bios must be `uefi` or null, found `{bios}`"),
                    );
                    None
                },
                other => {
                    self.mismatch(path, format!("expected `uefi` or null, found {}", type_name(other)));
                    None
                },
            },
            FieldKind::TextList => self.text_list(raw, path),
            FieldKind::Environment => self.environment(raw, path),
            FieldKind::Systems => self.systems(raw, path),
            FieldKind::Backends => self.backends(raw, path),
            FieldKind::Suites => self.suites(raw, path),
            FieldKind::Tag(tag) => match raw {
                Value::String(found) if found == tag => Some(raw.clone()),
                other => {
                    self.report(
                        IssueKind::DiscriminatorError,
                        path.clone(),
                        format!("expected backend type `{tag}`, found {other}"),
                    );
                    None
                },
            },
        }
    }

    fn text(&mut self, raw: &Value, path: &FieldPath) -> Option<String> {
        match coerce_string(raw) {
            Ok(text) => Some(text),
            Err(error) => {
                self.mismatch(path, error.to_string());
                None
            },
        }
    }

    fn integer(&mut self, raw: &Value, path: &FieldPath, minimum: Option<i64>) -> Option<Value> {
        let Some(number) = integral(raw) else {
            let found = if raw.is_number() {
                raw.to_string()
            } else {
                type_name(raw).to_string()
            };
            self.mismatch(path, format!("expected an integer, found {found}"));
            return None;
        };
        match minimum {
            Some(minimum) if number < minimum => {
                self.report(
                    IssueKind::PatternViolation,
                    path.clone(),
                    format!("must be at least {minimum}, found {number}"),
                );
                None
            },
            _ => Some(Value::from(number)),
        }
    }

    fn text_list(&mut self, raw: &Value, path: &FieldPath) -> Option<Value> {
        let Value::Array(items) = raw else {
            self.mismatch(path, format!("expected a list of strings, found {}", type_name(raw)));
            return None;
        };
        let texts = items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| self.text(item, &path.index(index)))
            .map(Value::String)
            .collect();
        Some(Value::Array(texts))
    }

    fn environment(&mut self, raw: &Value, path: &FieldPath) -> Option<Value> {
        let Value::Object(variables) = raw else {
            self.mismatch(path, format!("expected a mapping of variables, found {}", type_name(raw)));
            return None;
        };
        let mut normalized = Map::new();
        for (name, value) in variables {
            if let Some(text) = self.text(value, &path.key(name.as_str())) {
                normalized.insert(name.clone(), Value::String(text));
            }
        }
        Some(Value::Object(normalized))
    }

    fn systems(&mut self, raw: &Value, path: &FieldPath) -> Option<Value> {
        let Value::Array(entries) = raw else {
            self.mismatch(path, format!("expected a list of systems, found {}", type_name(raw)));
            return None;
        };
        let mut normalized = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let entry_path = path.index(index);
            match entry {
                Value::Object(overrides) => {
                    let mut systems = Map::new();
                    for (name, system) in overrides {
                        let system_path = entry_path.key(name.as_str());
                        if let Some(system) = self.entity(&SYSTEM, system, &system_path) {
                            systems.insert(name.clone(), Value::Object(system));
                        }
                    }
                    normalized.push(Value::Object(systems));
                },
                Value::Null | Value::Array(_) => self.mismatch(
                    &entry_path,
                    format!(
                        "expected a system name or a mapping of name to system, found {}",
                        type_name(entry)
                    ),
                ),
                scalar => {
                    if let Some(name) = self.text(scalar, &entry_path) {
                        normalized.push(Value::String(name));
                    }
                },
            }
        }
        Some(Value::Array(normalized))
    }

    fn backends(&mut self, raw: &Value, path: &FieldPath) -> Option<Value> {
        let Value::Object(entries) = raw else {
            self.mismatch(path, format!("expected a mapping of backends, found {}", type_name(raw)));
            return None;
        };
        let mut normalized = Map::new();
        for (name, entry) in entries {
            let entry_path = path.key(name.as_str());
            if let Some(backend) = backend::resolve_entry(self, Some(name), entry, &entry_path) {
                normalized.insert(name.clone(), Value::Object(backend));
            }
        }
        Some(Value::Object(normalized))
    }

    fn suites(&mut self, raw: &Value, path: &FieldPath) -> Option<Value> {
        let Value::Object(entries) = raw else {
            self.mismatch(path, format!("expected a mapping of suites, found {}", type_name(raw)));
            return None;
        };
        let mut normalized = Map::new();
        for (suite_path, suite) in entries {
            let entry_path = path.key(suite_path.as_str());
            if let Err(error) = check_suite_path(suite_path) {
                self.report(IssueKind::PatternViolation, entry_path.clone(), error.to_string());
            }
            if let Some(suite) = self.entity(&SUITE, suite, &entry_path) {
                normalized.insert(suite_path.clone(), Value::Object(suite));
            }
        }
        Some(Value::Object(normalized))
    }
}

const fn expected(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Text | FieldKind::Secret | FieldKind::Timeout => "a string",
        FieldKind::Path => "a path string",
        FieldKind::Flag => "a boolean",
        FieldKind::Integer { .. } => "an integer",
        FieldKind::Bios => "`uefi`",
        FieldKind::TextList => "a list of strings",
        FieldKind::Environment => "a mapping of variables",
        FieldKind::Systems => "a list of systems",
        FieldKind::Backends => "a mapping of backends",
        FieldKind::Suites => "a mapping of suites",
        FieldKind::Tag(_) => "a backend type",
    }
}

/// Deserialize a normalized tree into its typed form.
///
/// The walker has already checked every field, so a failure here means the
/// typed model and the field tables disagree; it is still reported as an
/// issue rather than a panic.
pub(crate) fn into_typed<T: DeserializeOwned>(
    normalized: Value,
    path: &FieldPath,
) -> Result<T, ValidationReport> {
    serde_json::from_value(normalized).map_err(|error| {
        ValidationReport::single(ValidationIssue::new(
            IssueKind::TypeMismatch,
            path.clone(),
            error.to_string(),
        ))
    })
}

/// Validate a raw document against `spec` and build the typed entity.
pub(crate) fn validate_entity<T: DeserializeOwned>(
    spec: &EntitySpec,
    raw: &Value,
) -> Result<T, ValidationReport> {
    let mut walker = Walker::new();
    let root = FieldPath::root();
    let normalized = walker.entity(spec, raw, &root);
    walker.finish()?;
    let normalized = normalized.map_or(Value::Null, Value::Object);
    into_typed(normalized, &root)
}
