//! Typed configuration entities.
//!
//! Values of these types only come out of validation (or out of
//! [`Entity::assign`], which re-runs it), so their invariants hold.
//! Serialization produces the canonical document: hyphenated keys, absent
//! optionals omitted, backends tagged with an explicit `type`.

use crate::backend::BackendKind;
use crate::fields::{EntitySpec, FieldKind, SPREAD_YAML, SUITE, SYSTEM, TASK_YAML};
use crate::issues::{FieldPath, IssueKind, ValidationIssue, ValidationReport};
use crate::suite::SuitePath;
use crate::timeout::Timeout;
use crate::walk::{Walker, into_typed};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use spread_schema_shared::SecretString;
use std::path::PathBuf;

/// Environment variables, in declaration order.
pub type Environment = IndexMap<String, String>;

/// A validated configuration entity whose fields can be re-assigned.
pub trait Entity: Serialize + DeserializeOwned {
    /// Field table this value is validated against.
    fn spec(&self) -> &'static EntitySpec;

    /// Re-assign one field, running the same coercion and validation as
    /// construction. `key` may use either naming form. On failure `self` is
    /// left unchanged.
    fn assign(&mut self, key: &str, raw: &Value) -> Result<(), ValidationReport> {
        let spec = self.spec();
        let path = FieldPath::root().key(key);
        let Some(field) = spec.field(key) else {
            return Err(ValidationReport::single(ValidationIssue::new(
                IssueKind::UnknownField,
                path,
                format!("unknown field `{key}`"),
            )));
        };

        let mut walker = Walker::new();
        let value = walker.field(field, raw, &path);
        walker.finish()?;
        if matches!(field.kind, FieldKind::Tag(_)) {
            return Ok(());
        }

        let mut current = match serde_json::to_value(&*self) {
            Ok(Value::Object(current)) => current,
            Ok(other) => {
                return Err(ValidationReport::single(ValidationIssue::new(
                    IssueKind::TypeMismatch,
                    FieldPath::root(),
                    format!("cannot assign into a non-mapping value: {other}"),
                )));
            },
            Err(error) => {
                return Err(ValidationReport::single(ValidationIssue::new(
                    IssueKind::TypeMismatch,
                    FieldPath::root(),
                    error.to_string(),
                )));
            },
        };
        current.insert(field.key(), value.unwrap_or(Value::Null));
        *self = into_typed(Value::Object(current), &path)?;
        Ok(())
    }
}

/// Lifecycle scripts shared by backends, suites, and the project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Lifecycle {
    /// Runs once per worker before any task.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prepare: Option<String>,
    /// Runs once per worker after all tasks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restore: Option<String>,
    /// Runs before each task.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prepare_each: Option<String>,
    /// Runs after each task.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restore_each: Option<String>,
    /// Runs when another script fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<String>,
    /// Runs when a per-task script fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_each: Option<String>,
}

/// Firmware type of a QEMU system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bios {
    /// UEFI firmware.
    Uefi,
}

/// Per-system overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct System {
    /// Image name; defaults to the system name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Login user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Login password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<SecretString>,
    /// Number of workers for this system.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<u64>,
    /// Memory allocation (`4G`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    /// Disk size (google and linode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
    /// Firmware (qemu).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bios: Option<Bios>,
    /// Secure boot (google).
    #[serde(default)]
    pub secure_boot: bool,
    /// System environment.
    #[serde(default)]
    pub environment: Environment,
    /// Only run when explicitly requested.
    #[serde(default)]
    pub manual: bool,
}

impl System {
    /// Image to boot for a system declared under `name`.
    #[must_use]
    pub fn image_for<'a>(&'a self, name: &'a str) -> &'a str {
        self.image.as_deref().unwrap_or(name)
    }
}

impl Entity for System {
    fn spec(&self) -> &'static EntitySpec {
        &SYSTEM
    }
}

/// One element of a backend's `systems` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SystemEntry {
    /// A system used as-is.
    Name(String),
    /// Systems with overrides, keyed by name.
    Custom(IndexMap<String, System>),
}

impl SystemEntry {
    /// Declared system names with their overrides, if any.
    pub fn systems(&self) -> Vec<(&str, Option<&System>)> {
        match self {
            Self::Name(name) => vec![(name.as_str(), None)],
            Self::Custom(systems) => systems
                .iter()
                .map(|(name, system)| (name.as_str(), Some(system)))
                .collect(),
        }
    }
}

/// Fields shared by every backend variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BackendBase {
    /// Lifecycle scripts.
    #[serde(flatten)]
    pub lifecycle: Lifecycle,
    /// Systems this backend starts.
    pub systems: Vec<SystemEntry>,
    /// Backend environment.
    #[serde(default)]
    pub environment: Environment,
}

impl BackendBase {
    /// Every declared system name, in order.
    pub fn system_names(&self) -> impl Iterator<Item = &str> {
        self.systems
            .iter()
            .flat_map(SystemEntry::systems)
            .map(|(name, _)| name)
    }
}

/// Local container backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LxdBackend {
    /// Shared backend fields.
    #[serde(flatten)]
    pub base: BackendBase,
}

/// Local virtual machine backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct QemuBackend {
    /// Shared backend fields.
    #[serde(flatten)]
    pub base: BackendBase,
    /// Memory per worker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
}

/// Google Cloud backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GoogleBackend {
    /// Shared backend fields.
    #[serde(flatten)]
    pub base: BackendBase,
    /// Credentials file; default credentials when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<SecretString>,
    /// Project and zone.
    pub location: String,
    /// Automatic shutdown timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub halt_timeout: Option<String>,
}

/// Linode backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LinodeBackend {
    /// Shared backend fields.
    #[serde(flatten)]
    pub base: BackendBase,
    /// API key.
    pub key: SecretString,
    /// Automatic shutdown timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub halt_timeout: Option<String>,
    /// Machine plan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    /// Data centre.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Custom-script backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AdhocBackend {
    /// Shared backend fields.
    #[serde(flatten)]
    pub base: BackendBase,
    /// Allocation script, run locally.
    pub allocate: String,
    /// Discard script, run locally.
    pub discard: String,
}

/// A backend, discriminated by its `type` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Backend {
    /// `type: lxd`
    Lxd(LxdBackend),
    /// `type: qemu`
    Qemu(QemuBackend),
    /// `type: google`
    Google(GoogleBackend),
    /// `type: linode`
    Linode(LinodeBackend),
    /// `type: adhoc`
    Adhoc(AdhocBackend),
}

impl Backend {
    /// Variant tag.
    #[must_use]
    pub const fn kind(&self) -> BackendKind {
        match self {
            Self::Lxd(_) => BackendKind::Lxd,
            Self::Qemu(_) => BackendKind::Qemu,
            Self::Google(_) => BackendKind::Google,
            Self::Linode(_) => BackendKind::Linode,
            Self::Adhoc(_) => BackendKind::Adhoc,
        }
    }

    /// Fields shared by every variant.
    #[must_use]
    pub const fn base(&self) -> &BackendBase {
        match self {
            Self::Lxd(backend) => &backend.base,
            Self::Qemu(backend) => &backend.base,
            Self::Google(backend) => &backend.base,
            Self::Linode(backend) => &backend.base,
            Self::Adhoc(backend) => &backend.base,
        }
    }

    /// Halt timeout for cloud backends.
    #[must_use]
    pub fn halt_timeout(&self) -> Option<Timeout> {
        let text = match self {
            Self::Google(backend) => backend.halt_timeout.as_deref(),
            Self::Linode(backend) => backend.halt_timeout.as_deref(),
            Self::Lxd(_) | Self::Qemu(_) | Self::Adhoc(_) => None,
        };
        parse_timeout(text)
    }
}

impl Entity for Backend {
    fn spec(&self) -> &'static EntitySpec {
        self.kind().spec()
    }
}

/// A suite of tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Suite {
    /// Lifecycle scripts.
    #[serde(flatten)]
    pub lifecycle: Lifecycle,
    /// What the suite tests.
    pub summary: String,
    /// Systems to run on; all when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub systems: Option<Vec<String>>,
    /// Backends to run on; all when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backends: Option<Vec<String>>,
    /// Suite environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    /// Warn timeout override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warn_timeout: Option<String>,
    /// Kill timeout override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kill_timeout: Option<String>,
    /// Only run when explicitly requested.
    #[serde(default)]
    pub manual: bool,
    /// Higher runs earlier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

impl Suite {
    /// Parsed warn timeout override.
    #[must_use]
    pub fn warn_after(&self) -> Option<Timeout> {
        parse_timeout(self.warn_timeout.as_deref())
    }

    /// Parsed kill timeout override.
    #[must_use]
    pub fn kill_after(&self) -> Option<Timeout> {
        parse_timeout(self.kill_timeout.as_deref())
    }
}

impl Entity for Suite {
    fn spec(&self) -> &'static EntitySpec {
        &SUITE
    }
}

/// A project document (spread.yaml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SpreadYaml {
    /// Lifecycle scripts.
    #[serde(flatten)]
    pub lifecycle: Lifecycle,
    /// Project name.
    pub project: String,
    /// Remote base path.
    pub path: PathBuf,
    /// Project environment.
    #[serde(default)]
    pub environment: Environment,
    /// Backends by name.
    pub backends: IndexMap<String, Backend>,
    /// Suites by path.
    pub suites: IndexMap<SuitePath, Suite>,
    /// Globs sent to workers.
    pub include: Vec<String>,
    /// Globs excluded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,
    /// Regex rename rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename: Option<Vec<String>>,
    /// Default warn timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warn_timeout: Option<String>,
    /// Default kill timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kill_timeout: Option<String>,
    /// Repack script.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repack: Option<String>,
}

impl SpreadYaml {
    /// Look up a suite by path.
    #[must_use]
    pub fn suite(&self, path: &str) -> Option<&Suite> {
        self.suites.get(path)
    }

    /// Look up a backend by name.
    #[must_use]
    pub fn backend(&self, name: &str) -> Option<&Backend> {
        self.backends.get(name)
    }

    /// Parsed default warn timeout.
    #[must_use]
    pub fn warn_after(&self) -> Option<Timeout> {
        parse_timeout(self.warn_timeout.as_deref())
    }

    /// Parsed default kill timeout.
    #[must_use]
    pub fn kill_after(&self) -> Option<Timeout> {
        parse_timeout(self.kill_timeout.as_deref())
    }
}

impl Entity for SpreadYaml {
    fn spec(&self) -> &'static EntitySpec {
        &SPREAD_YAML
    }
}

/// A task document (task.yaml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TaskYaml {
    /// What the task tests.
    pub summary: String,
    /// Paths fetched after the task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Vec<String>>,
    /// Task environment.
    #[serde(default)]
    pub environment: Option<Environment>,
    /// Preparation script.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prepare: Option<String>,
    /// Test script.
    pub execute: String,
    /// Restore script, run regardless of outcome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore: Option<String>,
    /// Debug script, run on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<String>,
    /// Only run when explicitly requested.
    #[serde(default)]
    pub manual: bool,
}

impl Entity for TaskYaml {
    fn spec(&self) -> &'static EntitySpec {
        &TASK_YAML
    }
}

fn parse_timeout(text: Option<&str>) -> Option<Timeout> {
    text.and_then(|text| Timeout::parse(text).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walk::validate_entity;
    use serde_json::json;
    use std::error::Error;

    fn task() -> Result<TaskYaml, ValidationReport> {
        validate_entity(&TASK_YAML, &json!({"summary": "s", "execute": "true"}))
    }

    #[test]
    fn assignment_coerces_like_construction() -> Result<(), Box<dyn Error>> {
        let mut task = task()?;
        task.assign("prepare", &json!(5))?;
        assert_eq!(task.prepare.as_deref(), Some("5"));
        task.assign("environment", &json!({"VERSION": 1.10}))?;
        assert_eq!(
            task.environment
                .as_ref()
                .and_then(|environment| environment.get("VERSION"))
                .map(String::as_str),
            Some("1.1")
        );
        Ok(())
    }

    #[test]
    fn failed_assignment_leaves_the_entity_unchanged() -> Result<(), Box<dyn Error>> {
        let mut task = task()?;
        let before = task.clone();
        let report = task.assign("manual", &json!("yes")).err();
        assert_eq!(
            report.map(|report| report.has(IssueKind::TypeMismatch, "manual")),
            Some(true)
        );
        assert_eq!(task, before);

        let report = task.assign("bogus", &json!(1)).err();
        assert_eq!(
            report.map(|report| report.has(IssueKind::UnknownField, "bogus")),
            Some(true)
        );
        assert_eq!(task, before);
        Ok(())
    }

    #[test]
    fn assignment_accepts_both_naming_forms() -> Result<(), Box<dyn Error>> {
        let mut suite: Suite = validate_entity(&SUITE, &json!({"summary": "s"}))?;
        suite.assign("kill-timeout", &json!("10m"))?;
        suite.assign("warn_timeout", &json!("-1"))?;
        assert_eq!(suite.kill_timeout.as_deref(), Some("10m"));
        assert_eq!(suite.warn_after(), Some(Timeout::Disabled));
        assert!(suite.assign("kill-timeout", &json!("ten minutes")).is_err());
        assert_eq!(suite.kill_timeout.as_deref(), Some("10m"));
        Ok(())
    }

    #[test]
    fn backend_assignment_uses_the_variant_fields() -> Result<(), Box<dyn Error>> {
        let mut backend =
            crate::backend::resolve_backend(Some("qemu"), &json!({"systems": ["ubuntu-24.04-64"]}))?;
        backend.assign("memory", &json!("4G"))?;
        assert!(matches!(&backend, Backend::Qemu(qemu) if qemu.memory.as_deref() == Some("4G")));
        assert!(backend.assign("location", &json!("us-east1")).is_err());
        assert!(backend.assign("type", &json!("lxd")).is_err());
        assert_eq!(backend.kind(), BackendKind::Qemu);
        Ok(())
    }

    #[test]
    fn canonical_serialization_uses_hyphenated_keys() -> Result<(), Box<dyn Error>> {
        let suite: Suite = validate_entity(
            &SUITE,
            &json!({"summary": "s", "prepare_each": "true", "kill_timeout": "1m"}),
        )?;
        let value = serde_json::to_value(&suite)?;
        assert_eq!(
            value,
            json!({"prepare-each": "true", "summary": "s", "kill-timeout": "1m", "manual": false})
        );
        Ok(())
    }

    #[test]
    fn system_image_defaults_to_its_name() {
        let system = System::default();
        assert_eq!(system.image_for("ubuntu-24.04-64"), "ubuntu-24.04-64");
        let system = System {
            image: Some("ubuntu-os-cloud/ubuntu-2404-lts".to_string()),
            ..System::default()
        };
        assert_eq!(system.image_for("ubuntu-24.04-64"), "ubuntu-os-cloud/ubuntu-2404-lts");
    }

    #[test]
    fn passwords_are_redacted_in_debug_output() -> Result<(), Box<dyn Error>> {
        let system: System = validate_entity(&SYSTEM, &json!({"password": "hunter2"}))?;
        assert!(!format!("{system:?}").contains("hunter2"));
        assert_eq!(
            system.password.as_ref().map(SecretString::expose),
            Some("hunter2")
        );
        Ok(())
    }
}
