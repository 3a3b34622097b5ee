//! Declarative field tables.
//!
//! Each entity is described once, as a static table of fields. The
//! validator walks these tables to check raw documents and the schema
//! emitter serializes them, so both always agree on names, types, defaults,
//! and requiredness.

use crate::naming;
use serde_json::{Value, json};

/// Value type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// String; numbers and booleans are coerced.
    Text,
    /// Credential string; coerced like [`FieldKind::Text`], redacted in memory.
    Secret,
    /// Duration string (`30s`, `1m30s`) or `-1` to disable.
    Timeout,
    /// Filesystem path; must already be a string.
    Path,
    /// Boolean, never coerced.
    Flag,
    /// Integer, optionally bounded below.
    Integer {
        /// Smallest accepted value.
        minimum: Option<i64>,
    },
    /// The literal `"uefi"`, or null.
    Bios,
    /// List of coerced strings.
    TextList,
    /// Mapping of variable name to coerced string.
    Environment,
    /// List of system names or `{name: System}` overrides.
    Systems,
    /// Mapping of backend name to backend.
    Backends,
    /// Mapping of suite path to suite.
    Suites,
    /// Literal discriminator tag of a backend variant.
    Tag(&'static str),
}

/// Whether a field must be supplied and what it defaults to.
#[derive(Debug, Clone, Copy)]
pub enum Presence {
    /// Must be supplied.
    Required,
    /// May be absent or null; absent means null.
    Optional,
    /// Filled with the default when absent; null is rejected.
    Default(fn() -> Value),
    /// Filled with the default when absent; null is kept.
    Nullable(fn() -> Value),
}

impl Presence {
    /// Returns true when an explicit null is accepted.
    #[must_use]
    pub const fn accepts_null(self) -> bool {
        matches!(self, Self::Optional | Self::Nullable(_))
    }

    /// Default value filled in when the field is absent.
    #[must_use]
    pub fn default_value(self) -> Option<Value> {
        match self {
            Self::Default(make) | Self::Nullable(make) => Some(make()),
            Self::Required | Self::Optional => None,
        }
    }
}

/// One declared field of an entity.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Internal (underscored) identifier.
    pub name: &'static str,
    /// Value type.
    pub kind: FieldKind,
    /// Requiredness and default.
    pub presence: Presence,
    /// Human-readable description.
    pub description: Option<&'static str>,
    /// Example values.
    pub examples: Option<fn() -> Vec<Value>>,
}

impl FieldSpec {
    const fn new(name: &'static str, kind: FieldKind, presence: Presence) -> Self {
        Self {
            name,
            kind,
            presence,
            description: None,
            examples: None,
        }
    }

    const fn describe(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    const fn examples(mut self, examples: fn() -> Vec<Value>) -> Self {
        self.examples = Some(examples);
        self
    }

    /// External (hyphenated) key.
    #[must_use]
    pub fn key(&self) -> String {
        naming::to_external(self.name)
    }
}

/// A configuration entity: a named, closed set of fields.
#[derive(Debug)]
pub struct EntitySpec {
    /// Entity name, used as the schema definition name.
    pub name: &'static str,
    /// Human-readable description.
    pub description: Option<&'static str>,
    /// Field groups in declaration order; shared groups come first.
    pub groups: &'static [&'static [FieldSpec]],
}

impl EntitySpec {
    /// All fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &'static FieldSpec> + '_ {
        self.groups.iter().flat_map(|group| group.iter())
    }

    /// Look up a field by either naming form.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&'static FieldSpec> {
        self.fields()
            .find(|field| naming::matches_field(key, field.name))
    }
}

use FieldKind::{
    Backends, Bios, Environment, Flag, Path, Secret, Suites, Systems, Tag, Text, TextList,
    Timeout,
};
use Presence::{Nullable, Optional, Required};

fn empty_mapping() -> Value {
    json!({})
}

fn falsy() -> Value {
    Value::Bool(false)
}

fn include_all() -> Value {
    json!(["*"])
}

fn timeout_examples() -> Vec<Value> {
    vec![json!("30s"), json!("1m30s"), json!("10m"), json!("1.5h")]
}

fn halt_timeout_examples() -> Vec<Value> {
    vec![json!("6h")]
}

const fn defaulted(make: fn() -> Value) -> Presence {
    Presence::Default(make)
}

/// Lifecycle scripts shared by backends, suites, and the project document.
pub const LIFECYCLE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("prepare", Text, Optional).describe("prepare script. Runs once per worker."),
    FieldSpec::new("restore", Text, Optional).describe("restore script. Runs once per worker."),
    FieldSpec::new("prepare_each", Text, Optional)
        .describe("prepare-each script. Runs once per task."),
    FieldSpec::new("restore_each", Text, Optional)
        .describe("restore-each script. Runs once per task."),
    FieldSpec::new("debug", Text, Optional).describe("Script to run when other scripts fail."),
    FieldSpec::new("debug_each", Text, Optional)
        .describe("Debug script to run when each script fails"),
];

const SYSTEM_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("image", Text, Optional)
        .describe("The name of the image to use. Defaults to the system name."),
    FieldSpec::new("username", Text, Optional),
    FieldSpec::new("password", Secret, Optional),
    FieldSpec::new(
        "workers",
        FieldKind::Integer { minimum: Some(0) },
        Optional,
    ),
    FieldSpec::new("memory", Text, Optional),
    FieldSpec::new("storage", Text, Optional)
        .describe("Storage to set on the system. Only used by google and linode backends."),
    FieldSpec::new("bios", Bios, Optional)
        .describe("Bios type to use. Only used by QEMU backend."),
    FieldSpec::new("secure_boot", Flag, defaulted(falsy))
        .describe("Whether to use secure boot. Only used by the Google backend."),
    FieldSpec::new("environment", Environment, defaulted(empty_mapping))
        .describe("Environment variables to set on this system."),
    FieldSpec::new("manual", Flag, defaulted(falsy))
        .describe("Whether to run this system manually. Defaults to false."),
];

/// A customised system.
pub static SYSTEM: EntitySpec = EntitySpec {
    name: "System",
    description: Some("A customised system."),
    groups: &[SYSTEM_FIELDS],
};

fn systems_examples() -> Vec<Value> {
    vec![json!("fedora-41-64"), json!({"ubuntu-24.04-64": {"workers": 4}})]
}

const BACKEND_BASE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("systems", Systems, Required)
        .describe("Operating systems and versions that this backend will start.")
        .examples(systems_examples),
    FieldSpec::new("environment", Environment, defaulted(empty_mapping))
        .describe("Environment variables to set on this backend."),
];

const LXD_FIELDS: &[FieldSpec] = &[FieldSpec::new(
    "type",
    Tag("lxd"),
    defaulted(|| json!("lxd")),
)];

const QEMU_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("type", Tag("qemu"), defaulted(|| json!("qemu"))),
    FieldSpec::new("memory", Text, Optional)
        .describe("The amount of memory to provide to each worker."),
];

const GOOGLE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("type", Tag("google"), defaulted(|| json!("google"))),
    FieldSpec::new("key", Secret, Optional)
        .describe(
            "Path to a Google key JSON file. If unset, uses the current user's default credentials.",
        )
        .examples(|| vec![json!("$(HOST:echo $GOOGLE_JSON_FILENAME)")]),
    FieldSpec::new("location", Text, Required),
    FieldSpec::new("halt_timeout", Timeout, Optional)
        .describe("Timeout after which the systems will automatically shutdown.")
        .examples(halt_timeout_examples),
];

const LINODE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("type", Tag("linode"), defaulted(|| json!("linode"))),
    FieldSpec::new("key", Secret, Required)
        .describe("Linode API key")
        .examples(|| vec![json!("$(HOST:echo $LINODE_API_KEY)")]),
    FieldSpec::new("halt_timeout", Timeout, Optional)
        .describe("Timeout after which the systems will automatically shutdown.")
        .examples(halt_timeout_examples),
    FieldSpec::new("plan", Text, Optional)
        .describe("The plan to use when allocating new machines."),
    FieldSpec::new("location", Text, Optional)
        .describe("The data centre in which to allocate new machines."),
];

const ADHOC_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("type", Tag("adhoc"), defaulted(|| json!("adhoc"))),
    FieldSpec::new("allocate", Text, Required)
        .describe("Allocation script. Runs on the local machine."),
    FieldSpec::new("discard", Text, Required)
        .describe("Discard script. Runs on the local machine."),
];

/// Local container backend.
pub static LXD_BACKEND: EntitySpec = EntitySpec {
    name: "LxdBackend",
    description: None,
    groups: &[LIFECYCLE_FIELDS, BACKEND_BASE_FIELDS, LXD_FIELDS],
};

/// Local virtual machine backend.
pub static QEMU_BACKEND: EntitySpec = EntitySpec {
    name: "QemuBackend",
    description: None,
    groups: &[LIFECYCLE_FIELDS, BACKEND_BASE_FIELDS, QEMU_FIELDS],
};

/// Google Cloud backend.
pub static GOOGLE_BACKEND: EntitySpec = EntitySpec {
    name: "GoogleBackend",
    description: Some(
        "A backend running on Google Cloud.\n\nSee the documentation for more info:\nhttps://github.com/canonical/spread?tab=readme-ov-file#google",
    ),
    groups: &[LIFECYCLE_FIELDS, BACKEND_BASE_FIELDS, GOOGLE_FIELDS],
};

/// Linode backend.
pub static LINODE_BACKEND: EntitySpec = EntitySpec {
    name: "LinodeBackend",
    description: None,
    groups: &[LIFECYCLE_FIELDS, BACKEND_BASE_FIELDS, LINODE_FIELDS],
};

/// Custom-script backend.
pub static ADHOC_BACKEND: EntitySpec = EntitySpec {
    name: "AdhocBackend",
    description: Some(
        "A backend which allows creating machines using custom scripts.\n\nhttps://github.com/canonical/spread?tab=readme-ov-file#adhoc",
    ),
    groups: &[LIFECYCLE_FIELDS, BACKEND_BASE_FIELDS, ADHOC_FIELDS],
};

const SUITE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("summary", Text, Required).describe("A summary of the tests in this suite."),
    FieldSpec::new("systems", TextList, Optional)
        .describe("A list of systems to test on. Defaults to all available."),
    FieldSpec::new("backends", TextList, Optional)
        .describe("Backends to run this suite on. Defaults to all available."),
    FieldSpec::new("environment", Environment, Optional)
        .describe("Environment variables to set in this test suite."),
    FieldSpec::new("warn_timeout", Timeout, Optional)
        .describe(
            "Default warn timeout for tests in this suite. Defaults to the project warn-timeout. -1 will disable timeout altogether.",
        )
        .examples(timeout_examples),
    FieldSpec::new("kill_timeout", Timeout, Optional)
        .describe(
            "Default kill timeout for tests in this suite. Defaults to the project kill-timeout. -1 will disable timeout altogether.",
        )
        .examples(timeout_examples),
    FieldSpec::new("manual", Flag, defaulted(falsy))
        .describe("Only run this suite when explicitly specified."),
    FieldSpec::new("priority", FieldKind::Integer { minimum: None }, Optional)
        .describe("Priority for this suite. Higher runs earlier."),
];

/// A suite of tasks.
pub static SUITE: EntitySpec = EntitySpec {
    name: "Suite",
    description: Some("Processed spread suite configuration."),
    groups: &[LIFECYCLE_FIELDS, SUITE_FIELDS],
};

const SPREAD_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("project", Text, Required)
        .describe("The name of the project")
        .examples(|| vec![json!("hello-world")]),
    FieldSpec::new("path", Path, Required)
        .describe("The base path to copy to on the remote machine."),
    FieldSpec::new("environment", Environment, defaulted(empty_mapping))
        .describe("Environment variables to set across the entire project."),
    FieldSpec::new("backends", Backends, Required).describe("Backend configuration"),
    FieldSpec::new("suites", Suites, Required),
    FieldSpec::new("include", TextList, defaulted(include_all))
        .describe("A list of path globs to send to each worker."),
    FieldSpec::new("exclude", TextList, Optional).describe("A list of path globs to exclude."),
    FieldSpec::new("rename", TextList, Optional)
        .describe("A list of regex replacements for renaming or moving files."),
    FieldSpec::new("warn_timeout", Timeout, Optional)
        .describe(
            "Default warn timeout for tests. Defaults to 5 minutes. -1 will disable timeout altogether.",
        )
        .examples(timeout_examples),
    FieldSpec::new("kill_timeout", Timeout, Optional)
        .describe(
            "Default kill timeout for tests. Defaults to 15 minutes. -1 will disable timeout altogether.",
        )
        .examples(timeout_examples),
    FieldSpec::new("repack", Text, Optional).describe(
        "Script to run when repacking the data. File descriptors 3 and 4, respectively, are pipes for the specified project content into and out of the script, in tar format.",
    ),
];

/// The project document (spread.yaml).
pub static SPREAD_YAML: EntitySpec = EntitySpec {
    name: "SpreadYaml",
    description: Some("A spread configuration file (spread.yaml)."),
    groups: &[LIFECYCLE_FIELDS, SPREAD_FIELDS],
};

const TASK_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("summary", Text, Required).describe("A brief summary of this task"),
    FieldSpec::new("artifacts", TextList, Optional)
        .describe("Artifact paths to fetch after the test completes."),
    FieldSpec::new("environment", Environment, Nullable(empty_mapping))
        .describe("Environment variables for this test."),
    FieldSpec::new("prepare", Text, Optional).describe("Preparation to do for this task."),
    FieldSpec::new("execute", Text, Required)
        .describe("The script where the actual testing is run."),
    FieldSpec::new("restore", Text, Optional)
        .describe("Restore script. Runs after the task regardless of success."),
    FieldSpec::new("debug", Text, Optional).describe("Debug script to run if the test fails."),
    FieldSpec::new("manual", Flag, defaulted(falsy))
        .describe("Set to true to run this test only manually."),
];

/// The task document (task.yaml).
pub static TASK_YAML: EntitySpec = EntitySpec {
    name: "TaskYaml",
    description: Some("task.yaml, a single task for spread."),
    groups: &[TASK_FIELDS],
};
