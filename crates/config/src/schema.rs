//! JSON Schema emission.
//!
//! Schemas are derived from the same field tables the validator walks; no
//! validation code runs here. Output is deterministic: properties follow
//! declaration order and definitions are sorted by name.

use crate::backend::{BackendKind, TAG_FIELD};
use crate::fields::{
    EntitySpec, FieldKind, FieldSpec, Presence, SPREAD_YAML, SUITE, SYSTEM, TASK_YAML,
};
use crate::suite::SUITE_PATH_PATTERN;
use crate::timeout::TIMEOUT_PATTERN;
use schemars::Schema;
use serde_json::{Map, Value, json};

/// JSON Schema dialect of emitted documents.
pub const JSON_SCHEMA_DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Schema for spread.yaml.
#[must_use]
pub fn spread_schema() -> Schema {
    root_schema(&SPREAD_YAML)
}

/// Schema for task.yaml.
#[must_use]
pub fn task_schema() -> Schema {
    root_schema(&TASK_YAML)
}

/// Render a schema as pretty JSON (two-space indent) with a trailing newline.
pub fn to_pretty_json(schema: &Schema) -> Result<String, serde_json::Error> {
    let mut output = serde_json::to_string_pretty(schema)?;
    output.push('\n');
    Ok(output)
}

fn root_schema(spec: &'static EntitySpec) -> Schema {
    let mut definitions = Vec::new();
    collect_definitions(spec, &mut definitions);
    definitions.sort_by_key(|definition| definition.name);

    let mut root = Map::new();
    root.insert("$schema".to_string(), json!(JSON_SCHEMA_DIALECT));
    root.extend(entity_schema(spec));
    if !definitions.is_empty() {
        let definitions = definitions
            .into_iter()
            .map(|definition| {
                (
                    definition.name.to_string(),
                    Value::Object(entity_schema(definition)),
                )
            })
            .collect();
        root.insert("$defs".to_string(), Value::Object(definitions));
    }
    Schema::from(root)
}

fn referenced(kind: FieldKind) -> Vec<&'static EntitySpec> {
    match kind {
        FieldKind::Systems => vec![&SYSTEM],
        FieldKind::Backends => BackendKind::ALL.into_iter().map(BackendKind::spec).collect(),
        FieldKind::Suites => vec![&SUITE],
        _ => Vec::new(),
    }
}

fn collect_definitions(spec: &'static EntitySpec, found: &mut Vec<&'static EntitySpec>) {
    for field in spec.fields() {
        for definition in referenced(field.kind) {
            if found.iter().any(|seen| seen.name == definition.name) {
                continue;
            }
            found.push(definition);
            collect_definitions(definition, found);
        }
    }
}

fn definition_ref(name: &str) -> Value {
    json!({ "$ref": format!("#/$defs/{name}") })
}

fn entity_schema(spec: &EntitySpec) -> Map<String, Value> {
    let mut schema = Map::new();
    schema.insert("title".to_string(), json!(spec.name));
    if let Some(description) = spec.description {
        schema.insert("description".to_string(), json!(description));
    }
    schema.insert("type".to_string(), json!("object"));

    let properties: Map<String, Value> = spec
        .fields()
        .map(|field| (field.key(), Value::Object(field_schema(field))))
        .collect();
    schema.insert("properties".to_string(), Value::Object(properties));

    let required: Vec<Value> = spec
        .fields()
        .filter(|field| matches!(field.presence, Presence::Required))
        .map(|field| Value::String(field.key()))
        .collect();
    if !required.is_empty() {
        schema.insert("required".to_string(), Value::Array(required));
    }
    schema.insert("additionalProperties".to_string(), Value::Bool(false));
    schema
}

fn field_schema(field: &FieldSpec) -> Map<String, Value> {
    let mut schema = kind_schema(field.kind);
    if field.presence.accepts_null() {
        allow_null(&mut schema);
    }
    if let Some(description) = field.description {
        schema.insert("description".to_string(), json!(description));
    }
    match field.presence {
        Presence::Required => {},
        Presence::Optional => {
            schema.insert("default".to_string(), Value::Null);
        },
        Presence::Default(make) | Presence::Nullable(make) => {
            schema.insert("default".to_string(), make());
        },
    }
    if let Some(examples) = field.examples {
        schema.insert("examples".to_string(), Value::Array(examples()));
    }
    schema
}

/// Scalars the coercion layer turns into strings.
fn coerced_text() -> Value {
    json!({ "type": ["string", "number", "boolean"] })
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn kind_schema(kind: FieldKind) -> Map<String, Value> {
    let schema = match kind {
        FieldKind::Text | FieldKind::Secret => coerced_text(),
        FieldKind::Timeout => json!({
            "anyOf": [
                { "type": "string", "pattern": TIMEOUT_PATTERN },
                { "enum": [-1, 0] },
            ]
        }),
        FieldKind::Path => json!({ "type": "string", "format": "path" }),
        FieldKind::Flag => json!({ "type": "boolean" }),
        FieldKind::Integer { minimum } => match minimum {
            Some(minimum) => json!({ "type": "integer", "minimum": minimum }),
            None => json!({ "type": "integer" }),
        },
        FieldKind::Bios => json!({ "enum": ["uefi", null] }),
        FieldKind::TextList => json!({ "type": "array", "items": coerced_text() }),
        FieldKind::Environment => json!({ "type": "object", "additionalProperties": coerced_text() }),
        FieldKind::Systems => json!({
            "type": "array",
            "items": {
                "anyOf": [
                    coerced_text(),
                    { "type": "object", "additionalProperties": definition_ref(SYSTEM.name) },
                ]
            }
        }),
        FieldKind::Backends => backends_schema(),
        FieldKind::Suites => json!({
            "type": "object",
            "propertyNames": {
                "description": "The relative path to a suite.",
                "pattern": SUITE_PATH_PATTERN,
            },
            "additionalProperties": definition_ref(SUITE.name),
        }),
        FieldKind::Tag(tag) => json!({ "type": "string", "const": tag }),
    };
    object(schema)
}

/// Backends stored under a variant's own name may omit `type`; any other
/// name must carry an explicit `type` that selects exactly one variant.
fn backends_schema() -> Value {
    let properties: Map<String, Value> = BackendKind::ALL
        .into_iter()
        .map(|kind| (kind.tag().to_string(), definition_ref(kind.spec().name)))
        .collect();
    let variants: Vec<Value> = BackendKind::ALL
        .into_iter()
        .map(|kind| definition_ref(kind.spec().name))
        .collect();
    let mapping: Map<String, Value> = BackendKind::ALL
        .into_iter()
        .map(|kind| {
            (
                kind.tag().to_string(),
                json!(format!("#/$defs/{}", kind.spec().name)),
            )
        })
        .collect();
    json!({
        "type": "object",
        "properties": properties,
        "additionalProperties": {
            "oneOf": variants,
            "discriminator": { "propertyName": TAG_FIELD, "mapping": mapping },
            "required": [TAG_FIELD],
        },
    })
}

fn allow_null(schema: &mut Map<String, Value>) {
    if let Some(kind) = schema.get_mut("type") {
        let widened = match kind.take() {
            Value::String(single) => json!([single, "null"]),
            Value::Array(mut kinds) => {
                kinds.push(json!("null"));
                Value::Array(kinds)
            },
            other => other,
        };
        *kind = widened;
    } else if let Some(Value::Array(options)) = schema.get_mut("anyOf") {
        options.push(json!({ "type": "null" }));
    } else if let Some(Value::Array(options)) = schema.get_mut("enum") {
        if !options.contains(&Value::Null) {
            options.push(Value::Null);
        }
    }
}
