//! The emitted JSON Schema accepts exactly what the validator accepts on the
//! fixture corpus.

use jsonschema::{Draft, JSONSchema};
use serde_json::Value;
use spread_schema_config::{
    parse_yaml_document, spread_schema, task_schema, to_pretty_json, validate_project,
    validate_task,
};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

fn fixture_dir(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn compile(schema: &Value) -> Result<JSONSchema, Box<dyn Error>> {
    JSONSchema::options()
        .with_draft(Draft::Draft202012)
        .compile(schema)
        .map_err(|error| format!("schema does not compile: {error}").into())
}

/// Hyphenated fixtures only; the schema describes the canonical naming form.
fn fixtures(dir: &str) -> Result<Vec<(String, Value)>, Box<dyn Error>> {
    let mut documents = Vec::new();
    for entry in fs::read_dir(fixture_dir(dir))? {
        let path = entry?.path();
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        if name.contains("underscore") {
            continue;
        }
        let raw = parse_yaml_document(&fs::read_to_string(&path)?)?;
        documents.push((name, raw));
    }
    documents.sort_by(|left, right| left.0.cmp(&right.0));
    Ok(documents)
}

#[test]
fn emitted_schemas_compile() -> Result<(), Box<dyn Error>> {
    compile(&serde_json::to_value(spread_schema())?)?;
    compile(&serde_json::to_value(task_schema())?)?;
    Ok(())
}

#[test]
fn schema_and_validator_agree_on_fixtures() -> Result<(), Box<dyn Error>> {
    let project = compile(&serde_json::to_value(spread_schema())?)?;
    let task = compile(&serde_json::to_value(task_schema())?)?;

    let mut checked = 0;
    for dir in ["valid", "invalid"] {
        for (name, raw) in fixtures(dir)? {
            let (by_schema, by_validator) = if name.starts_with("task") {
                (task.is_valid(&raw), validate_task(&raw).is_ok())
            } else {
                (project.is_valid(&raw), validate_project(&raw).is_ok())
            };
            assert_eq!(by_schema, by_validator, "{dir}/{name}: schema and validator disagree");
            assert_eq!(by_validator, dir == "valid", "{dir}/{name}");
            checked += 1;
        }
    }
    assert!(checked >= 16);
    Ok(())
}

#[test]
fn schema_accepts_canonical_output() -> Result<(), Box<dyn Error>> {
    let project = compile(&serde_json::to_value(spread_schema())?)?;
    let task = compile(&serde_json::to_value(task_schema())?)?;
    for (name, raw) in fixtures("valid")? {
        let accepted = if name.starts_with("task") {
            task.is_valid(&serde_json::to_value(validate_task(&raw)?.as_ref())?)
        } else {
            project.is_valid(&serde_json::to_value(validate_project(&raw)?.as_ref())?)
        };
        assert!(accepted, "{name}: canonical form rejected");
    }
    Ok(())
}

#[test]
fn pretty_output_is_stable() -> Result<(), Box<dyn Error>> {
    let first = to_pretty_json(&spread_schema())?;
    let second = to_pretty_json(&spread_schema())?;
    assert_eq!(first, second);
    assert!(first.ends_with("}\n"));
    assert!(first.starts_with("{\n  \"$schema\""));
    Ok(())
}
