//! Write the spread.yaml and task.yaml JSON Schemas.
//!
//! Usage: `generate_json_schemas [DIR]` (default `schema/`). Files are
//! `spread.json` and `task.json`.

use spread_schema_config::{spread_schema, task_schema, to_pretty_json};
use std::fs;
use std::io;
use std::io::Write;
use std::path::PathBuf;

fn main() -> std::process::ExitCode {
    match run() {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            std::process::ExitCode::from(1)
        },
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from("schema"), PathBuf::from);
    fs::create_dir_all(&dir)?;

    let mut stdout = io::stdout();
    for (file, schema) in [("spread.json", spread_schema()), ("task.json", task_schema())] {
        let path = dir.join(file);
        fs::write(&path, to_pretty_json(&schema)?)?;
        writeln!(stdout, "wrote {}", path.display())?;
    }
    stdout.flush()?;

    Ok(())
}
