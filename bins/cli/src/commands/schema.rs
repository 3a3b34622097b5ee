use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use spread_schema_config::{DocumentKind, spread_schema, task_schema, to_pretty_json};

/// Print the JSON Schema of one document kind.
pub fn run_schema(kind: DocumentKind) -> Result<CliOutput, CliError> {
    let schema = match kind {
        DocumentKind::Project => spread_schema(),
        DocumentKind::Task => task_schema(),
    };
    Ok(CliOutput {
        stdout: to_pretty_json(&schema)?,
        exit_code: ExitCode::Ok,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prints_the_requested_schema() -> Result<(), Box<dyn std::error::Error>> {
        let output = run_schema(DocumentKind::Task)?;
        let schema: serde_json::Value = serde_json::from_str(&output.stdout)?;
        assert_eq!(schema["title"], "TaskYaml");
        assert_eq!(output.exit_code, ExitCode::Ok);
        Ok(())
    }
}
