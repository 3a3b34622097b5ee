//! CLI binary entrypoint.

mod commands;
mod error;
mod format;
mod logging;

use clap::{Parser, Subcommand};
use commands::{KindArg, run_schema, run_validate};
use error::{CliError, ExitCode};
use format::{OutputArgs, OutputMode};
use logging::LogArgs;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "spread-schema",
    version,
    about = "Validate spread.yaml and task.yaml files",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    #[command(flatten)]
    logging: LogArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate a spread.yaml or task.yaml file.
    Validate {
        /// Document path (YAML or JSON).
        path: PathBuf,
        /// Document kind; guessed from the file name when omitted.
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },
    /// Print the JSON Schema of a document kind.
    Schema {
        /// Document kind.
        #[arg(long, value_enum, default_value = "project")]
        kind: KindArg,
    },
}

#[derive(Debug)]
pub(crate) struct CliOutput {
    stdout: String,
    exit_code: ExitCode,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let mode = OutputMode::from_args(&cli.output);

    if let Err(error) = logging::init(&cli.logging) {
        return exit_with_error(&error);
    }

    match run(&cli.command, mode) {
        Ok(output) => match write_output(&output) {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&error),
        },
        Err(error) => exit_with_error(&error),
    }
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn run(command: &Commands, mode: OutputMode) -> Result<CliOutput, CliError> {
    match command {
        Commands::Validate { path, kind } => run_validate(mode, path, kind.map(Into::into)),
        Commands::Schema { kind } => run_schema((*kind).into()),
    }
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    stdout.write_all(output.stdout.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_the_subcommand() -> Result<(), clap::Error> {
        let cli = Cli::try_parse_from([
            "spread-schema",
            "validate",
            "spread.yaml",
            "--output",
            "json",
            "--log-level",
            "debug",
        ])?;
        assert!(OutputMode::from_args(&cli.output).is_json());
        assert_eq!(cli.logging.log_level.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Commands::Validate { kind: None, .. }));
        Ok(())
    }
}
