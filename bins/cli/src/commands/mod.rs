//! Command implementations.

mod schema;
mod validate;

pub use schema::run_schema;
pub use validate::run_validate;

use clap::ValueEnum;
use spread_schema_config::DocumentKind;

/// Document kind as given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// spread.yaml
    Project,
    /// task.yaml
    Task,
}

impl From<KindArg> for DocumentKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Project => Self::Project,
            KindArg::Task => Self::Task,
        }
    }
}
