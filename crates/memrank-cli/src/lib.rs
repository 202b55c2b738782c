pub mod commands;
pub mod error;
pub mod input;
pub mod output;

pub use commands::{ConfigCommand, ExplainCommand, FoldersCommand, RankCommand};
pub use error::{CliError, CliResult};
pub use input::{Dataset, Snapshot};
pub use output::{OutputFormat, format_timestamp, truncate_string};
