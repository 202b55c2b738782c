use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use memrank::config::{Config, default_config_paths};

use crate::error::CliResult;
use crate::output::OutputFormat;

#[derive(Parser)]
pub struct ConfigCommand {
    #[clap(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    #[clap(about = "Print the effective configuration")]
    Show,

    #[clap(about = "List config file locations in search order")]
    Path,

    #[clap(about = "Check a config file for errors")]
    Validate(ValidateArgs),
}

#[derive(Parser)]
pub struct ValidateArgs {
    #[clap(help = "Config file to check (defaults to the discovered one)")]
    pub file: Option<PathBuf>,
}

impl ConfigCommand {
    pub fn execute(&self, config_path: Option<&Path>, format: OutputFormat) -> CliResult<()> {
        match &self.command {
            ConfigSubcommand::Show => Self::show(config_path, format),
            ConfigSubcommand::Path => Self::path(config_path, format),
            ConfigSubcommand::Validate(args) => {
                Self::validate(args.file.as_deref().or(config_path), format)
            }
        }
    }

    fn show(config_path: Option<&Path>, format: OutputFormat) -> CliResult<()> {
        let config = Config::discover(config_path)?;
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
            OutputFormat::Table => print!("{}", toml::to_string_pretty(&config)?),
        }
        Ok(())
    }

    fn path(config_path: Option<&Path>, format: OutputFormat) -> CliResult<()> {
        let paths: Vec<PathBuf> = match config_path {
            Some(path) => vec![path.to_path_buf()],
            None => default_config_paths(),
        };

        match format {
            OutputFormat::Json => {
                let output: Vec<_> = paths
                    .iter()
                    .map(|p| {
                        serde_json::json!({
                            "path": p.display().to_string(),
                            "exists": p.exists(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                for p in &paths {
                    let marker = if p.exists() { "found" } else { "-" };
                    println!("{:>6}  {}", marker, p.display());
                }
            }
        }
        Ok(())
    }

    fn validate(file: Option<&Path>, format: OutputFormat) -> CliResult<()> {
        let resolved = match file {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_paths().into_iter().find(|p| p.exists()),
        };
        let Some(path) = resolved else {
            return Err("No config file found to validate".into());
        };

        Config::load(&path)?;

        match format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "path": path.display().to_string(),
                    "valid": true,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => println!("{}: OK", path.display()),
        }
        Ok(())
    }
}
