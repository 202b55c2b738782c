use std::path::PathBuf;

use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use memrank::config::Config;
use memrank::scoring::folder::{FolderAggregator, FolderScoreOptions, FolderSummary};

use crate::error::CliResult;
use crate::input::Dataset;
use crate::output::{OutputFormat, format_score, format_timestamp, truncate_string};

#[derive(Parser)]
pub struct FoldersCommand {
    #[clap(help = "Snapshot JSON file or SQLite database")]
    pub input: PathBuf,

    #[clap(
        long,
        short,
        default_value = "10",
        help = "Maximum number of folders to display"
    )]
    pub limit: usize,

    #[clap(long, help = "Include archived, scratch, test and prototype folders")]
    pub include_archived: bool,

    #[clap(long, help = "Regex for folders to skip (repeatable, case-insensitive)")]
    pub exclude: Vec<String>,
}

impl FoldersCommand {
    pub fn execute(&self, config: &Config, format: OutputFormat) -> CliResult<()> {
        let dataset = Dataset::load(&self.input)?;
        let folders = self.rank_folders(&dataset, config);

        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&folders)?);
            }
            OutputFormat::Table => {
                if folders.is_empty() {
                    println!("No folders found.");
                    return Ok(());
                }

                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL_CONDENSED)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header([
                        "Folder",
                        "Score",
                        "Recency",
                        "Importance",
                        "Activity",
                        "Items",
                        "Top Tier",
                        "Last Activity",
                    ]);

                for folder in &folders {
                    table.add_row([
                        truncate_string(&folder.simplified, 40),
                        format_score(folder.score.score),
                        format_score(folder.score.recency_score),
                        format_score(folder.score.importance_score),
                        format_score(folder.score.activity_score),
                        folder.count.to_string(),
                        folder.top_tier.to_string(),
                        format_timestamp(&folder.last_activity),
                    ]);
                }

                println!("{table}");
                println!("\nTotal: {} folders", folders.len());
            }
        }

        Ok(())
    }

    pub fn rank_folders(&self, dataset: &Dataset, config: &Config) -> Vec<FolderSummary> {
        let aggregator = FolderAggregator::from_config(&config.folder, config.scoring.decay_rate);

        let mut options = FolderScoreOptions::from(&config.folder);
        options.include_archived |= self.include_archived;
        options.exclude_patterns.extend(self.exclude.iter().cloned());
        options.limit = Some(self.limit);

        aggregator.compute_folder_scores(&dataset.items, &options)
    }
}
