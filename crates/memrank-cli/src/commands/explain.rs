use std::path::PathBuf;

use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use memrank::config::Config;
use memrank::scoring::composite::{CompositeScorer, ScoreBreakdown};

use crate::error::CliResult;
use crate::input::Dataset;
use crate::output::{OutputFormat, format_score, format_timestamp};

#[derive(Parser)]
pub struct ExplainCommand {
    #[clap(help = "Snapshot JSON file or SQLite database")]
    pub input: PathBuf,

    #[clap(help = "Item ID to explain")]
    pub id: i64,
}

impl ExplainCommand {
    pub fn execute(&self, config: &Config, format: OutputFormat) -> CliResult<()> {
        let dataset = Dataset::load(&self.input)?;
        let breakdown = self.explain(&dataset, config)?;
        let item = dataset
            .find(self.id)
            .ok_or_else(|| format!("Item not found: {}", self.id))?;

        match format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "id": item.id,
                    "title": item.title,
                    "folder_path": item.folder_path,
                    "importance_tier": item.importance_tier,
                    "composite_score": breakdown.total,
                    "scoring": breakdown,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                println!("Item {}", item.id);
                if let Some(title) = &item.title {
                    println!("  Title:   {title}");
                }
                println!("  Folder:  {}", item.folder_path);
                println!("  Tier:    {}", item.importance_tier);
                if let Some(ts) = item.last_touched() {
                    println!("  Touched: {}", format_timestamp(&ts));
                }
                println!("  Access:  {}\n", item.access_count);

                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL_CONDENSED)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(["Factor", "Value", "Weight", "Contribution"]);

                for (name, factor) in breakdown.factors() {
                    table.add_row([
                        name.to_string(),
                        format_score(factor.value),
                        format!("{:.2}", factor.weight),
                        format_score(factor.contribution),
                    ]);
                }

                println!("{table}");
                println!("\nComposite score: {}", format_score(breakdown.total));
            }
        }

        Ok(())
    }

    pub fn explain(&self, dataset: &Dataset, config: &Config) -> CliResult<ScoreBreakdown> {
        let item = dataset
            .find(self.id)
            .ok_or_else(|| format!("Item not found: {}", self.id))?;
        Ok(CompositeScorer::from_config(&config.scoring).breakdown(item))
    }
}
