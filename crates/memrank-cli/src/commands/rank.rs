use std::path::PathBuf;

use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use memrank::config::Config;
use memrank::graph::boost::{BoostContext, BoostOutcome, RankedResult, apply_causal_boost};
use memrank::graph::feature::ConfigFeatureGate;
use memrank::scoring::composite::CompositeScorer;

use crate::error::CliResult;
use crate::input::Dataset;
use crate::output::{OutputFormat, format_optional_score, format_score, truncate_string};

#[derive(Parser)]
pub struct RankCommand {
    #[clap(help = "Snapshot JSON file or SQLite database")]
    pub input: PathBuf,

    #[clap(
        long,
        value_delimiter = ',',
        help = "Restrict candidates to these item IDs (comma separated)"
    )]
    pub ids: Vec<i64>,

    #[clap(
        long,
        short,
        default_value = "20",
        help = "Maximum number of results to display"
    )]
    pub limit: usize,

    #[clap(long, help = "Skip the causal graph boost")]
    pub no_boost: bool,

    #[clap(long, help = "Identity passed to the feature gate")]
    pub identity: Option<String>,
}

impl RankCommand {
    pub fn execute(&self, config: &Config, format: OutputFormat) -> CliResult<()> {
        let dataset = Dataset::load(&self.input)?;
        let mut outcome = self.rank(&dataset, config);
        outcome.results.truncate(self.limit);

        match format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "results": outcome.results,
                    "metadata": outcome.metadata,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                if outcome.results.is_empty() {
                    println!("No items to rank.");
                    return Ok(());
                }

                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL_CONDENSED)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(["#", "ID", "Title", "Folder", "Score", "Base", "Boost", ""]);

                for (index, result) in outcome.results.iter().enumerate() {
                    let (title, folder) = result
                        .item
                        .as_ref()
                        .map(|item| {
                            (
                                item.title.clone().unwrap_or_default(),
                                item.folder_path.clone(),
                            )
                        })
                        .unwrap_or_default();

                    table.add_row([
                        (index + 1).to_string(),
                        result.id.to_string(),
                        truncate_string(&title, 40),
                        truncate_string(&folder, 30),
                        format_score(result.resolved_score()),
                        format_optional_score(result.base_score),
                        format_optional_score(result.causal_boost),
                        if result.injected_by_causal_boost {
                            "injected".to_string()
                        } else {
                            String::new()
                        },
                    ]);
                }

                println!("{table}");

                let meta = &outcome.metadata;
                if !meta.enabled {
                    println!("\nCausal boost: disabled");
                } else if meta.applied {
                    println!(
                        "\nCausal boost: {} boosted, {} injected (max boost {:.3}, depth {})",
                        meta.boosted_count,
                        meta.injected_count,
                        meta.max_boost_applied,
                        meta.traversal_depth
                    );
                } else {
                    println!("\nCausal boost: no connected items");
                }
            }
        }

        Ok(())
    }

    /// Composite-score the candidates, then run the causal boost over them
    pub fn rank(&self, dataset: &Dataset, config: &Config) -> BoostOutcome {
        let candidates = dataset.candidates(&self.ids);
        let scored = CompositeScorer::from_config(&config.scoring).apply(&candidates);

        let results: Vec<RankedResult> = scored
            .iter()
            .map(|item| {
                let mut result = RankedResult::from_scored(item);
                result.session_boost = dataset.session_boosts.get(&item.item.id).copied();
                result
            })
            .collect();

        let gate = ConfigFeatureGate::from_config(config);
        let context = BoostContext::new(dataset.backend.edges(), dataset.backend.items())
            .with_config(config.causal_boost.clone())
            .with_gate(&gate, self.identity.as_deref());
        let context = if self.no_boost {
            context.with_enabled(false)
        } else {
            context
        };

        apply_causal_boost(results, &context)
    }
}
