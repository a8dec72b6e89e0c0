use crate::config::file::FileConfig;
use crate::config::ScraperConfig;
use crate::domain::model::OutputShape;
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "patent-scraper")]
#[command(about = "Scrape patent details for every identifier in a CSV file into JSON")]
pub struct CliArgs {
    /// Input CSV file with a header row
    pub input_csv: String,

    /// Output JSON file
    pub output_json: String,

    /// Seconds to wait between requests [default: 1.0]
    #[arg(long)]
    pub sleep: Option<f64>,

    /// TOML file with request and output settings
    #[arg(long)]
    pub config: Option<String>,

    /// Header of the column holding patent identifiers [default: id]
    #[arg(long)]
    pub id_column: Option<String>,

    /// Fetch URL; {id}, {raw_id} and {<column>} are substituted per row
    #[arg(long)]
    pub url_template: Option<String>,

    /// Per-request timeout in seconds [default: 30]
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Consecutive HTTP 429 responses tolerated before aborting [default: 3]
    #[arg(long)]
    pub block_threshold: Option<u32>,

    #[arg(long, value_enum)]
    pub output_shape: Option<OutputShape>,

    /// Also extract inventors, assignees, dates, classifications, claims and citations
    #[arg(long)]
    pub detailed: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

impl CliArgs {
    /// Resolves defaults, then the config file, then explicit flags.
    pub fn into_config(self) -> Result<ScraperConfig> {
        let mut config = ScraperConfig::new(self.input_csv, self.output_json);

        if let Some(path) = &self.config {
            tracing::debug!("Loading config file {}", path);
            FileConfig::from_file(path)?.apply_to(&mut config);
        }

        if let Some(seconds) = self.sleep {
            config.sleep_seconds = seconds;
        }
        if let Some(column) = self.id_column {
            config.id_column = column;
        }
        if let Some(template) = self.url_template {
            config.url_template = template;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_seconds = timeout;
        }
        if let Some(threshold) = self.block_threshold {
            config.block_threshold = threshold;
        }
        if let Some(shape) = self.output_shape {
            config.output_shape = shape;
        }
        if self.detailed {
            config.detailed = true;
        }

        Ok(config)
    }
}
