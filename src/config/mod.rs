#[cfg(feature = "cli")]
pub mod cli;
pub mod file;

use crate::core::target::UrlTemplate;
use crate::domain::model::OutputShape;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_SLEEP_SECONDS: f64 = 1.0;
pub const DEFAULT_ID_COLUMN: &str = "id";
pub const DEFAULT_URL_TEMPLATE: &str = "https://patents.google.com/patent/US{id}B2";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_BLOCK_THRESHOLD: u32 = 3;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Everything one run needs, resolved from defaults, the optional TOML file
/// and the command line (in that order of precedence, last wins).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScraperConfig {
    pub input_path: String,
    pub output_path: String,
    pub sleep_seconds: f64,
    pub id_column: String,
    pub url_template: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
    pub headers: BTreeMap<String, String>,
    /// Consecutive HTTP 429 responses tolerated before the run aborts.
    pub block_threshold: u32,
    pub output_shape: OutputShape,
    pub detailed: bool,
}

impl ScraperConfig {
    pub fn new(input_path: impl Into<String>, output_path: impl Into<String>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            sleep_seconds: DEFAULT_SLEEP_SECONDS,
            id_column: DEFAULT_ID_COLUMN.to_string(),
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: BTreeMap::new(),
            block_threshold: DEFAULT_BLOCK_THRESHOLD,
            output_shape: OutputShape::Array,
            detailed: false,
        }
    }

    pub fn with_sleep_seconds(mut self, seconds: f64) -> Self {
        self.sleep_seconds = seconds;
        self
    }

    pub fn with_url_template(mut self, template: impl Into<String>) -> Self {
        self.url_template = template.into();
        self
    }

    pub fn with_id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = column.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl ConfigProvider for ScraperConfig {
    fn input_path(&self) -> &str {
        &self.input_path
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn sleep_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.sleep_seconds).unwrap_or(Duration::ZERO)
    }

    fn id_column(&self) -> &str {
        &self.id_column
    }

    fn url_template(&self) -> &str {
        &self.url_template
    }

    fn block_threshold(&self) -> u32 {
        self.block_threshold
    }

    fn output_shape(&self) -> OutputShape {
        self.output_shape
    }

    fn detailed(&self) -> bool {
        self.detailed
    }
}

impl Validate for ScraperConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input_path", &self.input_path)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_seconds("sleep_seconds", self.sleep_seconds)?;
        validation::validate_non_empty_string("id_column", &self.id_column)?;
        validation::validate_positive_number("timeout_seconds", self.timeout_seconds, 1)?;
        validation::validate_positive_number("block_threshold", u64::from(self.block_threshold), 1)?;
        validation::validate_non_empty_string("user_agent", &self.user_agent)?;
        UrlTemplate::parse(&self.url_template)?;
        Ok(())
    }
}
