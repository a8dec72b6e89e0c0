use crate::config::ScraperConfig;
use crate::domain::model::OutputShape;
use crate::utils::error::{Result, ScraperError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"));

/// Optional TOML configuration file. Every key may be omitted; present keys
/// override the built-in defaults and are in turn overridden by CLI flags.
/// Input and output paths only come from the command line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub input: Option<InputSection>,
    pub request: Option<RequestSection>,
    pub output: Option<OutputSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputSection {
    pub id_column: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestSection {
    pub url_template: Option<String>,
    pub sleep_seconds: Option<f64>,
    pub timeout_seconds: Option<u64>,
    pub user_agent: Option<String>,
    pub block_threshold: Option<u32>,
    pub headers: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    pub shape: Option<OutputShape>,
    pub detailed: Option<bool>,
}

impl FileConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ScraperError::ConfigError {
                message: format!("cannot read config file {}: {}", path.display(), e),
            })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ScraperError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${API_KEY})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// Overlays the keys present in this file onto `config`.
    pub fn apply_to(&self, config: &mut ScraperConfig) {
        if let Some(input) = &self.input {
            if let Some(column) = &input.id_column {
                config.id_column = column.clone();
            }
        }

        if let Some(request) = &self.request {
            if let Some(template) = &request.url_template {
                config.url_template = template.clone();
            }
            if let Some(seconds) = request.sleep_seconds {
                config.sleep_seconds = seconds;
            }
            if let Some(timeout) = request.timeout_seconds {
                config.timeout_seconds = timeout;
            }
            if let Some(agent) = &request.user_agent {
                config.user_agent = agent.clone();
            }
            if let Some(threshold) = request.block_threshold {
                config.block_threshold = threshold;
            }
            if let Some(headers) = &request.headers {
                config
                    .headers
                    .extend(headers.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }

        if let Some(output) = &self.output {
            if let Some(shape) = output.shape {
                config.output_shape = shape;
            }
            if let Some(detailed) = output.detailed {
                config.detailed = detailed;
            }
        }
    }
}
