use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Cannot read input file {path}: {message}")]
    InputFileError { path: String, message: String },

    #[error("Input is missing required column '{column}' (found: {})", .available.join(", "))]
    MissingColumnError {
        column: String,
        available: Vec<String>,
    },

    #[error("Cannot write output file {path}: {message}")]
    OutputError { path: String, message: String },

    #[error("Fatal fetch error on '{id}': {reason} (partial results in {output_path})")]
    FatalFetchError {
        id: String,
        reason: String,
        output_path: String,
    },

    #[error("Run interrupted (partial results in {output_path})")]
    Interrupted { output_path: String },
}

/// Per-row failure. Recorded in the output as `error: <code>` instead of
/// stopping the batch, unless [`FetchError::is_fatal`] says otherwise.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("row has no identifier")]
    MissingIdentifier,

    #[error("resource not found (HTTP {status})")]
    NotFound { status: u16 },

    #[error("request rejected as unauthorized (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("rate limited by service (HTTP 429)")]
    RateLimited,

    #[error("unexpected HTTP status {status}")]
    Status { status: u16 },

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("network failure: {0}")]
    Network(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    /// Maps a non-success status to its per-row error. `None` for 2xx.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            200..=299 => None,
            404 | 410 => Some(FetchError::NotFound { status }),
            401 | 403 => Some(FetchError::Unauthorized { status }),
            429 => Some(FetchError::RateLimited),
            _ => Some(FetchError::Status { status }),
        }
    }

    /// Stable marker written to the `error` field of the output record.
    pub fn code(&self) -> String {
        match self {
            FetchError::MissingIdentifier => "missing_id".to_string(),
            FetchError::NotFound { .. } => "not_found".to_string(),
            FetchError::Unauthorized { .. } => "unauthorized".to_string(),
            FetchError::RateLimited => "rate_limited".to_string(),
            FetchError::Status { status } => format!("http_{}", status),
            FetchError::Timeout(_) => "timeout".to_string(),
            FetchError::Network(_) => "network_error".to_string(),
            FetchError::MalformedResponse(_) => "malformed_response".to_string(),
        }
    }

    /// Authentication failures stop the whole run. Rate limiting only becomes
    /// fatal after repeated hits, which the pipeline tracks.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FetchError::Unauthorized { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    FileSystem,
    Data,
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ScraperError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ScraperError::CsvError(_)
            | ScraperError::ConfigError { .. }
            | ScraperError::MissingConfigError { .. }
            | ScraperError::InvalidConfigValueError { .. }
            | ScraperError::InputFileError { .. }
            | ScraperError::MissingColumnError { .. } => ErrorCategory::Configuration,
            ScraperError::HttpClientError(_) | ScraperError::FatalFetchError { .. } => {
                ErrorCategory::Network
            }
            ScraperError::IoError(_) | ScraperError::OutputError { .. } => {
                ErrorCategory::FileSystem
            }
            ScraperError::SerializationError(_) => ErrorCategory::Data,
            ScraperError::Interrupted { .. } => ErrorCategory::Interrupted,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Interrupted => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::FileSystem | ErrorCategory::Data => ErrorSeverity::Critical,
        }
    }

    /// 0 is never returned: every error ends the process non-zero.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Configuration => 1,
            ErrorCategory::Network => 2,
            ErrorCategory::FileSystem | ErrorCategory::Data => 3,
            ErrorCategory::Interrupted => 130,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ScraperError::InputFileError { .. } => {
                "Check that the input path exists and is a readable CSV file"
            }
            ScraperError::CsvError(_) => {
                "Make sure every row has the same number of columns as the header"
            }
            ScraperError::MissingColumnError { .. } => {
                "Pass --id-column with the name of the identifier column"
            }
            ScraperError::ConfigError { .. }
            | ScraperError::MissingConfigError { .. }
            | ScraperError::InvalidConfigValueError { .. } => {
                "Review the command-line flags and the config file"
            }
            ScraperError::HttpClientError(_) => "Check the request headers and TLS settings",
            ScraperError::FatalFetchError { .. } => {
                "The service refused further requests; wait, then rerun with a larger --sleep"
            }
            ScraperError::IoError(_) | ScraperError::OutputError { .. } => {
                "Check that the output directory is writable and has free space"
            }
            ScraperError::SerializationError(_) => "Report this as a bug",
            ScraperError::Interrupted { .. } => "Rerun to process the remaining rows",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Invalid input or configuration: {}", self),
            ErrorCategory::Network => format!("Scraping stopped early: {}", self),
            ErrorCategory::FileSystem => format!("Could not save results: {}", self),
            ErrorCategory::Data => format!("Could not encode results: {}", self),
            ErrorCategory::Interrupted => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScraperError>;
