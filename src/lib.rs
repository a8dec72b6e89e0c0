pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::CliArgs;
pub use crate::config::ScraperConfig;

pub use crate::adapters::{
    clock::TokioSleeper, http::HttpFetcher, signal::ShutdownSignal, storage::LocalStorage,
};
pub use crate::core::{
    engine::{RunReport, ScrapeEngine},
    pipeline::ScrapePipeline,
};
pub use crate::domain::model::{OutputDocument, OutputShape, ResultRecord, RunSummary};
pub use crate::utils::error::{FetchError, Result, ScraperError};
