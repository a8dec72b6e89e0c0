use crate::domain::model::{FetchedPage, InputRow, OutputShape, ScrapeOutcome};
use crate::utils::error::{FetchError, Result};
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn sleep_interval(&self) -> Duration;
    fn id_column(&self) -> &str;
    fn url_template(&self) -> &str;
    fn block_threshold(&self) -> u32;
    fn output_shape(&self) -> OutputShape;
    fn detailed(&self) -> bool;
}

/// One request per call, no retries.
pub trait Fetcher: Send + Sync {
    fn fetch(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = std::result::Result<FetchedPage, FetchError>> + Send;
}

/// Throttling delay between rows. Swapped for a recording fake in tests.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}

/// Stop request checked between rows.
pub trait ShutdownFlag: Send + Sync {
    fn is_triggered(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<InputRow>>;
    async fn transform(&self, rows: Vec<InputRow>) -> Result<ScrapeOutcome>;
    async fn load(&self, outcome: &ScrapeOutcome) -> Result<String>;
}
