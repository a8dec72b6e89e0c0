use crate::core::Pipeline;
use crate::domain::model::{AbortReason, RunSummary};
use crate::utils::error::{Result, ScraperError};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub output_path: String,
    pub summary: RunSummary,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// Turns an early stop into an error so callers exit non-zero. The output
    /// file has already been written at this point.
    pub fn into_result(self) -> Result<Self> {
        match &self.summary.aborted {
            None => Ok(self),
            Some(AbortReason::Fatal { id, reason }) => Err(ScraperError::FatalFetchError {
                id: id.clone(),
                reason: reason.clone(),
                output_path: self.output_path,
            }),
            Some(AbortReason::Interrupted) => Err(ScraperError::Interrupted {
                output_path: self.output_path,
            }),
        }
    }
}

pub struct ScrapeEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> ScrapeEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<RunReport> {
        let started_at = Utc::now();
        tracing::info!("Starting scrape run");

        // Extract
        let rows = self.pipeline.extract().await?;
        tracing::info!("Loaded {} rows from input", rows.len());
        if rows.is_empty() {
            tracing::warn!("Input has no data rows, writing an empty result set");
        }

        // Transform
        let outcome = self.pipeline.transform(rows).await?;

        // Load: partial results are written even when the run stopped early
        let output_path = self.pipeline.load(&outcome).await?;

        let summary = outcome.summary;
        let finished_at = Utc::now();
        tracing::info!(
            "Completed! Scraped {} patents ({} ok, {} failed, {} skipped) in {}s. Results saved to {}",
            summary.processed(),
            summary.succeeded,
            summary.failed,
            summary.skipped(),
            (finished_at - started_at).num_seconds(),
            output_path
        );
        if let Some(reason) = &summary.aborted {
            tracing::warn!("Run stopped early: {}", reason);
        }

        Ok(RunReport {
            output_path,
            summary,
            started_at,
            finished_at,
        })
    }
}
