use crate::core::input::read_rows;
use crate::core::response::parse_page;
use crate::core::target::UrlTemplate;
use crate::core::{ConfigProvider, Fetcher, Pipeline, ShutdownFlag, Sleeper, Storage};
use crate::domain::model::{
    AbortReason, InputRow, OutputDocument, ResultRecord, RunSummary, ScrapeOutcome,
};
use crate::utils::error::{FetchError, Result, ScraperError};

pub struct ScrapePipeline<S: Storage, F: Fetcher, Z: Sleeper, C: ConfigProvider> {
    storage: S,
    fetcher: F,
    sleeper: Z,
    config: C,
    template: UrlTemplate,
    shutdown: Option<Box<dyn ShutdownFlag>>,
}

impl<S: Storage, F: Fetcher, Z: Sleeper, C: ConfigProvider> ScrapePipeline<S, F, Z, C> {
    pub fn new(storage: S, fetcher: F, sleeper: Z, config: C) -> Result<Self> {
        let template = UrlTemplate::parse(config.url_template())?;
        Ok(Self {
            storage,
            fetcher,
            sleeper,
            config,
            template,
            shutdown: None,
        })
    }

    /// Stop between rows once `flag` is triggered.
    pub fn with_shutdown(mut self, flag: impl ShutdownFlag + 'static) -> Self {
        self.shutdown = Some(Box::new(flag));
        self
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|flag| flag.is_triggered())
    }

    async fn scrape_row(&self, row: &InputRow) -> std::result::Result<ResultRecord, FetchError> {
        if row.id.is_empty() || !self.template.has_identifier(row) {
            return Err(FetchError::MissingIdentifier);
        }

        let url = self.template.render(row);
        tracing::debug!("Fetching {} from {}", row.id, url);
        let page = self.fetcher.fetch(&url).await?;
        let fields = parse_page(&url, &page, self.config.detailed())?;
        Ok(ResultRecord::success(row.id.clone(), fields))
    }
}

#[async_trait::async_trait]
impl<S: Storage, F: Fetcher, Z: Sleeper, C: ConfigProvider> Pipeline
    for ScrapePipeline<S, F, Z, C>
{
    async fn extract(&self) -> Result<Vec<InputRow>> {
        let path = self.config.input_path();
        tracing::debug!("Reading input file {}", path);

        let data = self
            .storage
            .read_file(path)
            .await
            .map_err(|e| ScraperError::InputFileError {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        let table = read_rows(&data, self.config.id_column())?;

        let missing = self.template.missing_columns(&table.headers);
        if !missing.is_empty() {
            return Err(ScraperError::ConfigError {
                message: format!(
                    "url_template references columns not in the input: {}",
                    missing.join(", ")
                ),
            });
        }

        Ok(table.rows)
    }

    async fn transform(&self, rows: Vec<InputRow>) -> Result<ScrapeOutcome> {
        let total = rows.len();
        let interval = self.config.sleep_interval();
        let threshold = self.config.block_threshold();

        let mut document = OutputDocument::with_capacity(total);
        let mut summary = RunSummary::new(total);
        let mut consecutive_rate_limits = 0u32;

        for (index, row) in rows.into_iter().enumerate() {
            // 每筆之間暫停，最後一筆之後不再等待
            if index > 0 && !interval.is_zero() {
                tracing::debug!("Waiting {:?} before next request", interval);
                self.sleeper.sleep(interval).await;
            }

            if self.shutdown_requested() {
                tracing::warn!("Shutdown requested, stopping before row {}", row.line);
                summary.aborted = Some(AbortReason::Interrupted);
                break;
            }

            tracing::info!("Processing {}/{}: {}", index + 1, total, row.id);

            match self.scrape_row(&row).await {
                Ok(record) => {
                    consecutive_rate_limits = 0;
                    summary.succeeded += 1;
                    document.push(record);
                }
                Err(err) => {
                    tracing::warn!("Row {} ({}) failed: {}", row.line, row.id, err);
                    summary.failed += 1;
                    document.push(ResultRecord::failure(row.id.clone(), err.code()));

                    if err == FetchError::RateLimited {
                        consecutive_rate_limits += 1;
                    } else if err != FetchError::MissingIdentifier {
                        consecutive_rate_limits = 0;
                    }

                    let blocked = consecutive_rate_limits >= threshold;
                    if err.is_fatal() || blocked {
                        let reason = if blocked {
                            format!("{} consecutive rate-limited responses", consecutive_rate_limits)
                        } else {
                            err.to_string()
                        };
                        tracing::error!("Aborting run at {}: {}", row.id, reason);
                        summary.aborted = Some(AbortReason::Fatal {
                            id: row.id.clone(),
                            reason,
                        });
                        break;
                    }
                }
            }
        }

        Ok(ScrapeOutcome { document, summary })
    }

    async fn load(&self, outcome: &ScrapeOutcome) -> Result<String> {
        let output_path = self.config.output_path();
        let json = outcome.document.to_json(self.config.output_shape())?;

        tracing::debug!(
            "Writing {} records ({} bytes) to {}",
            outcome.document.len(),
            json.len(),
            output_path
        );
        self.storage
            .write_file(output_path, json.as_bytes())
            .await
            .map_err(|e| ScraperError::OutputError {
                path: output_path.to_string(),
                message: e.to_string(),
            })?;

        Ok(output_path.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScraperConfig;
    use crate::domain::model::FetchedPage;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn with_file(path: &str, content: &str) -> Self {
            let storage = Self::default();
            storage
                .files
                .lock()
                .unwrap()
                .insert(path.to_string(), content.as_bytes().to_vec());
            storage
        }

        fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().unwrap().get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            self.get_file(path).ok_or_else(|| {
                ScraperError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files
                .lock()
                .unwrap()
                .insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct StopFlag(Arc<AtomicBool>);

    impl ShutdownFlag for StopFlag {
        fn is_triggered(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    /// Answers by URL suffix; unknown URLs fail as network errors.
    #[derive(Clone, Default)]
    struct MockFetcher {
        responses: HashMap<String, std::result::Result<FetchedPage, FetchError>>,
        requested: Arc<Mutex<Vec<String>>>,
        on_fetch: Option<StopFlag>,
    }

    impl MockFetcher {
        fn json(mut self, id: &str, body: serde_json::Value) -> Self {
            self.responses.insert(
                id.to_string(),
                Ok(FetchedPage {
                    status: 200,
                    content_type: Some("application/json".to_string()),
                    body: body.to_string(),
                }),
            );
            self
        }

        fn error(mut self, id: &str, err: FetchError) -> Self {
            self.responses.insert(id.to_string(), Err(err));
            self
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    impl Fetcher for MockFetcher {
        async fn fetch(&self, url: &str) -> std::result::Result<FetchedPage, FetchError> {
            self.requested.lock().unwrap().push(url.to_string());
            if let Some(flag) = &self.on_fetch {
                flag.0.store(true, Ordering::SeqCst);
            }
            let id = url.rsplit('/').next().unwrap_or_default();
            self.responses
                .get(id)
                .cloned()
                .unwrap_or_else(|| Err(FetchError::Network("connection refused".to_string())))
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSleeper {
        sleeps: Arc<Mutex<Vec<Duration>>>,
    }

    impl RecordingSleeper {
        fn total(&self) -> Duration {
            self.sleeps.lock().unwrap().iter().sum()
        }

        fn count(&self) -> usize {
            self.sleeps.lock().unwrap().len()
        }
    }

    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
        }
    }

    fn config(sleep: f64) -> ScraperConfig {
        ScraperConfig::new("in.csv", "out.json")
            .with_sleep_seconds(sleep)
            .with_url_template("http://mock/patent/{raw_id}")
    }

    fn pipeline(
        csv: &str,
        fetcher: MockFetcher,
        config: ScraperConfig,
    ) -> (
        ScrapePipeline<MockStorage, MockFetcher, RecordingSleeper, ScraperConfig>,
        MockStorage,
        RecordingSleeper,
    ) {
        let storage = MockStorage::with_file("in.csv", csv);
        let sleeper = RecordingSleeper::default();
        let pipeline =
            ScrapePipeline::new(storage.clone(), fetcher, sleeper.clone(), config).unwrap();
        (pipeline, storage, sleeper)
    }

    async fn run(
        pipeline: &ScrapePipeline<MockStorage, MockFetcher, RecordingSleeper, ScraperConfig>,
    ) -> ScrapeOutcome {
        let rows = pipeline.extract().await.unwrap();
        pipeline.transform(rows).await.unwrap()
    }

    #[tokio::test]
    async fn test_success_and_not_found_rows() {
        let fetcher = MockFetcher::default()
            .json("US123", json!({"claim": "foo"}))
            .error("US456", FetchError::NotFound { status: 404 });
        let (pipeline, storage, _) = pipeline("id\nUS123\nUS456\n", fetcher, config(0.0));

        let outcome = run(&pipeline).await;
        assert_eq!(outcome.summary.succeeded, 1);
        assert_eq!(outcome.summary.failed, 1);
        assert_eq!(outcome.summary.aborted, None);

        let path = pipeline.load(&outcome).await.unwrap();
        assert_eq!(path, "out.json");

        let written: serde_json::Value =
            serde_json::from_slice(&storage.get_file("out.json").unwrap()).unwrap();
        assert_eq!(
            written,
            json!([{"id": "US123", "claim": "foo"}, {"id": "US456", "error": "not_found"}])
        );
    }

    #[tokio::test]
    async fn test_network_failure_does_not_stop_batch() {
        let fetcher = MockFetcher::default()
            .json("A", json!({"n": 1}))
            .json("C", json!({"n": 3}));
        let (pipeline, _, _) = pipeline("id\nA\nB\nC\n", fetcher, config(0.0));

        let outcome = run(&pipeline).await;
        let records = outcome.document.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].id, "B");
        assert_eq!(records[1].error.as_deref(), Some("network_error"));
        assert!(records[2].is_success());
    }

    #[tokio::test]
    async fn test_sleeps_between_rows_but_not_after_last() {
        let fetcher = MockFetcher::default()
            .json("A", json!({}))
            .json("B", json!({}))
            .json("C", json!({}));
        let (pipeline, _, sleeper) = pipeline("id\nA\nB\nC\n", fetcher, config(1.5));

        run(&pipeline).await;
        assert_eq!(sleeper.count(), 2);
        assert_eq!(sleeper.total(), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_zero_sleep_never_sleeps() {
        let fetcher = MockFetcher::default().json("A", json!({})).json("B", json!({}));
        let (pipeline, _, sleeper) = pipeline("id\nA\nB\n", fetcher, config(0.0));

        run(&pipeline).await;
        assert_eq!(sleeper.count(), 0);
    }

    #[tokio::test]
    async fn test_unauthorized_aborts_immediately() {
        let fetcher = MockFetcher::default()
            .json("A", json!({}))
            .error("B", FetchError::Unauthorized { status: 401 })
            .json("C", json!({}));
        let (pipeline, _, _) = pipeline("id\nA\nB\nC\n", fetcher.clone(), config(0.0));

        let outcome = run(&pipeline).await;
        assert_eq!(outcome.document.len(), 2);
        assert_eq!(outcome.document.records()[1].error.as_deref(), Some("unauthorized"));
        assert!(matches!(
            outcome.summary.aborted,
            Some(AbortReason::Fatal { ref id, .. }) if id == "B"
        ));
        assert_eq!(outcome.summary.skipped(), 1);
        assert_eq!(fetcher.requested().len(), 2);
    }

    #[tokio::test]
    async fn test_repeated_rate_limits_abort() {
        let fetcher = MockFetcher::default()
            .error("A", FetchError::RateLimited)
            .error("B", FetchError::RateLimited)
            .json("C", json!({}))
            .error("D", FetchError::RateLimited)
            .error("E", FetchError::RateLimited)
            .error("F", FetchError::RateLimited)
            .json("G", json!({}));
        let (pipeline, _, _) = pipeline("id\nA\nB\nC\nD\nE\nF\nG\n", fetcher, config(0.0));

        let outcome = run(&pipeline).await;
        // C resets the streak, so the third consecutive 429 is F
        assert_eq!(outcome.document.len(), 6);
        assert!(matches!(
            outcome.summary.aborted,
            Some(AbortReason::Fatal { ref id, .. }) if id == "F"
        ));
    }

    #[tokio::test]
    async fn test_missing_identifier_is_recorded_without_request() {
        let fetcher = MockFetcher::default().json("A", json!({}));
        let (pipeline, _, _) = pipeline("id,title\n,untitled\nA,titled\n", fetcher.clone(), config(0.0));

        let outcome = run(&pipeline).await;
        assert_eq!(outcome.document.records()[0].error.as_deref(), Some("missing_id"));
        assert_eq!(fetcher.requested(), vec!["http://mock/patent/A".to_string()]);
    }

    #[tokio::test]
    async fn test_punctuation_only_identifier_is_missing_id() {
        let fetcher = MockFetcher::default().json("US1", json!({}));
        let config = config(0.0).with_url_template("http://mock/patent/{id}");
        let (pipeline, _, _) = pipeline("id\n---\nUS-1\n", fetcher.clone(), config);

        let outcome = run(&pipeline).await;
        assert_eq!(outcome.document.len(), 2);
        assert_eq!(outcome.document.records()[0].id, "---");
        assert_eq!(outcome.document.records()[0].error.as_deref(), Some("missing_id"));
        assert!(outcome.document.records()[1].is_success());
        assert_eq!(fetcher.requested(), vec!["http://mock/patent/US1".to_string()]);
    }

    #[tokio::test]
    async fn test_interrupt_stops_after_in_flight_row() {
        let signal = StopFlag::default();
        let fetcher = MockFetcher {
            on_fetch: Some(signal.clone()),
            ..MockFetcher::default()
        }
        .json("A", json!({"n": 1}))
        .json("B", json!({"n": 2}));
        let (pipeline, _, _) = pipeline("id\nA\nB\n", fetcher, config(0.0));
        let pipeline = pipeline.with_shutdown(signal);

        let outcome = run(&pipeline).await;
        assert_eq!(outcome.document.len(), 1);
        assert!(outcome.document.records()[0].is_success());
        assert_eq!(outcome.summary.aborted, Some(AbortReason::Interrupted));
    }

    #[tokio::test]
    async fn test_missing_input_file_is_config_error() {
        let storage = MockStorage::default();
        let pipeline = ScrapePipeline::new(
            storage,
            MockFetcher::default(),
            RecordingSleeper::default(),
            config(0.0),
        )
        .unwrap();

        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, ScraperError::InputFileError { .. }));
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_template_column_must_exist() {
        let config = config(0.0).with_url_template("http://mock/{country}/{id}");
        let (pipeline, _, _) = pipeline("id\nA\n", MockFetcher::default(), config);

        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, ScraperError::ConfigError { .. }));
    }

    #[tokio::test]
    async fn test_repeat_runs_are_identical() {
        let fetcher = MockFetcher::default()
            .json("US1", json!({"title": "Widget"}))
            .error("US2", FetchError::Status { status: 500 });
        let (pipeline, _, _) = pipeline("id\nUS1\nUS2\n", fetcher, config(0.0));

        let first = run(&pipeline).await;
        let second = run(&pipeline).await;
        assert_eq!(first.document, second.document);
        assert_eq!(first.document.records()[1].error.as_deref(), Some("http_500"));
    }
}
