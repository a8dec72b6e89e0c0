use clap::Parser;
use patent_scraper::utils::{logger, validation::Validate};
use patent_scraper::{
    CliArgs, HttpFetcher, LocalStorage, RunReport, ScrapeEngine, ScrapePipeline, ScraperError,
    ShutdownSignal, TokioSleeper,
};

async fn run(args: CliArgs) -> Result<RunReport, ScraperError> {
    let config = args.into_config()?;
    tracing::debug!("Resolved config: {:?}", config);

    // 驗證配置，失敗時不發出任何請求
    config.validate()?;

    let shutdown = ShutdownSignal::new();
    shutdown.listen_for_ctrl_c();

    let storage = LocalStorage::current_dir();
    let fetcher = HttpFetcher::from_config(&config)?;
    let sleeper = TokioSleeper::new().with_shutdown(shutdown.clone());
    let pipeline = ScrapePipeline::new(storage, fetcher, sleeper, config)?.with_shutdown(shutdown);

    ScrapeEngine::new(pipeline).run().await?.into_result()
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose, args.log_json);
    tracing::info!("Starting patent-scraper");

    match run(args).await {
        Ok(report) => {
            let summary = &report.summary;
            println!(
                "✅ Completed! Scraped {} patents ({} ok, {} failed).",
                summary.processed(),
                summary.succeeded,
                summary.failed
            );
            println!("📁 Results saved to: {}", report.output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }
}
