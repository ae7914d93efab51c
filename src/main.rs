use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use perspectiva::{
    Config, Database, Enricher, FeedRegistry, Fetcher, IngestPipeline, Scheduler,
    SchedulerContext,
};

/// Background news feed ingester.
#[derive(Debug, Parser)]
#[command(name = "perspectiva", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Run a single ingestion cycle, print its report as JSON and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    // Invalid configuration is fatal
    let config = match Config::load_with_env(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", cli.config.display());
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = perspectiva::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        perspectiva::logging::init_console_only(&config.logging.level);
    }

    info!("Perspectiva {}", env!("CARGO_PKG_VERSION"));

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: Config) -> perspectiva::Result<()> {
    let db = Arc::new(Database::connect(&config.database.url).await?);
    let fetcher = Arc::new(Fetcher::new(&config.fetcher)?);
    let enricher = Enricher::new(
        config.ingest.summary_sentences,
        config.ingest.max_enrich_input_bytes,
    );
    let pipeline = Arc::new(IngestPipeline::new(
        Arc::clone(&db),
        fetcher,
        enricher,
        &config.ingest,
    ));
    let registry = Arc::new(FeedRegistry::from_config(&config.feeds));
    let scheduler = Scheduler::new(SchedulerContext::new(), registry, pipeline, &config.ingest);

    if cli.once {
        let report = scheduler.run_cycle_now().await?;
        info!(
            "Single cycle done: {} new article(s), {} failed feed(s)",
            report.inserted(),
            report.failed_feeds()
        );
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => error!("Failed to serialize cycle report: {}", e),
        }
        db.close().await;
        return Ok(());
    }

    let shutdown = scheduler.context().shutdown_handle();
    let task = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.run().await })
    };

    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl-C, shutting down");
    shutdown.shutdown();

    if let Err(e) = task.await {
        error!("Scheduler task failed: {}", e);
    }
    db.close().await;
    Ok(())
}
