use anyhow::Context;
use carburanti_core::forecast::ModelFitError;
use carburanti_core::ingest::{FeedSource, FileFeedSource, HttpFeedSource, ParseError};
use carburanti_core::storage::runs::{record_run, RunStatus};
use carburanti_core::storage::{MemoryStore, PgDocumentStore};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "carburanti_worker")]
struct Args {
    /// Date the run is filed under (YYYY-MM-DD). Defaults to today's local date.
    #[arg(long)]
    run_date: Option<String>,

    /// Read the feed from a local CSV file instead of downloading it.
    #[arg(long)]
    feed_file: Option<std::path::PathBuf>,

    /// Run without a database: forecast from today's snapshot only and print the record.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = carburanti_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let started = std::time::Instant::now();
    let result = run(&settings, &args).await;

    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        let message = format!("{err:#}");
        tracing::error!(
            kind = error_kind(err),
            elapsed_ms = started.elapsed().as_millis(),
            error = %message,
            "run failed"
        );
    } else {
        tracing::info!(elapsed_ms = started.elapsed().as_millis(), "run finished");
    }

    result
}

async fn run(settings: &carburanti_core::config::Settings, args: &Args) -> anyhow::Result<()> {
    let today = carburanti_core::time::local_today();
    let run_date = carburanti_core::time::resolve_run_date(args.run_date.as_deref(), today)?;
    let params = settings.run_params(run_date);

    let feed: Box<dyn FeedSource> = match &args.feed_file {
        Some(path) => Box::new(FileFeedSource::new(path)),
        None => Box::new(HttpFeedSource::from_settings(settings)?),
    };

    tracing::info!(
        %run_date,
        source = feed.source_name(),
        window = params.window,
        forecast_enabled = params.forecast_enabled,
        dry_run = args.dry_run,
        "starting run"
    );

    if args.dry_run {
        let store = MemoryStore::new();
        let summary = carburanti_core::pipeline::run(feed.as_ref(), &store, &params).await?;
        if let Some(record) = store.forecast(run_date).await {
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        tracing::info!(%run_date, dry_run = true, regions = summary.regions, "dry run done");
        return Ok(());
    }

    let db_url = settings.require_database_url()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    carburanti_core::storage::migrate(&pool).await?;

    let store = PgDocumentStore::new(
        pool.clone(),
        settings.snapshot_collection.as_str(),
        settings.forecast_collection.as_str(),
    );

    let outcome = carburanti_core::pipeline::run(feed.as_ref(), &store, &params).await;

    // Best-effort: the run log must not change the run's outcome.
    let logged = match &outcome {
        Ok(summary) => {
            let summary = serde_json::to_value(summary).ok();
            record_run(&pool, run_date, RunStatus::Success, None, summary).await
        }
        Err(err) => {
            let message = format!("{err:#}");
            record_run(&pool, run_date, RunStatus::Error, Some(&message), None).await
        }
    };
    match logged {
        Ok(run_id) => tracing::info!(%run_date, %run_id, "run recorded"),
        Err(err) => tracing::warn!(%run_date, error = %err, "failed to record run"),
    }

    let summary = outcome?;
    tracing::info!(
        %run_date,
        snapshot_date = %summary.snapshot_date,
        regions = summary.regions,
        series = summary.series,
        forecast_written = summary.forecast_written,
        "run completed"
    );
    Ok(())
}

fn error_kind(err: &anyhow::Error) -> &'static str {
    if err.downcast_ref::<ParseError>().is_some() {
        "parse"
    } else if err.downcast_ref::<ModelFitError>().is_some() {
        "model_fit"
    } else {
        "collaborator"
    }
}

fn init_sentry(settings: &carburanti_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
