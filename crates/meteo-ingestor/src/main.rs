use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use meteo_core::config::{default_config_path, IngestConfig};
use meteo_core::MeteoError;
use meteo_feed::{normalize_source_url, FetchOptions, HttpFetcher};
use meteo_scheduler::{spawn_console_listener, IngestEngine, Phase, SchedulerState};
use meteo_store::{Bootstrap, ReadingStore, SnapshotWriter};
use tracing::{error, info, warn};

/// Poll an XML feed, convert it to JSON and keep a snapshot plus history.
#[derive(Debug, Parser)]
#[command(name = "meteo-ingestor", version)]
struct Cli {
    /// Config file (default: METEO_CONFIG, then <root>/meteo.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Application root that relative storage paths resolve against.
    #[arg(long)]
    root: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "meteo_ingestor=info,meteo_scheduler=info,meteo_store=info,meteo_feed=info".into()
            }),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = e
                .downcast_ref::<MeteoError>()
                .map(MeteoError::exit_code)
                .unwrap_or(3);
            error!("startup failed: {e:#}");
            eprintln!("{e:#}");
            ExitCode::from(code)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    println!("Starting data mining.");

    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().map_err(MeteoError::Io)?,
    };
    // config: --config > METEO_CONFIG env > <root>/meteo.toml
    let config_path = cli
        .config
        .or_else(|| std::env::var_os("METEO_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| default_config_path(&root));
    info!(path = %config_path.display(), root = %root.display(), "loading configuration");

    let config = IngestConfig::load(&config_path)?;
    let configured_url = config.source_url()?;
    let url = normalize_source_url(configured_url);
    if url != configured_url {
        info!(from = %configured_url, to = %url, "source URL normalized");
    }

    // history store: repair or create before the loop touches it
    let store = ReadingStore::new(config.database_path(&root));
    match store
        .ensure_ready()
        .map_err(|e| MeteoError::Bootstrap(e.to_string()))?
    {
        Bootstrap::Repaired => warn!("history database was recreated; earlier readings are gone"),
        Bootstrap::Created | Bootstrap::Opened => {}
    }
    log_last_reading(&store);

    let snapshot = SnapshotWriter::new(config.snapshot_path(&root));
    let fetcher = HttpFetcher::new(
        url.clone(),
        FetchOptions {
            timeout: config.request_timeout(),
            user_agent: config.data_source.user_agent.clone(),
        },
    )
    .map_err(|e| MeteoError::HttpClient(e.to_string()))?;

    let initial = if config.scheduler.start_running {
        Phase::Running
    } else {
        Phase::Paused
    };
    let state = Arc::new(SchedulerState::new(initial));
    let engine = IngestEngine::new(
        Box::new(fetcher),
        store,
        snapshot,
        config.poll_interval(),
        None,
    );

    println!(
        "Source: {url}\nInterval: {} min\nCommands: start | stop | quit (q). Currently {}.",
        engine.interval().as_secs() / 60,
        state.phase()
    );

    spawn_console_listener(Arc::clone(&state))
        .map_err(MeteoError::Io)
        .context("failed to start console listener")?;

    let summary = engine.run(state).await;
    println!(
        "Stopped after {} cycle(s), {} paused tick(s).",
        summary.cycles, summary.skipped
    );
    Ok(())
}

fn log_last_reading(store: &ReadingStore) {
    match store.recent(1) {
        Ok(rows) => match rows.first() {
            Some(last) => info!(
                id = last.id,
                timestamp = %last.timestamp,
                available = last.is_available,
                "last stored reading"
            ),
            None => info!("history is empty"),
        },
        Err(e) => warn!("could not read history: {e}"),
    }
}
