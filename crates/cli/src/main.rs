mod commands;

use std::sync::Arc;

use {
    clap::Parser,
    secrecy::Secret,
    tokio::sync::Mutex,
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    courier_backends::{
        Backend, BulkBackend, DirectBackend, Profile, SearchBackend,
        http::{HttpBulkRpc, HttpDirectRpc, HttpSearchRpc},
    },
    courier_config::CourierConfig,
    courier_dispatch::{Dispatcher, QueueDrainer, QueueWatcher},
    courier_media::MediaFetcher,
};

#[derive(Parser)]
#[command(name = "courier", about = "Name-resolving message courier for chat backends")]
struct Cli {
    /// Path to a config file (skips the standard discovery order).
    #[arg(long, env = "COURIER_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Do not watch the queue file for changes.
    #[arg(long, default_value_t = false)]
    no_watch: bool,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_ansi(true),
        )
        .init();
}

/// Wire the configured profile to its HTTP sidecar adapter.
fn build_backend(config: &CourierConfig) -> Arc<dyn Backend> {
    let base_url = config.backend.base_url.clone();
    let token = config
        .backend
        .token
        .clone()
        .unwrap_or_else(|| Secret::new(String::new()));

    match config.profile {
        Profile::Bulk => {
            let app_id = config.backend.app_id.clone().unwrap_or_default();
            let rpc = Arc::new(HttpBulkRpc::new(base_url, token, app_id));
            Arc::new(BulkBackend::new(rpc))
        },
        Profile::Search => {
            let rpc = Arc::new(HttpSearchRpc::new(base_url, token));
            let fetcher = MediaFetcher::new(config.download_dir.clone());
            Arc::new(SearchBackend::new(rpc, fetcher))
        },
        Profile::Direct => {
            let rpc = Arc::new(HttpDirectRpc::new(base_url, token));
            let fetcher = MediaFetcher::new(config.download_dir.clone());
            Arc::new(DirectBackend::new(rpc, fetcher))
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "courier starting");

    let config = match &cli.config {
        Some(path) => courier_config::load_config(path)?,
        None => courier_config::discover_and_load(),
    };
    info!(
        profile = %config.profile,
        queue = %config.queue_file.display(),
        "configured"
    );

    let backend = build_backend(&config);
    let mut dispatcher = Dispatcher::new(backend, config.cache_expiry());

    // Populate the directory cache up front where the profile supports a
    // bulk fetch, so the first send doesn't pay for it. A failure here is
    // not fatal; lookups fall back to on-demand refresh.
    if config.profile == Profile::Bulk
        && let Err(e) = dispatcher.resolver_mut().cache_mut().directory(true).await
    {
        warn!(error = %e, "initial directory fetch failed, resolving lazily");
    }

    let dispatcher = Arc::new(Mutex::new(dispatcher));
    let drainer = Arc::new(QueueDrainer::new(
        config.queue_file.clone(),
        Arc::clone(&dispatcher),
    ));

    let mut watcher = QueueWatcher::new(Arc::clone(&drainer));
    if config.watch && !cli.no_watch {
        watcher.start()?;
    }

    // Pick up anything queued while the process was down.
    if let Err(e) = drainer.drain().await {
        warn!(error = %e, "initial queue drain failed");
    }

    commands::repl(dispatcher, drainer, watcher).await
}
