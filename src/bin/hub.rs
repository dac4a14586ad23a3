use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use sentinel::config::{Config, StorageConfig, read_config_file};
use sentinel::engine::scheduler::SchedulerHandle;
use sentinel::notify::Notifier;
use sentinel::store::{MemoryStore, MonitorStore};
use tokio::sync::broadcast;
use tracing::{debug, error, info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short)]
    file: String,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("sentinel", LevelFilter::TRACE),
        ("hub", LevelFilter::TRACE),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = read_config_file(&args.file)?;

    let store = build_store(&config).await?;
    register_services(&config, store.as_ref()).await?;

    let (signal_tx, mut signal_rx) = broadcast::channel(64);
    let notifier = Notifier::new(config.webhook.clone());

    let scheduler = SchedulerHandle::spawn(
        store.clone(),
        config.scheduler.clone(),
        config.incidents.clone(),
        notifier,
        signal_tx,
    );

    // Give every registered service an initial check right away; the
    // periodic rounds follow one interval later.
    if let Err(e) = scheduler.tick_now().await {
        error!("initial check round failed: {e:#}");
    }

    info!(
        "monitoring started (interval {}s, timeout {}s)",
        config.scheduler.interval, config.scheduler.timeout
    );

    // Surface health transitions in the hub log; exporters subscribe the
    // same way.
    tokio::spawn(async move {
        while let Ok(signal) = signal_rx.recv().await {
            debug!(
                "{}: state={} cost={:.6}",
                signal.service_name, signal.state, signal.cost
            );
        }
    });

    if let Some(StorageConfig::Sqlite { retention_days, .. }) = &config.storage {
        spawn_retention_task(store.clone(), *retention_days);
    }

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    scheduler.shutdown().await;
    store.close().await?;

    Ok(())
}

async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn MonitorStore>> {
    match &config.storage {
        #[cfg(feature = "storage-sqlite")]
        Some(StorageConfig::Sqlite { path, .. }) => {
            Ok(Arc::new(sentinel::store::SqliteStore::new(path).await?))
        }

        #[cfg(not(feature = "storage-sqlite"))]
        Some(StorageConfig::Sqlite { .. }) => {
            tracing::warn!("sqlite storage configured but the storage-sqlite feature is disabled");
            Ok(Arc::new(MemoryStore::new()))
        }

        _ => Ok(Arc::new(MemoryStore::new())),
    }
}

/// Register config-listed services that the store doesn't know yet,
/// matching by name.
async fn register_services(config: &Config, store: &dyn MonitorStore) -> anyhow::Result<()> {
    let Some(services) = &config.services else {
        return Ok(());
    };

    let known = store.list_services().await?;

    for service_config in services {
        if known.iter().any(|s| s.name == service_config.name) {
            trace!("{}: already registered", service_config.name);
            continue;
        }

        let service = store
            .create_service(service_config.clone().into_service())
            .await?;
        info!("registered service {} ({})", service.name, service.url);
    }

    Ok(())
}

/// Delete metrics older than the retention period, once a day.
fn spawn_retention_task(store: Arc<dyn MonitorStore>, retention_days: u32) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(24 * 60 * 60));

        loop {
            ticker.tick().await;

            let cutoff = chrono::Utc::now() - chrono::Duration::days(retention_days as i64);
            match store.prune_metrics(cutoff).await {
                Ok(deleted) if deleted > 0 => {
                    info!("retention: deleted {deleted} metrics older than {retention_days} days");
                }
                Ok(_) => {}
                Err(e) => error!("retention cleanup failed: {e}"),
            }
        }
    });
}
