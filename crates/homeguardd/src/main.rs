use std::sync::Arc;

use anyhow::{Context, Result};
use homeguard_store::FaceStore;
use tracing_subscriber::EnvFilter;

mod config;
mod dbus_interface;
mod embedder;
mod engine;
mod notifier;

const BUS_NAME: &str = "org.homeguard.Monitor1";
const OBJECT_PATH: &str = "/org/homeguard/Monitor1";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("homeguardd starting");

    let config = config::Config::from_env();
    if let Some(dir) = config.db_path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating data directory {}", dir.display()))?;
    }

    let store = FaceStore::open(&config.db_path)
        .await
        .with_context(|| format!("opening database {}", config.db_path.display()))?;
    tracing::info!(
        path = %config.db_path.display(),
        threshold = config.match_threshold,
        alert_on_recognized = config.alert_on_recognized,
        notifications = config.notifications_enabled,
        "store opened"
    );

    let engine = engine::spawn_engine(
        store,
        Arc::new(embedder::DisabledEmbedder),
        Arc::new(notifier::LogNotifier),
        config.engine_settings(),
    );

    let service = dbus_interface::MonitorService { engine };
    let builder = if config.session_bus {
        zbus::connection::Builder::session()?
    } else {
        zbus::connection::Builder::system()?
    };
    let _conn = builder
        .name(BUS_NAME)?
        .serve_at(OBJECT_PATH, service)?
        .build()
        .await
        .context("registering D-Bus service")?;

    tracing::info!(bus = BUS_NAME, "homeguardd ready");

    // Keep running until signaled
    tokio::signal::ctrl_c().await?;
    tracing::info!("homeguardd shutting down");

    Ok(())
}
