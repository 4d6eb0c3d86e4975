use anyhow::Result;
use parking_monitor::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    tracing::info!(
        name = version::NAME,
        version = version::VERSION,
        serial_port = %app_config.serial.port,
        baud_rate = app_config.serial.baud_rate,
        data_file = %app_config.storage.path,
        "Smart parking monitor starting"
    );

    let history_repo = Arc::new(history_repo::HistoryRepo::new(&app_config.storage.path));
    let history = history_repo.load();
    tracing::info!(
        days = history.daily.len(),
        hours = history.hourly.len(),
        "History loaded"
    );

    let (persist_tx, persist_rx) = mpsc::channel(app_config.storage.writer_queue_capacity);
    let writer_handle = worker::spawn_history_writer(persist_rx, history_repo.clone());
    let (refresh_tx, _) = broadcast::channel(app_config.publishing.broadcast_capacity);

    let monitor = monitor::ParkingMonitor::new(
        monitor::MonitorDeps {
            history,
            connector: Arc::new(transport::SerialConnector::new(app_config.serial.clone())),
            persist_tx,
            refresh_tx,
        },
        monitor::MonitorConfig {
            autosave_every: app_config.storage.autosave_every,
            poll_interval: Duration::from_millis(app_config.serial.poll_interval_ms),
        },
    );

    let app = routes::app(monitor.clone());
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Received shutdown signal");
        }
    }

    monitor.shutdown().await;
    drop(monitor);
    if tokio::time::timeout(Duration::from_secs(5), writer_handle)
        .await
        .is_err()
    {
        tracing::warn!("History writer did not finish in time");
    }
    tracing::info!("Smart parking monitor stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
