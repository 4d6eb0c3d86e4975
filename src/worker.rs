// Background work: the serial ingestion loop (blocking thread) and the history writer task.
// The ingestion loop never touches the disk; saves are handed to the writer over a channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::history_repo::{HistoryRepo, PersistenceError};
use crate::models::ParkingHistory;
use crate::monitor::ParkingMonitor;
use crate::transport::{Transport, TransportError};

/// One save for the history writer. `done` is answered for manual saves only.
pub struct PersistRequest {
    pub history: ParkingHistory,
    pub done: Option<oneshot::Sender<Result<(), PersistenceError>>>,
}

/// Spawns the task that writes history snapshots in the order they were requested.
/// Exits once every sender is gone.
pub fn spawn_history_writer(
    mut persist_rx: mpsc::Receiver<PersistRequest>,
    history_repo: Arc<HistoryRepo>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(PersistRequest { history, done }) = persist_rx.recv().await {
            let repo = history_repo.clone();
            let days = history.daily.len();
            let result = match tokio::task::spawn_blocking(move || repo.save(&history)).await {
                Ok(r) => r,
                Err(e) => {
                    warn!(error = %e, "history writer: save task failed");
                    continue;
                }
            };
            match &result {
                Ok(()) => debug!(operation = "save_history", days, "History saved"),
                Err(e) => warn!(error = %e, "history writer: save failed"),
            }
            if let Some(done) = done {
                let _ = done.send(result);
            }
        }
        debug!("History writer shutting down");
    })
}

/// Reads at most one line if the transport has input buffered. Trailing whitespace is
/// trimmed; invalid UTF-8 is replaced rather than rejected.
pub fn poll_line(transport: &mut dyn Transport) -> Result<Option<String>, TransportError> {
    if !transport.is_open() {
        return Err(TransportError::Closed);
    }
    if transport.bytes_available()? == 0 {
        return Ok(None);
    }
    let raw = transport.read_line()?;
    Ok(Some(String::from_utf8_lossy(&raw).trim_end().to_string()))
}

/// Runs the ingestion loop on a blocking thread until `stop` is set or the transport fails.
pub(crate) fn spawn_ingestion(
    monitor: Arc<ParkingMonitor>,
    transport: Box<dyn Transport>,
    stop: Arc<AtomicBool>,
    generation: u64,
    poll_interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        run_ingestion(&monitor, transport, &stop, generation, poll_interval)
    })
}

fn run_ingestion(
    monitor: &ParkingMonitor,
    mut transport: Box<dyn Transport>,
    stop: &AtomicBool,
    generation: u64,
    poll_interval: Duration,
) {
    let span = tracing::span!(
        tracing::Level::DEBUG,
        "ingestion",
        generation,
        poll_interval_ms = poll_interval.as_millis() as u64
    );
    let _guard = span.enter();

    while !stop.load(Ordering::Acquire) {
        match poll_line(transport.as_mut()) {
            Ok(Some(line)) => monitor.ingest_line(&line),
            Ok(None) => {}
            Err(e) => {
                transport.close();
                monitor.handle_transport_failure(generation, &e);
                return;
            }
        }
        std::thread::sleep(poll_interval);
    }
    transport.close();
    debug!("Ingestion stopped");
}
