// Shared core behind the dashboard: counters and rollups under one lock, the activity log,
// the connection lifecycle, and change notification for the presentation layer.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::activity_log::ActivityLog;
use crate::aggregator::Aggregator;
use crate::history_repo::PersistenceError;
use crate::models::{DailyHistory, DashboardSnapshot, HourlyHistory, ParkingHistory, SystemState};
use crate::parser;
use crate::transport::{Connector, TransportError};
use crate::worker::{self, PersistRequest};

const CONNECTED_NOTE: &str = "✅ Connected to gate controller";
const DISCONNECTED_NOTE: &str = "❌ Disconnected from gate controller";
const CLEARED_NOTE: &str = "🗑️ Today's data cleared";

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("already connected")]
    AlreadyConnected,
    #[error("not connected")]
    NotConnected,
    #[error("{0}")]
    NoData(&'static str),
    #[error("history writer is not running")]
    WriterClosed,
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Collaborators handed to the monitor at startup.
pub struct MonitorDeps {
    pub history: ParkingHistory,
    pub connector: Arc<dyn Connector>,
    pub persist_tx: mpsc::Sender<PersistRequest>,
    pub refresh_tx: broadcast::Sender<DashboardSnapshot>,
}

pub struct MonitorConfig {
    pub autosave_every: u32,
    pub poll_interval: Duration,
}

struct Connection {
    generation: u64,
    stop: Arc<AtomicBool>,
    handle: tokio::task::JoinHandle<()>,
}

#[derive(Default)]
struct Link {
    connection: Option<Connection>,
    last_error: Option<String>,
}

pub struct ParkingMonitor {
    core: Mutex<Aggregator>,
    activity: ActivityLog,
    link: Mutex<Link>,
    connector: Arc<dyn Connector>,
    persist_tx: Mutex<Option<mpsc::Sender<PersistRequest>>>,
    refresh_tx: broadcast::Sender<DashboardSnapshot>,
    poll_interval: Duration,
    next_generation: AtomicU64,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl ParkingMonitor {
    pub fn new(deps: MonitorDeps, config: MonitorConfig) -> Arc<Self> {
        let MonitorDeps {
            history,
            connector,
            persist_tx,
            refresh_tx,
        } = deps;
        Arc::new(Self {
            core: Mutex::new(Aggregator::new(history, config.autosave_every)),
            activity: ActivityLog::default(),
            link: Mutex::new(Link::default()),
            connector,
            persist_tx: Mutex::new(Some(persist_tx)),
            refresh_tx,
            poll_interval: config.poll_interval,
            next_generation: AtomicU64::new(1),
        })
    }

    /// Receives a fresh dashboard snapshot after every change.
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardSnapshot> {
        self.refresh_tx.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        lock(&self.link).connection.is_some()
    }

    pub fn state(&self) -> SystemState {
        lock(&self.core).state()
    }

    pub fn history(&self) -> ParkingHistory {
        lock(&self.core).history().clone()
    }

    pub fn recent_activity(&self) -> Vec<String> {
        self.activity.snapshot()
    }

    /// Counters and activity are read under the aggregator lock, so the newest note always
    /// matches the counters it describes.
    pub fn dashboard(&self) -> DashboardSnapshot {
        let (state, recent_activity) = {
            let core = lock(&self.core);
            (core.state(), self.activity.snapshot())
        };
        let (connected, last_error) = {
            let link = lock(&self.link);
            (link.connection.is_some(), link.last_error.clone())
        };
        DashboardSnapshot::new(&state, connected, recent_activity, last_error)
    }

    fn publish(&self) -> DashboardSnapshot {
        let snapshot = self.dashboard();
        if self.refresh_tx.send(snapshot.clone()).is_err() {
            tracing::trace!(
                operation = "broadcast_dashboard",
                "No dashboard subscribers"
            );
        }
        snapshot
    }

    pub fn ingest_line(&self, line: &str) {
        self.ingest_line_at(line, now());
    }

    /// Parse one line and apply it. Malformed snapshots are logged and dropped.
    pub fn ingest_line_at(&self, line: &str, at: NaiveDateTime) {
        let event = match parser::parse(line) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, line, operation = "parse_line", "Discarding malformed snapshot");
                return;
            }
        };

        let (refresh, autosave) = {
            let mut core = lock(&self.core);
            let outcome = core.apply(&event, at);
            let noted = outcome.note.is_some();
            if let Some(note) = outcome.note {
                self.activity.append(note, at);
            }
            let autosave = outcome.persist.then(|| core.history().clone());
            (outcome.refresh || noted, autosave)
        };

        if let Some(history) = autosave {
            self.request_autosave(history);
        }
        if refresh {
            self.publish();
        }
    }

    /// Never waits: when the writer is backed up the request is dropped.
    fn request_autosave(&self, history: ParkingHistory) {
        let guard = lock(&self.persist_tx);
        let Some(tx) = guard.as_ref() else {
            debug!(operation = "autosave", "History writer closed; autosave skipped");
            return;
        };
        match tx.try_send(PersistRequest {
            history,
            done: None,
        }) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(operation = "autosave", "History writer busy; autosave skipped")
            }
            Err(TrySendError::Closed(_)) => {
                debug!(operation = "autosave", "History writer closed; autosave skipped")
            }
        }
    }

    /// Opens the transport and starts the ingestion worker.
    pub async fn connect(self: &Arc<Self>) -> Result<DashboardSnapshot, MonitorError> {
        if self.is_connected() {
            return Err(MonitorError::AlreadyConnected);
        }
        let connector = self.connector.clone();
        let mut transport = match tokio::task::spawn_blocking(move || connector.open()).await? {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, device = %self.connector.describe(), operation = "connect", "Connection failed");
                lock(&self.link).last_error = Some(e.to_string());
                self.publish();
                return Err(e.into());
            }
        };

        {
            let mut link = lock(&self.link);
            if link.connection.is_some() {
                transport.close();
                return Err(MonitorError::AlreadyConnected);
            }
            let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
            let stop = Arc::new(AtomicBool::new(false));
            let handle = worker::spawn_ingestion(
                self.clone(),
                transport,
                stop.clone(),
                generation,
                self.poll_interval,
            );
            link.connection = Some(Connection {
                generation,
                stop,
                handle,
            });
            link.last_error = None;
        }

        info!(device = %self.connector.describe(), "Connected to gate controller");
        self.activity.append(CONNECTED_NOTE, now());
        Ok(self.publish())
    }

    /// Stops the ingestion worker and waits for it to close the transport.
    pub async fn disconnect(&self) -> Result<DashboardSnapshot, MonitorError> {
        let connection = lock(&self.link)
            .connection
            .take()
            .ok_or(MonitorError::NotConnected)?;
        connection.stop.store(true, Ordering::Release);
        if let Err(e) = connection.handle.await {
            warn!(error = %e, operation = "disconnect", "Ingestion worker ended abnormally");
        }
        info!(generation = connection.generation, "Disconnected from gate controller");
        self.activity.append(DISCONNECTED_NOTE, now());
        Ok(self.publish())
    }

    /// Called by the ingestion worker when a read fails. No retry: the operator reconnects.
    pub(crate) fn handle_transport_failure(&self, generation: u64, err: &TransportError) {
        warn!(error = %err, generation, operation = "read_line", "Transport failed; disconnecting");
        {
            let mut link = lock(&self.link);
            let current = link.connection.as_ref().map(|c| c.generation);
            if current != Some(generation) {
                return;
            }
            link.connection = None;
            link.last_error = Some(err.to_string());
        }
        self.activity.append(DISCONNECTED_NOTE, now());
        self.publish();
    }

    /// Zero today's live counters; recorded history is untouched.
    pub fn clear_today(&self) -> DashboardSnapshot {
        {
            let mut core = lock(&self.core);
            core.clear_today();
            self.activity.append(CLEARED_NOTE, now());
        }
        info!(operation = "clear_today", "Today's counters cleared");
        self.publish()
    }

    pub fn daily_history(&self) -> Result<DailyHistory, MonitorError> {
        lock(&self.core)
            .daily_history()
            .ok_or(MonitorError::NoData("No daily data available to display"))
    }

    pub fn hourly_history_today(&self) -> Result<HourlyHistory, MonitorError> {
        self.hourly_history_on(now().date())
    }

    pub fn hourly_history_on(&self, day: NaiveDate) -> Result<HourlyHistory, MonitorError> {
        lock(&self.core)
            .hourly_history(day)
            .ok_or(MonitorError::NoData("No hourly data available for today"))
    }

    /// Save through the history writer and wait for the result.
    pub async fn save_now(&self) -> Result<(), MonitorError> {
        let tx = lock(&self.persist_tx)
            .clone()
            .ok_or(MonitorError::WriterClosed)?;
        let (done_tx, done_rx) = oneshot::channel();
        tx.send(PersistRequest {
            history: self.history(),
            done: Some(done_tx),
        })
        .await
        .map_err(|_| MonitorError::WriterClosed)?;
        done_rx.await.map_err(|_| MonitorError::WriterClosed)??;
        Ok(())
    }

    /// Disconnect, write a final save and release the history writer.
    pub async fn shutdown(&self) {
        if self.is_connected()
            && let Err(e) = self.disconnect().await
        {
            debug!(error = %e, "disconnect during shutdown");
        }
        if let Err(e) = self.save_now().await {
            warn!(error = %e, operation = "shutdown", "Final save failed");
        }
        lock(&self.persist_tx).take();
    }
}
