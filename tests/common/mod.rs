// Shared test helpers: an in-memory transport and a monitor wired to a temp history file

#![allow(dead_code)]

use parking_monitor::history_repo::HistoryRepo;
use parking_monitor::models::ParkingHistory;
use parking_monitor::monitor::{MonitorConfig, MonitorDeps, ParkingMonitor};
use parking_monitor::transport::{Connector, Transport, TransportError};
use parking_monitor::worker::spawn_history_writer;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::{broadcast, mpsc};

pub enum Feed {
    Line(Vec<u8>),
    Fail,
}

/// Lines the scripted device will send; shared between the test and the transport.
#[derive(Clone, Default)]
pub struct Script {
    feed: Arc<Mutex<VecDeque<Feed>>>,
    closed: Arc<AtomicBool>,
}

impl Script {
    pub fn push_line(&self, line: &str) {
        let mut bytes = line.as_bytes().to_vec();
        bytes.extend_from_slice(b"\r\n");
        self.feed.lock().unwrap().push_back(Feed::Line(bytes));
    }

    pub fn push_raw(&self, bytes: &[u8]) {
        self.feed.lock().unwrap().push_back(Feed::Line(bytes.to_vec()));
    }

    pub fn push_failure(&self) {
        self.feed.lock().unwrap().push_back(Feed::Fail);
    }

    pub fn pending(&self) -> usize {
        self.feed.lock().unwrap().len()
    }

    pub fn was_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct ScriptedTransport {
    script: Script,
    open: bool,
}

impl ScriptedTransport {
    pub fn new(script: Script) -> Self {
        Self { script, open: true }
    }
}

impl Transport for ScriptedTransport {
    fn is_open(&self) -> bool {
        self.open
    }

    fn bytes_available(&mut self) -> Result<usize, TransportError> {
        let feed = self.script.feed.lock().unwrap();
        Ok(match feed.front() {
            Some(Feed::Line(bytes)) => bytes.len(),
            Some(Feed::Fail) => 1,
            None => 0,
        })
    }

    fn read_line(&mut self) -> Result<Vec<u8>, TransportError> {
        match self.script.feed.lock().unwrap().pop_front() {
            Some(Feed::Line(bytes)) => Ok(bytes),
            Some(Feed::Fail) => Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "device unplugged",
            ))),
            None => Ok(Vec::new()),
        }
    }

    fn close(&mut self) {
        self.open = false;
        self.script.closed.store(true, Ordering::SeqCst);
    }
}

pub struct ScriptedConnector {
    pub script: Script,
    pub fail_open: AtomicBool,
    pub opens: AtomicUsize,
}

impl ScriptedConnector {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            fail_open: AtomicBool::new(false),
            opens: AtomicUsize::new(0),
        }
    }
}

impl Connector for ScriptedConnector {
    fn open(&self) -> Result<Box<dyn Transport>, TransportError> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no such port",
            )));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedTransport::new(self.script.clone())))
    }

    fn describe(&self) -> String {
        "scripted".into()
    }
}

pub struct Harness {
    pub monitor: Arc<ParkingMonitor>,
    pub connector: Arc<ScriptedConnector>,
    pub script: Script,
    pub repo: Arc<HistoryRepo>,
    pub dir: TempDir,
    pub writer: tokio::task::JoinHandle<()>,
}

/// Monitor with a scripted device, a 5 ms poll interval and history in a temp dir.
/// Must be called inside a tokio runtime.
pub fn harness(history: ParkingHistory) -> Harness {
    let dir = TempDir::new().unwrap();
    let repo = Arc::new(HistoryRepo::new(dir.path().join("parking_data.json")));
    let (persist_tx, persist_rx) = mpsc::channel(16);
    let writer = spawn_history_writer(persist_rx, repo.clone());
    let (refresh_tx, _) = broadcast::channel(64);
    let script = Script::default();
    let connector = Arc::new(ScriptedConnector::new(script.clone()));
    let monitor = ParkingMonitor::new(
        MonitorDeps {
            history,
            connector: connector.clone(),
            persist_tx,
            refresh_tx,
        },
        MonitorConfig {
            autosave_every: 10,
            poll_interval: Duration::from_millis(5),
        },
    );
    Harness {
        monitor,
        connector,
        script,
        repo,
        dir,
        writer,
    }
}

/// Polls `cond` every 10 ms for up to 3 s.
pub async fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + tokio::time::Duration::from_secs(3);
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    }
    cond()
}
