// JSON history file: {"daily_data": {...}, "hourly_data": {...}, "last_updated": "..."}.
// Writes go to a sibling temp file that is renamed over the target.
// Reads never fail: a missing or damaged file yields whatever entries can be recovered.

mod file;

use crate::models::{DailyRecord, HourlyRecord, ParkingHistory};
use chrono::{Local, NaiveDateTime, Timelike};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{instrument, warn};

const LAST_UPDATED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
const LAST_UPDATED_WHOLE_SECONDS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to encode history: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Serialize)]
struct HistoryFile<'a> {
    daily_data: &'a BTreeMap<String, DailyRecord>,
    hourly_data: &'a BTreeMap<String, HourlyRecord>,
    last_updated: String,
}

pub struct HistoryRepo {
    path: PathBuf,
}

impl HistoryRepo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write both mappings, stamped with the current local time.
    pub fn save(&self, history: &ParkingHistory) -> Result<(), PersistenceError> {
        self.save_at(history, Local::now().naive_local())
    }

    #[instrument(skip(self, history), fields(repo = "history", operation = "save", days = history.daily.len(), hours = history.hourly.len()))]
    pub fn save_at(
        &self,
        history: &ParkingHistory,
        last_updated: NaiveDateTime,
    ) -> Result<(), PersistenceError> {
        let doc = HistoryFile {
            daily_data: &history.daily,
            hourly_data: &history.hourly,
            last_updated: format_last_updated(last_updated),
        };
        let json = serde_json::to_vec_pretty(&doc)?;
        file::write_replace(&self.path, &json).map_err(|source| PersistenceError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Load persisted history. Missing file, unreadable file and invalid JSON all give an
    /// empty history; malformed individual entries are skipped.
    #[instrument(skip(self), fields(repo = "history", operation = "load"))]
    pub fn load(&self) -> ParkingHistory {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no history file yet");
                return ParkingHistory::default();
            }
            Err(e) => {
                warn!(error = %e, path = %self.path.display(), "history file unreadable; starting empty");
                return ParkingHistory::default();
            }
        };
        let doc: serde_json::Value = match serde_json::from_slice(&bytes) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, path = %self.path.display(), "history file is not valid JSON; starting empty");
                return ParkingHistory::default();
            }
        };
        ParkingHistory {
            daily: records(&doc, "daily_data"),
            hourly: records(&doc, "hourly_data"),
        }
    }
}

/// ISO-8601 with microseconds, which are left out entirely when they are zero.
fn format_last_updated(at: NaiveDateTime) -> String {
    let format = if at.nanosecond() / 1_000 == 0 {
        LAST_UPDATED_WHOLE_SECONDS_FORMAT
    } else {
        LAST_UPDATED_FORMAT
    };
    at.format(format).to_string()
}

/// Decode `doc[section]` entry by entry, keeping the ones that decode.
fn records<T: DeserializeOwned>(doc: &serde_json::Value, section: &str) -> BTreeMap<String, T> {
    let Some(value) = doc.get(section) else {
        return BTreeMap::new();
    };
    let Some(entries) = value.as_object() else {
        warn!(section, "history section is not an object; ignoring it");
        return BTreeMap::new();
    };
    entries
        .iter()
        .filter_map(
            |(key, raw)| match serde_json::from_value::<T>(raw.clone()) {
                Ok(record) => Some((key.clone(), record)),
                Err(e) => {
                    warn!(section, key = %key, error = %e, "skipping malformed history entry");
                    None
                }
            },
        )
        .collect()
}
