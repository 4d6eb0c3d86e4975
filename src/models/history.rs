// Daily and hourly rollups (persisted) and the chart-ready series built from them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One calendar day, keyed by `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRecord {
    #[serde(default)]
    pub entered: u32,
    #[serde(default)]
    pub exited: u32,
    #[serde(default)]
    pub peak_occupancy: u32,
}

/// One hour bucket, keyed by `YYYY-MM-DD HH:00`.
/// `entered` / `exited` are part of the file format but are never populated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyRecord {
    #[serde(default)]
    pub entered: u32,
    #[serde(default)]
    pub exited: u32,
    #[serde(default)]
    pub occupancy: u32,
}

/// Both rollup mappings. Keys sort chronologically as plain strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParkingHistory {
    pub daily: BTreeMap<String, DailyRecord>,
    pub hourly: BTreeMap<String, HourlyRecord>,
}

impl ParkingHistory {
    pub fn is_empty(&self) -> bool {
        self.daily.is_empty() && self.hourly.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPoint {
    pub date: String,
    pub entered: u32,
    pub exited: u32,
    pub peak_occupancy: u32,
}

/// Days in ascending order plus the capacity reference line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyHistory {
    pub max_capacity: u32,
    pub points: Vec<DailyPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyPoint {
    /// `HH:MM`
    pub hour: String,
    pub occupancy: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyHistory {
    pub date: String,
    pub max_capacity: u32,
    pub points: Vec<HourlyPoint>,
}
