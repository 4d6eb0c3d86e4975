// Applies parsed events to the live counters and rolls them up into daily / hourly buckets.
// Single writer: the ingestion worker (and the clear-today action) mutate it under one lock.

use chrono::{NaiveDate, NaiveDateTime};

use crate::models::{
    DailyHistory, DailyPoint, HourlyHistory, HourlyPoint, OccupancySnapshot, ParkingHistory,
    ParsedEvent, SystemState,
};

pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";
pub const HOUR_KEY_FORMAT: &str = "%Y-%m-%d %H:00";
const HOUR_LABEL_FORMAT: &str = "%H:%M";

/// Default number of entries between automatic saves.
pub const DEFAULT_AUTOSAVE_EVERY: u32 = 10;

/// Result of applying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub state: SystemState,
    /// Human-readable line for the activity log.
    pub note: Option<String>,
    /// Counters changed; the dashboard should re-render.
    pub refresh: bool,
    /// Rollups should be written to disk now.
    pub persist: bool,
}

impl ApplyOutcome {
    fn unchanged(state: SystemState) -> Self {
        Self {
            state,
            note: None,
            refresh: false,
            persist: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Aggregator {
    state: SystemState,
    history: ParkingHistory,
    autosave_every: u32,
}

impl Aggregator {
    /// Start from default counters and previously persisted history.
    pub fn new(history: ParkingHistory, autosave_every: u32) -> Self {
        Self {
            state: SystemState::default(),
            history,
            autosave_every: autosave_every.max(1),
        }
    }

    pub fn state(&self) -> SystemState {
        self.state
    }

    pub fn history(&self) -> &ParkingHistory {
        &self.history
    }

    pub fn apply(&mut self, event: &ParsedEvent, now: NaiveDateTime) -> ApplyOutcome {
        match event {
            ParsedEvent::Snapshot(snapshot) => self.apply_snapshot(snapshot, now),
            ParsedEvent::Status(text) => ApplyOutcome {
                note: Some(format!("📊 {}", text)),
                ..ApplyOutcome::unchanged(self.state)
            },
            ParsedEvent::GateAlert(text) => ApplyOutcome {
                note: Some(format!("🚨 {}", text)),
                ..ApplyOutcome::unchanged(self.state)
            },
            ParsedEvent::Unrecognized => ApplyOutcome::unchanged(self.state),
        }
    }

    fn apply_snapshot(&mut self, snapshot: &OccupancySnapshot, now: NaiveDateTime) -> ApplyOutcome {
        let old_current = self.state.current_cars;
        self.state.replace_with(snapshot);
        let new_current = self.state.current_cars;

        let note = (old_current != new_current).then(|| {
            let verb = if new_current > old_current {
                "🚗 Car entered"
            } else {
                "🚙 Car exited"
            };
            format!("{} - Now: {}/{}", verb, new_current, self.state.max_capacity)
        });

        let persist = self.update_rollups(now);

        ApplyOutcome {
            state: self.state,
            note,
            refresh: true,
            persist,
        }
    }

    /// Returns whether the auto-save cadence is due (also true when nothing has entered yet).
    fn update_rollups(&mut self, now: NaiveDateTime) -> bool {
        let today = now.format(DAY_KEY_FORMAT).to_string();
        let hour_bucket = now.format(HOUR_KEY_FORMAT).to_string();

        let daily = self.history.daily.entry(today).or_default();
        daily.entered = self.state.total_entered_today;
        daily.exited = self.state.total_exited_today;
        daily.peak_occupancy = daily.peak_occupancy.max(self.state.current_cars);

        let hourly = self.history.hourly.entry(hour_bucket).or_default();
        hourly.occupancy = self.state.current_cars;

        self.state.total_entered_today % self.autosave_every == 0
    }

    /// Reset today's live counters. Capacity and recorded history are kept.
    pub fn clear_today(&mut self) -> SystemState {
        self.state.current_cars = 0;
        self.state.total_entered_today = 0;
        self.state.total_exited_today = 0;
        self.state
    }

    /// All recorded days in ascending order, or `None` when nothing has been recorded.
    pub fn daily_history(&self) -> Option<DailyHistory> {
        if self.history.daily.is_empty() {
            return None;
        }
        let points = self
            .history
            .daily
            .iter()
            .map(|(date, record)| DailyPoint {
                date: date.clone(),
                entered: record.entered,
                exited: record.exited,
                peak_occupancy: record.peak_occupancy,
            })
            .collect();
        Some(DailyHistory {
            max_capacity: self.state.max_capacity,
            points,
        })
    }

    /// Hour buckets recorded on `day`, labelled `HH:MM`. Keys that do not parse are skipped.
    pub fn hourly_history(&self, day: NaiveDate) -> Option<HourlyHistory> {
        let date = day.format(DAY_KEY_FORMAT).to_string();
        let points: Vec<HourlyPoint> = self
            .history
            .hourly
            .range(date.clone()..)
            .take_while(|(key, _)| key.starts_with(&date))
            .filter_map(|(key, record)| {
                let hour = NaiveDateTime::parse_from_str(key, "%Y-%m-%d %H:%M").ok()?;
                Some(HourlyPoint {
                    hour: hour.format(HOUR_LABEL_FORMAT).to_string(),
                    occupancy: record.occupancy,
                })
            })
            .collect();
        if points.is_empty() {
            return None;
        }
        Some(HourlyHistory {
            date,
            max_capacity: self.state.max_capacity,
            points,
        })
    }
}
