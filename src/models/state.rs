// Live counters and occupancy classification

use serde::{Deserialize, Serialize};

use super::event::{DEFAULT_CAPACITY, OccupancySnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemState {
    pub current_cars: u32,
    pub total_entered_today: u32,
    pub total_exited_today: u32,
    pub max_capacity: u32,
}

impl Default for SystemState {
    fn default() -> Self {
        Self {
            current_cars: 0,
            total_entered_today: 0,
            total_exited_today: 0,
            max_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl SystemState {
    /// Overwrite every counter with the controller's values.
    pub fn replace_with(&mut self, snapshot: &OccupancySnapshot) {
        self.current_cars = snapshot.current;
        self.total_entered_today = snapshot.entered;
        self.total_exited_today = snapshot.exited;
        self.max_capacity = snapshot.capacity;
    }

    pub fn occupancy_level(&self) -> OccupancyLevel {
        OccupancyLevel::classify(self.current_cars, self.max_capacity)
    }
}

/// Colour band for the occupancy display; serializes as "ok", "near-full" or "full".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OccupancyLevel {
    Ok,
    NearFull,
    Full,
}

impl OccupancyLevel {
    /// A zero capacity counts as full.
    pub fn classify(current: u32, capacity: u32) -> Self {
        if capacity == 0 {
            return OccupancyLevel::Full;
        }
        let ratio = current as f64 / capacity as f64;
        if ratio >= 1.0 {
            OccupancyLevel::Full
        } else if ratio >= 0.75 {
            OccupancyLevel::NearFull
        } else {
            OccupancyLevel::Ok
        }
    }
}
