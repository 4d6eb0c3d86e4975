// What the presentation layer renders: one consistent copy of the live state.

use serde::{Deserialize, Serialize};

use super::state::{OccupancyLevel, SystemState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub connected: bool,
    pub current_cars: u32,
    pub max_capacity: u32,
    pub total_entered_today: u32,
    pub total_exited_today: u32,
    pub occupancy_level: OccupancyLevel,
    /// Newest first.
    pub recent_activity: Vec<String>,
    /// Last transport failure, cleared on the next successful connect.
    pub last_error: Option<String>,
}

impl DashboardSnapshot {
    pub fn new(
        state: &SystemState,
        connected: bool,
        recent_activity: Vec<String>,
        last_error: Option<String>,
    ) -> Self {
        Self {
            connected,
            current_cars: state.current_cars,
            max_capacity: state.max_capacity,
            total_entered_today: state.total_entered_today,
            total_exited_today: state.total_exited_today,
            occupancy_level: state.occupancy_level(),
            recent_activity,
            last_error,
        }
    }
}
