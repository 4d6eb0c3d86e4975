// Domain models: wire events, live state, persisted history, dashboard view

mod dashboard;
mod event;
mod history;
mod state;

pub use dashboard::DashboardSnapshot;
pub use event::{DEFAULT_CAPACITY, OccupancySnapshot, ParsedEvent};
pub use history::{
    DailyHistory, DailyPoint, DailyRecord, HourlyHistory, HourlyPoint, HourlyRecord,
    ParkingHistory,
};
pub use state::{OccupancyLevel, SystemState};
