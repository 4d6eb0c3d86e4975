// Events parsed from one line of the gate controller's text protocol

/// Capacity assumed when a snapshot line omits `CAPACITY`, and at process start.
pub const DEFAULT_CAPACITY: u32 = 4;

/// Counters reported by one `PARKING_DATA:` line. The controller is the source of truth for
/// cumulative counts; `current` may exceed `capacity` and is kept as reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccupancySnapshot {
    pub entered: u32,
    pub current: u32,
    pub exited: u32,
    pub capacity: u32,
}

impl Default for OccupancySnapshot {
    fn default() -> Self {
        Self {
            entered: 0,
            current: 0,
            exited: 0,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedEvent {
    Snapshot(OccupancySnapshot),
    /// Full `STATUS:` line, prefix included.
    Status(String),
    /// Line announcing that the entry or exit gate is moving.
    GateAlert(String),
    Unrecognized,
}
