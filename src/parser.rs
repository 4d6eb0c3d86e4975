// Line protocol of the gate controller:
//   PARKING_DATA:ENTERED=5,CURRENT=2,EXITED=3,CAPACITY=4   (keys in any order, missing keys default)
//   STATUS:<free text>
//   ... ENTRY GATE ACTIVATING ... / ... EXIT GATE ACTIVATING ...

use crate::models::{OccupancySnapshot, ParsedEvent};

pub const SNAPSHOT_PREFIX: &str = "PARKING_DATA:";
pub const STATUS_PREFIX: &str = "STATUS:";
const GATE_ALERTS: [&str; 2] = ["ENTRY GATE ACTIVATING", "EXIT GATE ACTIVATING"];

/// A `PARKING_DATA:` line that could not be turned into counters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedSnapshot {
    #[error("token {token:?} has no '='")]
    MissingSeparator { token: String },
    #[error("value {value:?} for key {key:?} is not an unsigned integer")]
    InvalidValue { key: String, value: String },
}

/// Classify one line. Pure: no logging, no state.
pub fn parse(line: &str) -> Result<ParsedEvent, MalformedSnapshot> {
    if let Some(body) = line.strip_prefix(SNAPSHOT_PREFIX) {
        return parse_snapshot(body).map(ParsedEvent::Snapshot);
    }
    if line.starts_with(STATUS_PREFIX) {
        return Ok(ParsedEvent::Status(line.to_string()));
    }
    if GATE_ALERTS.iter().any(|alert| line.contains(alert)) {
        return Ok(ParsedEvent::GateAlert(line.to_string()));
    }
    Ok(ParsedEvent::Unrecognized)
}

fn parse_snapshot(body: &str) -> Result<OccupancySnapshot, MalformedSnapshot> {
    let mut snapshot = OccupancySnapshot::default();
    for token in body.split(',') {
        let Some((key, value)) = token.split_once('=') else {
            return Err(MalformedSnapshot::MissingSeparator {
                token: token.to_string(),
            });
        };
        let parsed: u32 =
            value
                .trim()
                .parse()
                .map_err(|_| MalformedSnapshot::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                })?;
        match key {
            "ENTERED" => snapshot.entered = parsed,
            "CURRENT" => snapshot.current = parsed,
            "EXITED" => snapshot.exited = parsed,
            "CAPACITY" => snapshot.capacity = parsed,
            _ => {}
        }
    }
    Ok(snapshot)
}

