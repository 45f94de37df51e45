//! Identifier newtypes and the departure candidate produced by both the
//! realtime and the static side of the board.
//!
//! Stop and trip identifiers are opaque strings end to end. The upstream
//! feeds disagree about whether ids look numeric, so nothing in this crate
//! ever parses or compares them as numbers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque stop identifier, compared byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StopId(String);

impl StopId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque trip identifier; the key departures are deduplicated on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripId(String);

impl TripId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a service calendar in the static schedule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(String);

impl ServiceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which side of the board produced a departure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Realtime,
    Scheduled,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Realtime => f.write_str("realtime"),
            Source::Scheduled => f.write_str("scheduled"),
        }
    }
}

/// One upcoming departure for a stop, tagged with its originating source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Departure {
    pub trip_id: TripId,
    pub minutes_to_departure: u32,
    pub source: Source,
}

/// Minutes until a strictly-future instant: `floor(delta / 60) + 1`.
///
/// A departure anywhere inside the current minute reports 1, never 0.
/// Returns `None` for departures at or before `now`; those never make it
/// onto a board.
pub fn minutes_until(departure_epoch: i64, now_epoch: i64) -> Option<u32> {
    if departure_epoch <= now_epoch {
        return None;
    }
    Some(((departure_epoch - now_epoch) / 60 + 1) as u32)
}
