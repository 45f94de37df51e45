//! Index over the decoded realtime feed: stop id -> predicted departures.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};

use crate::model::{Departure, Source, StopId, TripId, minutes_until};

/// Only outbound trips appear on the board.
const OUTBOUND_DIRECTION: u32 = 0;

/// One decoded trip update from the realtime feed.
#[derive(Debug, Clone)]
pub struct TripUpdateRecord {
    pub trip_id: TripId,
    pub direction_id: u32,
    pub stop_time_updates: Vec<StopTimeUpdateRecord>,
}

/// A predicted departure instant for one stop of a trip.
#[derive(Debug, Clone)]
pub struct StopTimeUpdateRecord {
    pub stop_id: StopId,
    pub departure_epoch: i64,
}

/// Read-only snapshot of one realtime feed poll, keyed by stop.
///
/// An empty or absent feed builds an empty index; every stop then simply
/// has no realtime predictions, which is not an error.
pub struct RealtimeIndex {
    by_stop: HashMap<StopId, Vec<(TripId, i64)>>,
}

impl RealtimeIndex {
    pub fn build(records: &[TripUpdateRecord]) -> Self {
        let mut by_stop: HashMap<StopId, Vec<(TripId, i64)>> = HashMap::new();
        for record in records {
            if record.direction_id != OUTBOUND_DIRECTION {
                continue;
            }
            for update in &record.stop_time_updates {
                by_stop
                    .entry(update.stop_id.clone())
                    .or_default()
                    .push((record.trip_id.clone(), update.departure_epoch));
            }
        }
        Self { by_stop }
    }

    /// Every strictly-future predicted departure for `stop_id`, in feed
    /// order. The feed publishes predictions time-ordered per trip, so this
    /// layer neither sorts nor caps.
    pub fn query(&self, stop_id: &StopId, now: &DateTime<FixedOffset>) -> Vec<Departure> {
        let Some(entries) = self.by_stop.get(stop_id) else {
            return Vec::new();
        };
        let now_epoch = now.timestamp();

        entries
            .iter()
            .filter_map(|(trip_id, departure_epoch)| {
                let minutes = minutes_until(*departure_epoch, now_epoch)?;
                Some(Departure {
                    trip_id: trip_id.clone(),
                    minutes_to_departure: minutes,
                    source: Source::Realtime,
                })
            })
            .collect()
    }
}
