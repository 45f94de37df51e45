//! Combines realtime and scheduled departures into one board per stop.

use std::collections::{BTreeMap, HashSet};

use anyhow::{Result, bail};
use chrono::{DateTime, FixedOffset};

use crate::calendar::ServiceCalendar;
use crate::model::{Departure, StopId, TripId};
use crate::realtime::RealtimeIndex;
use crate::schedule::ScheduleIndex;

/// A fully computed board: every requested stop maps to its departures,
/// empty when neither source knows an upcoming one.
pub type Board = BTreeMap<StopId, Vec<Departure>>;

/// Computes the merged departure board for `stop_ids` at `now`.
///
/// Realtime predictions win: where both sources know a trip, only the
/// realtime entry appears. The output map is ordered by stop id, so equal
/// inputs produce byte-identical output.
///
/// An empty stop id is a caller bug and fails fast.
pub fn next_departures(
    stop_ids: &[StopId],
    realtime: &RealtimeIndex,
    schedule: &ScheduleIndex,
    calendar: &dyn ServiceCalendar,
    now: &DateTime<FixedOffset>,
) -> Result<Board> {
    for stop_id in stop_ids {
        if stop_id.is_empty() {
            bail!("stop id must be a non-empty identifier");
        }
    }

    let mut board = Board::new();
    for stop_id in stop_ids {
        let from_feed = realtime.query(stop_id, now);
        let from_schedule = schedule.query(stop_id, now, calendar);
        board.insert(stop_id.clone(), merge(from_feed, from_schedule));
    }
    Ok(board)
}

/// Realtime entries first, untouched and in feed order; scheduled entries
/// follow in their own order, minus any trip the feed already covers.
fn merge(realtime: Vec<Departure>, scheduled: Vec<Departure>) -> Vec<Departure> {
    let mut merged = realtime;
    let covered: HashSet<TripId> = merged.iter().map(|d| d.trip_id.clone()).collect();
    for departure in scheduled {
        if !covered.contains(&departure.trip_id) {
            merged.push(departure);
        }
    }
    merged
}
