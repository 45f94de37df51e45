//! Index over the static schedule: stop id -> upcoming scheduled departures.
//!
//! Built once per schedule snapshot from trips.txt and stop_times.txt rows,
//! so a query touches only the rows for the requested stop instead of
//! rescanning the whole stop-time table.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime, TimeZone};
use tracing::debug;

use crate::calendar::ServiceCalendar;
use crate::gtfs_static::{StopTimeRow, TripRow};
use crate::model::{Departure, ServiceId, Source, StopId, TripId, minutes_until};

/// A stop's board never shows more than this many scheduled departures.
pub const SCHEDULED_PER_STOP: usize = 2;

/// Only outbound trips appear on the board.
const OUTBOUND_DIRECTION: &str = "0";

const SECONDS_PER_DAY: u32 = 86_400;

#[derive(Debug, Clone)]
struct StopEntry {
    trip_id: TripId,
    service_id: ServiceId,
    direction_id: String,
    /// Seconds since local midnight; 86_400 and above rolls to the next day.
    departure_secs: u32,
}

/// Read-only snapshot of the static timetable, keyed by stop.
pub struct ScheduleIndex {
    by_stop: HashMap<StopId, Vec<StopEntry>>,
}

impl ScheduleIndex {
    /// Resolves every stop-time row through the trip table and groups the
    /// survivors by stop, preserving row order within each stop.
    ///
    /// Rows whose trip is missing from trips.txt and rows with an
    /// unparseable departure time are data-quality problems: they are
    /// skipped and counted, never fatal.
    pub fn build(trips: &[TripRow], stop_times: &[StopTimeRow]) -> Self {
        let trip_info: HashMap<&TripId, &TripRow> =
            trips.iter().map(|t| (&t.trip_id, t)).collect();

        let mut by_stop: HashMap<StopId, Vec<StopEntry>> = HashMap::new();
        let mut unknown_trip = 0usize;
        let mut bad_time = 0usize;

        for row in stop_times {
            let Some(trip) = trip_info.get(&row.trip_id) else {
                unknown_trip += 1;
                continue;
            };
            let Some(departure_secs) = parse_departure_time(&row.departure_time) else {
                bad_time += 1;
                continue;
            };
            by_stop.entry(row.stop_id.clone()).or_default().push(StopEntry {
                trip_id: row.trip_id.clone(),
                service_id: trip.service_id.clone(),
                direction_id: trip.direction_id.clone(),
                departure_secs,
            });
        }

        if unknown_trip > 0 || bad_time > 0 {
            debug!(unknown_trip, bad_time, "Skipped unusable stop-time rows");
        }

        Self { by_stop }
    }

    /// The next scheduled departures for `stop_id`, at most
    /// [`SCHEDULED_PER_STOP`], sorted ascending by minutes to departure.
    ///
    /// Keeps only outbound entries running under the service the calendar
    /// selects for `now`, with a departure instant strictly after `now`.
    /// Ties keep their stop-time row order.
    pub fn query(
        &self,
        stop_id: &StopId,
        now: &DateTime<FixedOffset>,
        calendar: &dyn ServiceCalendar,
    ) -> Vec<Departure> {
        let Some(entries) = self.by_stop.get(stop_id) else {
            return Vec::new();
        };
        let service = calendar.service_for(now);

        let mut upcoming: Vec<Departure> = Vec::new();
        for entry in entries {
            if entry.direction_id != OUTBOUND_DIRECTION || entry.service_id != service {
                continue;
            }
            let Some(epoch) = local_departure_epoch(now, entry.departure_secs) else {
                continue;
            };
            let Some(minutes) = minutes_until(epoch, now.timestamp()) else {
                continue;
            };
            upcoming.push(Departure {
                trip_id: entry.trip_id.clone(),
                minutes_to_departure: minutes,
                source: Source::Scheduled,
            });
        }

        upcoming.sort_by_key(|d| d.minutes_to_departure);
        upcoming.truncate(SCHEDULED_PER_STOP);
        upcoming
    }

    /// Number of distinct stops with at least one usable stop-time row.
    pub fn stop_count(&self) -> usize {
        self.by_stop.len()
    }
}

/// Parses a GTFS "HH:MM:SS" departure time to seconds since midnight.
/// Hours of 24 and above are legal (trips running past midnight).
fn parse_departure_time(raw: &str) -> Option<u32> {
    let mut parts = raw.trim().splitn(3, ':');
    let hours: u32 = parts.next()?.parse().ok()?;
    let minutes: u32 = parts.next()?.parse().ok()?;
    let seconds: u32 = parts.next()?.parse().ok()?;
    if minutes > 59 || seconds > 59 {
        return None;
    }
    Some(hours * 3600 + minutes * 60 + seconds)
}

/// Combines seconds-since-midnight with `now`'s local date and offset to an
/// absolute epoch instant. Times of 24:00:00 and later land on the next day.
fn local_departure_epoch(now: &DateTime<FixedOffset>, departure_secs: u32) -> Option<i64> {
    let (date, secs) = if departure_secs >= SECONDS_PER_DAY {
        (now.date_naive().succ_opt()?, departure_secs - SECONDS_PER_DAY)
    } else {
        (now.date_naive(), departure_secs)
    };
    let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, 0)?;
    let local = NaiveDateTime::new(date, time);
    Some(now.offset().from_local_datetime(&local).single()?.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::WeekdayWeekendCalendar;

    fn trip(id: &str, service: &str, direction: &str) -> TripRow {
        TripRow {
            trip_id: TripId::new(id),
            service_id: ServiceId::new(service),
            direction_id: direction.to_string(),
        }
    }

    fn stop_time(trip_id: &str, stop_id: &str, departure: &str) -> StopTimeRow {
        StopTimeRow {
            trip_id: TripId::new(trip_id),
            stop_id: StopId::new(stop_id),
            departure_time: departure.to_string(),
        }
    }

    fn monday_10am() -> DateTime<FixedOffset> {
        // 2026-08-03 is a Monday.
        DateTime::parse_from_rfc3339("2026-08-03T10:00:00-04:00").unwrap()
    }

    #[test]
    fn test_parse_departure_time() {
        assert_eq!(parse_departure_time("08:30:00"), Some(30_600));
        assert_eq!(parse_departure_time("00:00:01"), Some(1));
        assert_eq!(parse_departure_time("25:15:00"), Some(90_900));
        assert_eq!(parse_departure_time(" 09:00:00 "), Some(32_400));
        assert_eq!(parse_departure_time("8:30"), None);
        assert_eq!(parse_departure_time("08:61:00"), None);
        assert_eq!(parse_departure_time("bogus"), None);
        assert_eq!(parse_departure_time(""), None);
    }

    #[test]
    fn test_query_sorted_and_capped_to_two() {
        let trips = vec![trip("T1", "1", "0"), trip("T2", "1", "0"), trip("T3", "1", "0")];
        let stop_times = vec![
            stop_time("T3", "4", "10:30:00"),
            stop_time("T1", "4", "10:04:30"),
            stop_time("T2", "4", "10:12:00"),
        ];
        let index = ScheduleIndex::build(&trips, &stop_times);

        let result = index.query(&StopId::new("4"), &monday_10am(), &WeekdayWeekendCalendar::default());

        assert_eq!(result.len(), SCHEDULED_PER_STOP);
        assert_eq!(result[0].trip_id, TripId::new("T1"));
        assert_eq!(result[0].minutes_to_departure, 5);
        assert_eq!(result[0].source, Source::Scheduled);
        assert_eq!(result[1].trip_id, TripId::new("T2"));
        assert_eq!(result[1].minutes_to_departure, 13);
    }

    #[test]
    fn test_query_ties_keep_row_order() {
        let trips = vec![trip("A", "1", "0"), trip("B", "1", "0")];
        // Both departures fall in the same reported minute.
        let stop_times = vec![
            stop_time("A", "4", "10:04:30"),
            stop_time("B", "4", "10:04:40"),
        ];
        let index = ScheduleIndex::build(&trips, &stop_times);

        let result = index.query(&StopId::new("4"), &monday_10am(), &WeekdayWeekendCalendar::default());

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].trip_id, TripId::new("A"));
        assert_eq!(result[1].trip_id, TripId::new("B"));
        assert_eq!(result[0].minutes_to_departure, result[1].minutes_to_departure);
    }

    #[test]
    fn test_query_excludes_wrong_service() {
        // Weekend-service trip must not appear on a Monday even though
        // direction and time match.
        let trips = vec![trip("WK", "2", "0"), trip("MF", "1", "0")];
        let stop_times = vec![
            stop_time("WK", "4", "10:05:00"),
            stop_time("MF", "4", "10:20:00"),
        ];
        let index = ScheduleIndex::build(&trips, &stop_times);

        let result = index.query(&StopId::new("4"), &monday_10am(), &WeekdayWeekendCalendar::default());

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].trip_id, TripId::new("MF"));
    }

    #[test]
    fn test_query_excludes_inbound_direction() {
        let trips = vec![trip("OUT", "1", "0"), trip("IN", "1", "1")];
        let stop_times = vec![
            stop_time("IN", "4", "10:05:00"),
            stop_time("OUT", "4", "10:20:00"),
        ];
        let index = ScheduleIndex::build(&trips, &stop_times);

        let result = index.query(&StopId::new("4"), &monday_10am(), &WeekdayWeekendCalendar::default());

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].trip_id, TripId::new("OUT"));
    }

    #[test]
    fn test_query_excludes_departure_at_exactly_now() {
        let trips = vec![trip("T1", "1", "0")];
        let stop_times = vec![stop_time("T1", "4", "10:00:00")];
        let index = ScheduleIndex::build(&trips, &stop_times);

        let result = index.query(&StopId::new("4"), &monday_10am(), &WeekdayWeekendCalendar::default());

        assert!(result.is_empty());
    }

    #[test]
    fn test_query_excludes_past_departures() {
        let trips = vec![trip("T1", "1", "0"), trip("T2", "1", "0")];
        let stop_times = vec![
            stop_time("T1", "4", "09:45:00"),
            stop_time("T2", "4", "10:01:00"),
        ];
        let index = ScheduleIndex::build(&trips, &stop_times);

        let result = index.query(&StopId::new("4"), &monday_10am(), &WeekdayWeekendCalendar::default());

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].trip_id, TripId::new("T2"));
        assert_eq!(result[0].minutes_to_departure, 2);
    }

    #[test]
    fn test_build_skips_rows_without_trip_mapping() {
        let trips = vec![trip("KNOWN", "1", "0")];
        let stop_times = vec![
            stop_time("GHOST", "4", "10:05:00"),
            stop_time("KNOWN", "4", "10:10:00"),
        ];
        let index = ScheduleIndex::build(&trips, &stop_times);

        let result = index.query(&StopId::new("4"), &monday_10am(), &WeekdayWeekendCalendar::default());

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].trip_id, TripId::new("KNOWN"));
    }

    #[test]
    fn test_build_skips_malformed_departure_times() {
        let trips = vec![trip("T1", "1", "0"), trip("T2", "1", "0")];
        let stop_times = vec![
            stop_time("T1", "4", "not-a-time"),
            stop_time("T2", "4", "10:10:00"),
        ];
        let index = ScheduleIndex::build(&trips, &stop_times);

        let result = index.query(&StopId::new("4"), &monday_10am(), &WeekdayWeekendCalendar::default());

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].trip_id, TripId::new("T2"));
    }

    #[test]
    fn test_departure_past_midnight_rolls_to_next_day() {
        let trips = vec![trip("LATE", "1", "0")];
        let stop_times = vec![stop_time("LATE", "4", "24:10:00")];
        let index = ScheduleIndex::build(&trips, &stop_times);

        let late_evening = DateTime::parse_from_rfc3339("2026-08-03T23:30:00-04:00").unwrap();
        let result = index.query(&StopId::new("4"), &late_evening, &WeekdayWeekendCalendar::default());

        assert_eq!(result.len(), 1);
        // 23:30 to next-day 00:10 is 2400 seconds, reported as 41.
        assert_eq!(result[0].minutes_to_departure, 41);
    }

    #[test]
    fn test_query_unknown_stop_is_empty() {
        let trips = vec![trip("T1", "1", "0")];
        let stop_times = vec![stop_time("T1", "4", "10:05:00")];
        let index = ScheduleIndex::build(&trips, &stop_times);

        let result = index.query(&StopId::new("404"), &monday_10am(), &WeekdayWeekendCalendar::default());

        assert!(result.is_empty());
        assert_eq!(index.stop_count(), 1);
    }
}
