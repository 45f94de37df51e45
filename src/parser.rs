//! Protobuf decoding for the realtime feed, plus the lowering from wire
//! types into the records the realtime index is built from.

use anyhow::Result;
use prost::Message;
use tracing::debug;

use crate::gtfs_rt::FeedMessage;
use crate::model::{StopId, TripId};
use crate::realtime::{StopTimeUpdateRecord, TripUpdateRecord};

/// Decodes a protobuf-encoded GTFS-RT [`FeedMessage`] from raw bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not valid protobuf for a `FeedMessage`.
pub fn parse_feed(bytes: &[u8]) -> Result<FeedMessage> {
    Ok(FeedMessage::decode(bytes)?)
}

/// Lowers a decoded feed into trip-update records.
///
/// Entities that carry no trip update (vehicle positions, alerts) are
/// skipped, as are deleted entities and trips the feed does not name. A
/// stop-time update survives only when it has both a stop id and a predicted
/// departure instant.
pub fn trip_update_records(feed: &FeedMessage) -> Vec<TripUpdateRecord> {
    let mut records = Vec::new();
    let mut unnamed_trips = 0usize;

    for entity in &feed.entity {
        if entity.is_deleted() {
            continue;
        }
        let Some(update) = &entity.trip_update else {
            continue;
        };
        let Some(trip_id) = &update.trip.trip_id else {
            unnamed_trips += 1;
            continue;
        };

        let stop_time_updates = update
            .stop_time_update
            .iter()
            .filter_map(|stu| {
                let stop_id = stu.stop_id.as_deref()?;
                let departure_epoch = stu.departure.as_ref()?.time?;
                Some(StopTimeUpdateRecord {
                    stop_id: StopId::new(stop_id),
                    departure_epoch,
                })
            })
            .collect();

        records.push(TripUpdateRecord {
            trip_id: TripId::new(trip_id),
            direction_id: update.trip.direction_id.unwrap_or(0),
            stop_time_updates,
        });
    }

    if unnamed_trips > 0 {
        debug!(unnamed_trips, "skipped trip updates without a trip id");
    }
    records
}
