//! Output formatting and persistence for departure boards.
//!
//! Supports plain-text rendering, JSON serialization, and CSV history append.

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use csv::WriterBuilder;
use serde::Serialize;
use tracing::debug;

use crate::board::Board;
use crate::model::Source;

/// Renders a board as plain text, one block per requested stop.
pub fn render_text(board: &Board) -> String {
    let mut out = String::new();
    for (stop_id, departures) in board {
        let _ = writeln!(out, "stop {stop_id}:");
        if departures.is_empty() {
            let _ = writeln!(out, "  no upcoming departures");
            continue;
        }
        for departure in departures {
            let _ = writeln!(
                out,
                "  {:<12} {:>3} min  ({})",
                departure.trip_id, departure.minutes_to_departure, departure.source
            );
        }
    }
    out
}

/// Serializes a board as pretty-printed JSON, stops in id order.
pub fn to_json(board: &Board) -> Result<String> {
    Ok(serde_json::to_string_pretty(board)?)
}

/// One flattened board entry as persisted to the history CSV.
#[derive(Debug, Serialize)]
struct HistoryRecord<'a> {
    observed_at: String,
    stop_id: &'a str,
    trip_id: &'a str,
    minutes_to_departure: u32,
    source: Source,
}

/// Appends every departure on the board as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_history(path: &str, observed_at: &DateTime<FixedOffset>, board: &Board) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending board to history CSV");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    let observed_at = observed_at.to_rfc3339_opts(SecondsFormat::Secs, true);
    for (stop_id, departures) in board {
        for departure in departures {
            writer.serialize(HistoryRecord {
                observed_at: observed_at.clone(),
                stop_id: stop_id.as_str(),
                trip_id: departure.trip_id.as_str(),
                minutes_to_departure: departure.minutes_to_departure,
                source: departure.source,
            })?;
        }
    }
    writer.flush()?;

    Ok(())
}
