//! Static GTFS handling: archive download, zip extraction, and loading the
//! trip and stop-time tables the schedule index is built from.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::fetch::{HttpClient, fetch_bytes};
use crate::model::{ServiceId, StopId, TripId};

const ARCHIVE_NAME: &str = "gtfs.zip";
const TRIPS_TABLE: &str = "trips.txt";
const STOP_TIMES_TABLE: &str = "stop_times.txt";

/// One row of `trips.txt`. Columns this tool never reads (route, headsign,
/// block) are ignored by the reader.
#[derive(Debug, Clone, Deserialize)]
pub struct TripRow {
    pub trip_id: TripId,
    pub service_id: ServiceId,
    #[serde(default)]
    pub direction_id: String,
}

/// One row of `stop_times.txt`. The departure time stays a raw `HH:MM:SS`
/// string here; the schedule index owns its interpretation.
#[derive(Debug, Clone, Deserialize)]
pub struct StopTimeRow {
    pub trip_id: TripId,
    pub stop_id: StopId,
    pub departure_time: String,
}

/// The two static tables the departure board needs.
#[derive(Debug)]
pub struct ScheduleTables {
    pub trips: Vec<TripRow>,
    pub stop_times: Vec<StopTimeRow>,
}

/// Downloads the static GTFS zip from `url` and unpacks it into `dir`.
///
/// Returns the path of the saved archive; the extracted tables land next to
/// it, ready for [`load_tables`].
pub async fn download_archive<C: HttpClient>(client: &C, url: &str, dir: &Path) -> Result<PathBuf> {
    let bytes = fetch_bytes(client, url).await?;
    info!(bytes = bytes.len(), "Schedule archive downloaded");

    fs::create_dir_all(dir)
        .with_context(|| format!("creating schedule directory {}", dir.display()))?;
    let archive_path = dir.join(ARCHIVE_NAME);
    fs::write(&archive_path, &bytes)
        .with_context(|| format!("writing {}", archive_path.display()))?;

    extract_archive(&archive_path, dir)?;
    Ok(archive_path)
}

/// Unpacks every entry of the archive into `dir`.
///
/// Entries whose names escape the target directory are skipped rather than
/// written.
pub fn extract_archive(archive_path: &Path, dir: &Path) -> Result<()> {
    let file = File::open(archive_path)
        .with_context(|| format!("opening {}", archive_path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("{} is not a readable zip archive", archive_path.display()))?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let Some(relative) = entry.enclosed_name() else {
            warn!(name = entry.name(), "Skipping archive entry with unsafe path");
            continue;
        };
        let target = dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        debug!(name = %target.display(), "Extracted archive entry");
    }
    Ok(())
}

/// Loads the trip and stop-time tables from an extracted archive directory.
pub fn load_tables(dir: &Path) -> Result<ScheduleTables> {
    let trips = read_table(&dir.join(TRIPS_TABLE))?;
    let stop_times = read_table(&dir.join(STOP_TIMES_TABLE))?;
    info!(
        trips = trips.len(),
        stop_times = stop_times.len(),
        "Schedule tables loaded"
    );
    Ok(ScheduleTables { trips, stop_times })
}

/// Reads one CSV table, skipping rows that fail to deserialize.
///
/// The upstream export prefixes each table with a UTF-8 BOM, which would
/// otherwise glue itself onto the first header name.
fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let bytes = bytes.strip_prefix(b"\xef\xbb\xbf".as_slice()).unwrap_or(&bytes);

    let mut reader = csv::Reader::from_reader(bytes);
    let mut rows = Vec::new();
    let mut bad_rows = 0usize;
    for record in reader.deserialize() {
        match record {
            Ok(row) => rows.push(row),
            Err(err) => {
                bad_rows += 1;
                debug!(error = %err, "Skipping unreadable row");
            }
        }
    }
    if bad_rows > 0 {
        warn!(bad_rows, table = %path.display(), "Skipped unreadable rows");
    }
    Ok(rows)
}
