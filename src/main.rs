//! CLI entry point for the ferry departure board.
//!
//! Provides subcommands for downloading the static schedule, rendering a
//! one-shot board, and watching stops on an interval.

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use ferry_board::{
    board::next_departures,
    calendar::WeekdayWeekendCalendar,
    fetch::{BasicClient, fetch_bytes},
    gtfs_static::{download_archive, load_tables},
    model::StopId,
    output::{append_history, render_text, to_json},
    parser::{parse_feed, trip_update_records},
    realtime::RealtimeIndex,
    schedule::ScheduleIndex,
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// NYC Ferry static schedule archive.
const DEFAULT_SCHEDULE_URL: &str = "http://nycferry.connexionz.net/rtt/public/utility/gtfs.aspx";
/// NYC Ferry trip-update feed.
const DEFAULT_FEED_URL: &str =
    "http://nycferry.connexionz.net/rtt/public/utility/gtfsrealtime.aspx/tripupdate";

#[derive(Parser)]
#[command(name = "ferry_board")]
#[command(about = "Next-departure board combining a realtime feed with the static schedule", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download and unpack the static GTFS schedule archive
    FetchSchedule {
        /// URL of the schedule zip archive
        #[arg(long, default_value = DEFAULT_SCHEDULE_URL)]
        url: String,

        /// Directory to unpack the schedule into
        #[arg(short, long, default_value = "schedule")]
        dir: String,
    },
    /// Render the departure board once
    Board {
        /// Stop ids to show, comma separated
        #[arg(short, long, value_delimiter = ',', default_value = "4,90")]
        stops: Vec<String>,

        /// Realtime feed: path to a file or URL to fetch
        #[arg(long, default_value = DEFAULT_FEED_URL)]
        feed: String,

        /// Directory holding the unpacked schedule
        #[arg(short = 'd', long, default_value = "schedule")]
        schedule_dir: String,

        /// Emit JSON instead of plain text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Re-render the board on an interval
    Watch {
        /// Stop ids to show, comma separated
        #[arg(short, long, value_delimiter = ',', default_value = "4,90")]
        stops: Vec<String>,

        /// Realtime feed: path to a file or URL to fetch
        #[arg(long, default_value = DEFAULT_FEED_URL)]
        feed: String,

        /// Directory holding the unpacked schedule
        #[arg(short = 'd', long, default_value = "schedule")]
        schedule_dir: String,

        /// Seconds between refreshes
        #[arg(short = 'r', long, default_value_t = 60)]
        interval: u64,

        /// Number of refreshes (0 = infinite)
        #[arg(short = 'n', long, default_value_t = 0)]
        rounds: usize,

        /// Optional: CSV file to append each rendered board to
        #[arg(long)]
        history: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/ferry_board.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("ferry_board.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::FetchSchedule { url, dir } => {
            let client = BasicClient::new();
            let dir = Path::new(&dir);
            let archive = download_archive(&client, &url, dir).await?;
            let tables = load_tables(dir)?;
            info!(
                archive = %archive.display(),
                trips = tables.trips.len(),
                stop_times = tables.stop_times.len(),
                "Schedule ready"
            );
        }
        Commands::Board {
            stops,
            feed,
            schedule_dir,
            json,
        } => {
            let schedule = load_schedule(&schedule_dir)?;
            let realtime = realtime_or_empty(&feed).await;
            let now = Local::now().fixed_offset();

            let board = next_departures(
                &stop_ids(&stops),
                &realtime,
                &schedule,
                &WeekdayWeekendCalendar::default(),
                &now,
            )?;

            if json {
                println!("{}", to_json(&board)?);
            } else {
                print!("{}", render_text(&board));
            }
        }
        Commands::Watch {
            stops,
            feed,
            schedule_dir,
            interval,
            rounds,
            history,
        } => {
            watch(&stops, &feed, &schedule_dir, interval, rounds, history).await?;
        }
    }

    Ok(())
}

/// Re-renders the board every `interval` seconds, `rounds` times (0 = run
/// until interrupted), appending to the history CSV when one is configured.
#[tracing::instrument(skip(stops, history), fields(feed, schedule_dir, interval, rounds))]
async fn watch(
    stops: &[String],
    feed: &str,
    schedule_dir: &str,
    interval: u64,
    rounds: usize,
    history: Option<String>,
) -> Result<()> {
    let schedule = load_schedule(schedule_dir)?;
    let calendar = WeekdayWeekendCalendar::default();
    let stop_ids = stop_ids(stops);

    if rounds == 0 {
        info!(interval, "Watching indefinitely. Press Ctrl+C to stop.");
    } else {
        info!(rounds, interval, "Starting watch");
    }

    let mut round = 0usize;
    loop {
        if rounds > 0 && round >= rounds {
            break;
        }
        round += 1;

        let now = Local::now().fixed_offset();
        let realtime = realtime_or_empty(feed).await;
        let board = next_departures(&stop_ids, &realtime, &schedule, &calendar, &now)?;

        print!("{}", render_text(&board));

        if let Some(path) = &history {
            if let Err(e) = append_history(path, &now, &board) {
                error!(error = %e, "Failed to append board to history");
            }
        }

        if rounds == 0 || round < rounds {
            debug!(interval, "Waiting before next refresh");
            tokio::time::sleep(tokio::time::Duration::from_secs(interval)).await;
        }
    }

    Ok(())
}

/// Loads the static tables and builds the schedule index.
fn load_schedule(dir: &str) -> Result<ScheduleIndex> {
    let tables = load_tables(Path::new(dir))
        .with_context(|| format!("no usable schedule in {dir}; run fetch-schedule first"))?;
    let index = ScheduleIndex::build(&tables.trips, &tables.stop_times);
    debug!(stops = index.stop_count(), "Schedule index built");
    Ok(index)
}

/// Fetches and decodes the realtime feed, degrading to an empty index when
/// the feed is unreachable or unreadable. The board still renders from the
/// schedule alone.
async fn realtime_or_empty(feed: &str) -> RealtimeIndex {
    match fetch_realtime(feed).await {
        Ok(index) => index,
        Err(e) => {
            warn!(error = %e, "Realtime feed unavailable, using schedule only");
            RealtimeIndex::build(&[])
        }
    }
}

async fn fetch_realtime(feed: &str) -> Result<RealtimeIndex> {
    let bytes = fetcher(feed).await?;
    let parsed = parse_feed(&bytes)?;
    let records = trip_update_records(&parsed);
    debug!(
        entity_count = parsed.entity.len(),
        record_count = records.len(),
        "Realtime feed decoded"
    );
    Ok(RealtimeIndex::build(&records))
}

/// Loads feed data from a local file path or fetches it over HTTP.
#[tracing::instrument(fields(source = %url))]
async fn fetcher(url: &str) -> Result<Vec<u8>> {
    let bytes = if url.starts_with("http") {
        let client = BasicClient::new();
        fetch_bytes(&client, url).await?
    } else {
        std::fs::read(url)?
    };
    Ok(bytes)
}

fn stop_ids(stops: &[String]) -> Vec<StopId> {
    stops.iter().map(|s| StopId::new(s.as_str())).collect()
}
