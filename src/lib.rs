pub mod board;
pub mod calendar;
pub mod fetch;
pub mod gtfs_static;
pub mod model;
pub mod output;
pub mod parser;
pub mod realtime;
pub mod schedule;

pub mod gtfs_rt {
    include!(concat!(env!("OUT_DIR"), "/transit_realtime.rs"));
}
