//! Data pipeline for a single commuter rail agency.
//!
//! Two scheduled workers publish JSON blobs to a shared key-value store: a
//! daily [`schedule`] bundle built from the agency's static GTFS archive,
//! and a continuously refreshed [`realtime`] status merged from three
//! GTFS-RT feeds. A small read [`api`] serves the blobs to offline-capable
//! clients with caching and ETag semantics.

pub mod api;
pub mod config;
pub mod error;
pub mod fetch;
pub mod parser;
pub mod realtime;
pub mod redact;
pub mod schedule;
pub mod store;

pub mod gtfs_rt {
    include!(concat!(env!("OUT_DIR"), "/transit_realtime.rs"));
}
