//! Realtime plane: merged per-trip view of the three GTFS-RT feeds.

pub mod merge;
pub mod status;
pub mod worker;
