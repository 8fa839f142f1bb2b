//! Wire types for the published realtime blob.
//!
//! Field names are single letters because clients deserialize the blob on
//! every cold start; the short names are part of the cross-tier contract.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One vehicle's reported position, quantized to five decimal places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehiclePos {
    pub la: f64,
    pub lo: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sp: Option<f64>,
}

pub const PROGRESS_INCOMING: u8 = 0;
pub const PROGRESS_STOPPED: u8 = 1;
pub const PROGRESS_IN_TRANSIT: u8 = 2;

/// Per-trip realtime record. Absent fields mean "no signal", never "zero".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripStatus {
    /// Delay in seconds; negative means running early.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<i32>,
    /// Predicted event time, epoch seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<i64>,
    /// Next or current stop id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<String>,
    /// Progress state: 0 incoming, 1 stopped, 2 in transit.
    #[serde(default = "default_progress")]
    pub st: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<VehiclePos>,
}

fn default_progress() -> u8 {
    PROGRESS_IN_TRANSIT
}

impl Default for TripStatus {
    fn default() -> Self {
        TripStatus {
            d: None,
            t: None,
            s: None,
            st: PROGRESS_IN_TRANSIT,
            p: None,
        }
    }
}

/// One service alert, reduced to the English translation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceAlert {
    pub h: String,
    pub d: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    /// Affected stop ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<Vec<String>>,
    /// Affected trip ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tr: Option<Vec<String>>,
    /// First active period start, epoch seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub st: Option<u64>,
    /// First active period end, epoch seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub en: Option<u64>,
}

/// The published realtime blob: feed timestamp, per-trip statuses, alerts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RealtimeStatus {
    /// Max of the three source feed header timestamps, epoch seconds.
    pub t: u64,
    #[serde(rename = "byTrip")]
    pub by_trip: BTreeMap<String, TripStatus>,
    pub a: Vec<ServiceAlert>,
}
