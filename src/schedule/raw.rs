//! Row types for the GTFS CSV tables the builder consumes.
//!
//! Only the columns the bundle needs are declared; the csv reader ignores
//! the rest. Optional numeric columns use `Option` so blank cells
//! deserialize as `None`.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct StopRow {
    pub stop_id: String,
    #[serde(default)]
    pub stop_name: String,
    #[serde(default)]
    pub zone_id: String,
    #[serde(default)]
    pub stop_lat: Option<f64>,
    #[serde(default)]
    pub stop_lon: Option<f64>,
    /// 1 = parent station, 0 or blank = platform stop.
    #[serde(default)]
    pub location_type: Option<u8>,
    #[serde(default)]
    pub parent_station: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteRow {
    pub route_id: String,
    #[serde(default)]
    pub route_short_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TripRow {
    pub route_id: String,
    pub service_id: String,
    pub trip_id: String,
    #[serde(default)]
    pub trip_short_name: String,
    #[serde(default)]
    pub direction_id: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StopTimeRow {
    pub trip_id: String,
    #[serde(default)]
    pub arrival_time: String,
    #[serde(default)]
    pub departure_time: String,
    pub stop_id: String,
    pub stop_sequence: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarRow {
    pub service_id: String,
    pub monday: u8,
    pub tuesday: u8,
    pub wednesday: u8,
    pub thursday: u8,
    pub friday: u8,
    pub saturday: u8,
    pub sunday: u8,
    pub start_date: u32,
    pub end_date: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarDateRow {
    pub service_id: String,
    pub date: u32,
    pub exception_type: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FareAttributeRow {
    pub fare_id: String,
    pub price: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FareRuleRow {
    pub fare_id: String,
    #[serde(default)]
    pub origin_id: String,
    #[serde(default)]
    pub destination_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneAttributeRow {
    pub zone_id: String,
    #[serde(default)]
    pub zone_name: String,
}
