//! Environment-backed configuration.
//!
//! The upstream API key and the KV binding are the only required inputs;
//! endpoint URLs default to the agency's hosted feeds and exist as
//! variables mainly so tests and staging can point elsewhere.

use crate::error::{PipelineError, Result};

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared upstream API key, passed as a query parameter on every fetch.
    /// `None` when unset; the workers skip their run in that case.
    pub api_key: Option<String>,
    pub trip_updates_url: String,
    pub vehicle_positions_url: String,
    pub alerts_url: String,
    pub schedule_archive_url: String,
    pub redis_url: String,
    pub bind_addr: String,
    /// Lower bound for the bundle's calendar end-date (`YYYYMMDD`). When
    /// unset the schedule worker validates against the current date.
    pub min_calendar_end: Option<u32>,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            api_key: std::env::var("PIPELINE_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            trip_updates_url: env_or(
                "REALTIME_TRIP_UPDATES_URL",
                "https://api.511.org/transit/tripupdates?agency=CT",
            ),
            vehicle_positions_url: env_or(
                "REALTIME_VEHICLE_POSITIONS_URL",
                "https://api.511.org/transit/vehiclepositions?agency=CT",
            ),
            alerts_url: env_or(
                "REALTIME_ALERTS_URL",
                "https://api.511.org/transit/servicealerts?agency=CT",
            ),
            schedule_archive_url: env_or(
                "SCHEDULE_ARCHIVE_URL",
                "https://api.511.org/transit/datafeeds?operator_id=CT",
            ),
            redis_url: env_or("REDIS_URL", "redis://127.0.0.1:6379/"),
            bind_addr: env_or("BIND_ADDR", "127.0.0.1:8080"),
            min_calendar_end: std::env::var("MIN_CALENDAR_END")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }

    /// The API key, or a `Config` error when the secret is absent.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| PipelineError::Config("PIPELINE_API_KEY is not set".to_string()))
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}
