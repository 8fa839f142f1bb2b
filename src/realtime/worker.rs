//! Periodic realtime aggregation task.
//!
//! One run: three parallel fetches sharing a single deadline, decode,
//! deterministic merge, one atomic TTL write. A failed run writes nothing;
//! the previous blob keeps serving until its TTL expires.

use std::time::Duration;

use log::{error, info};

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::fetch::{fetch_bytes, UrlParam};
use crate::parser::parse_feed;
use crate::redact::redact;
use crate::store::{KvStore, PutOptions, REALTIME_STATUS_KEY};

use super::merge::merge_feeds;

/// Shared deadline across the three parallel fetches.
pub const FETCH_DEADLINE: Duration = Duration::from_secs(10);

/// Published blob lifetime. One missed run is survivable at the design
/// cadence of 120 s; two consecutive misses let the value expire.
pub const STATUS_TTL: Duration = Duration::from_secs(180);

/// Runs one aggregation cycle, logging (with the API key scrubbed) instead
/// of propagating failures. A missing key skips the run without writing.
pub async fn run(config: &Config, store: &dyn KvStore) {
    let key = match config.require_api_key() {
        Ok(key) => key.to_string(),
        Err(err) => {
            error!("realtime run skipped: {err}");
            return;
        }
    };

    match run_once(config, store).await {
        Ok(status) => info!(
            "published realtime status: {} trips, {} alerts, feed t={}",
            status.0, status.1, status.2
        ),
        Err(err) => error!("realtime run failed: {}", redact(&err.to_string(), &key)),
    }
}

/// Fetch, decode, merge and publish. Returns (trips, alerts, feed t).
pub async fn run_once(config: &Config, store: &dyn KvStore) -> Result<(usize, usize, u64)> {
    let client = UrlParam::api_key(config.require_api_key()?);

    let fetches = async {
        tokio::try_join!(
            fetch_bytes(&client, &config.trip_updates_url),
            fetch_bytes(&client, &config.vehicle_positions_url),
            fetch_bytes(&client, &config.alerts_url),
        )
    };
    let (trip_bytes, vehicle_bytes, alert_bytes) = tokio::time::timeout(FETCH_DEADLINE, fetches)
        .await
        .map_err(|_| {
            PipelineError::Transport(format!(
                "realtime fetches exceeded the {}s deadline",
                FETCH_DEADLINE.as_secs()
            ))
        })??;

    let trip_updates = parse_feed(&trip_bytes)?;
    let vehicles = parse_feed(&vehicle_bytes)?;
    let alerts = parse_feed(&alert_bytes)?;

    let status = merge_feeds(&trip_updates, &vehicles, &alerts);
    let body =
        serde_json::to_vec(&status).map_err(|e| PipelineError::Store(e.to_string()))?;

    let mut opts = PutOptions {
        ttl: Some(STATUS_TTL),
        ..Default::default()
    };
    opts.metadata.insert("t".to_string(), status.t.to_string());
    store.put(REALTIME_STATUS_KEY, body, opts).await?;

    Ok((status.by_trip.len(), status.a.len(), status.t))
}
