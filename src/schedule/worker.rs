//! Daily schedule bundling task.
//!
//! Fetch, build, validate, publish-if-changed. Validation failures abort
//! the run so yesterday's bundle keeps serving.

use chrono::Datelike;
use log::{error, info};

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::fetch::{fetch_bytes, UrlParam};
use crate::redact::redact;
use crate::store::{KvStore, PutOptions, SCHEDULE_DATA_KEY, SCHEDULE_META_KEY};

use super::builder::build_schedule;
use super::model::ScheduleMeta;
use super::validate::validate_schedule;

/// Runs one bundling cycle, logging (with the API key scrubbed) instead of
/// propagating failures. A missing key skips the run without writing.
pub async fn run(config: &Config, store: &dyn KvStore) {
    let key = match config.require_api_key() {
        Ok(key) => key.to_string(),
        Err(err) => {
            error!("schedule run skipped: {err}");
            return;
        }
    };

    match run_once(config, store).await {
        Ok(Outcome::Published(version)) => info!("published schedule version {version}"),
        Ok(Outcome::Unchanged(version)) => info!("schedule unchanged at version {version}"),
        Err(PipelineError::Validation(violations)) => {
            error!("schedule rejected, {} violation(s):", violations.len());
            for violation in &violations {
                error!("  {violation}");
            }
        }
        Err(err) => error!("schedule run failed: {}", redact(&err.to_string(), &key)),
    }
}

pub enum Outcome {
    Published(String),
    Unchanged(String),
}

/// Fetch, build, validate and publish. Both schedule keys are written
/// without TTL; they persist until the next successful run replaces them.
pub async fn run_once(config: &Config, store: &dyn KvStore) -> Result<Outcome> {
    let client = UrlParam::api_key(config.require_api_key()?);
    let bytes = fetch_bytes(&client, &config.schedule_archive_url).await?;

    let schedule = build_schedule(&bytes)?;

    let min_end = config.min_calendar_end.unwrap_or_else(today);
    let violations = validate_schedule(&schedule, min_end);
    if !violations.is_empty() {
        return Err(PipelineError::Validation(violations));
    }

    if let Some(current) = store.get(SCHEDULE_META_KEY).await? {
        if let Ok(meta) = serde_json::from_slice::<ScheduleMeta>(&current) {
            if meta.v == schedule.m.v {
                return Ok(Outcome::Unchanged(meta.v));
            }
        }
    }

    let data = serde_json::to_vec(&schedule).map_err(|e| PipelineError::Store(e.to_string()))?;
    let meta = serde_json::to_vec(&schedule.m).map_err(|e| PipelineError::Store(e.to_string()))?;
    store
        .put(SCHEDULE_DATA_KEY, data, PutOptions::default())
        .await?;
    store
        .put(SCHEDULE_META_KEY, meta, PutOptions::default())
        .await?;

    Ok(Outcome::Published(schedule.m.v))
}

/// Today as a `YYYYMMDD` integer.
fn today() -> u32 {
    let now = chrono::Utc::now();
    now.year() as u32 * 10_000 + now.month() * 100 + now.day()
}
