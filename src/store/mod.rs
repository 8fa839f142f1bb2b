//! Key-value store behind the pipeline.
//!
//! Exactly three keys are ever written. Writes are atomic whole-value
//! replacements: a reader sees the last complete value or nothing, never a
//! partial one.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

mod memory;
mod redis;

pub use self::redis::RedisStore;
pub use memory::MemoryStore;

/// The daily schedule bundle (no TTL).
pub const SCHEDULE_DATA_KEY: &str = "schedule:data";
/// The bundle metadata blob (no TTL).
pub const SCHEDULE_META_KEY: &str = "schedule:meta";
/// The merged realtime view (TTL-bound, metadata carries the feed
/// timestamp under `"t"`).
pub const REALTIME_STATUS_KEY: &str = "realtime:status";

/// Write options: an optional expiry and a small string-to-string metadata
/// blob stored alongside the value.
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    pub ttl: Option<Duration>,
    pub metadata: HashMap<String, String>,
}

pub type Metadata = HashMap<String, String>;

/// Capability surface the workers and the read API share.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Like [`get`](KvStore::get) but also returns the metadata written
    /// with the value.
    async fn get_with_meta(&self, key: &str) -> Result<Option<(Vec<u8>, Metadata)>>;

    /// Atomically replaces the value (and metadata) under `key`.
    async fn put(&self, key: &str, value: Vec<u8>, opts: PutOptions) -> Result<()>;
}
