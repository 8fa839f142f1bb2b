//! In-process store used by tests and local development.
//!
//! Expiry is checked on read against the tokio clock, so paused-time tests
//! can advance past a TTL deterministically.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::error::Result;

use super::{KvStore, Metadata, PutOptions};

struct Entry {
    value: Vec<u8>,
    metadata: Metadata,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|e| !e.is_expired())
            .map(|e| e.value.clone()))
    }

    async fn get_with_meta(&self, key: &str) -> Result<Option<(Vec<u8>, Metadata)>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|e| !e.is_expired())
            .map(|e| (e.value.clone(), e.metadata.clone())))
    }

    async fn put(&self, key: &str, value: Vec<u8>, opts: PutOptions) -> Result<()> {
        let entry = Entry {
            value,
            metadata: opts.metadata,
            expires_at: opts.ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn round_trips_value_and_metadata() {
        let store = MemoryStore::new();
        let mut opts = PutOptions::default();
        opts.metadata.insert("t".to_string(), "1735689600".to_string());
        store.put("realtime:status", b"{}".to_vec(), opts).await.unwrap();

        let (value, metadata) = store.get_with_meta("realtime:status").await.unwrap().unwrap();
        assert_eq!(value, b"{}");
        assert_eq!(metadata.get("t").map(String::as_str), Some("1735689600"));
    }

    #[tokio::test]
    async fn missing_key_reads_none() {
        let store = MemoryStore::new();
        assert!(store.get("schedule:data").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn value_expires_after_its_ttl() {
        let store = MemoryStore::new();
        let opts = PutOptions {
            ttl: Some(Duration::from_secs(180)),
            ..Default::default()
        };
        store.put("realtime:status", b"{}".to_vec(), opts).await.unwrap();

        tokio::time::advance(Duration::from_secs(179)).await;
        assert!(store.get("realtime:status").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(store.get("realtime:status").await.unwrap().is_none());
        assert!(store.get_with_meta("realtime:status").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_replaces_the_whole_value() {
        let store = MemoryStore::new();
        let mut opts = PutOptions::default();
        opts.metadata.insert("t".to_string(), "1".to_string());
        store.put("k", b"old".to_vec(), opts).await.unwrap();
        store.put("k", b"new".to_vec(), PutOptions::default()).await.unwrap();

        let (value, metadata) = store.get_with_meta("k").await.unwrap().unwrap();
        assert_eq!(value, b"new");
        assert!(metadata.is_empty());
    }
}
