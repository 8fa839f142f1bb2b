//! Redis-backed store.
//!
//! Metadata rides in a sibling `<key>:meta` JSON string written in the
//! same MULTI/EXEC transaction as the value, so value and metadata always
//! replace together and share one TTL. Paired reads run in a transaction
//! too; a reader never sees a value from one write and metadata from
//! another.

use async_trait::async_trait;
use redis::AsyncCommands;

use crate::error::Result;

use super::{KvStore, Metadata, PutOptions};

pub struct RedisStore {
    client: redis::Client,
}

impl RedisStore {
    pub fn connect(url: &str) -> Result<Self> {
        Ok(RedisStore {
            client: redis::Client::open(url)?,
        })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }
}

fn meta_key(key: &str) -> String {
    format!("{key}:meta")
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;
        Ok(conn.get(key).await?)
    }

    async fn get_with_meta(&self, key: &str) -> Result<Option<(Vec<u8>, Metadata)>> {
        let mut conn = self.connection().await?;
        let (value, meta): (Option<Vec<u8>>, Option<String>) = redis::pipe()
            .atomic()
            .get(key)
            .get(meta_key(key))
            .query_async(&mut conn)
            .await?;
        Ok(value.map(|v| {
            let metadata = meta
                .and_then(|m| serde_json::from_str(&m).ok())
                .unwrap_or_default();
            (v, metadata)
        }))
    }

    async fn put(&self, key: &str, value: Vec<u8>, opts: PutOptions) -> Result<()> {
        let mut conn = self.connection().await?;
        let mut pipe = redis::pipe();
        pipe.atomic();

        match opts.ttl {
            Some(ttl) => {
                let secs = ttl.as_secs().max(1);
                pipe.set_ex(key, value, secs).ignore();
                if opts.metadata.is_empty() {
                    pipe.del(meta_key(key)).ignore();
                } else {
                    let meta = serde_json::to_string(&opts.metadata)
                        .map_err(|e| crate::error::PipelineError::Store(e.to_string()))?;
                    pipe.set_ex(meta_key(key), meta, secs).ignore();
                }
            }
            None => {
                pipe.set(key, value).ignore();
                if opts.metadata.is_empty() {
                    pipe.del(meta_key(key)).ignore();
                } else {
                    let meta = serde_json::to_string(&opts.metadata)
                        .map_err(|e| crate::error::PipelineError::Store(e.to_string()))?;
                    pipe.set(meta_key(key), meta).ignore();
                }
            }
        }

        pipe.query_async::<()>(&mut conn).await?;
        Ok(())
    }
}
