use std::sync::Arc;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde::Serialize;
use tracing::info;

use super::PlatformError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KvItem {
    pub key: String,
    pub value: String,
}

/// String key-value store. Patterns use `*` as a wildcard.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, PlatformError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), PlatformError>;

    /// Writes only if the key is absent. Returns whether this call wrote it.
    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, PlatformError>;

    /// Returns whether the key existed.
    async fn delete(&self, key: &str) -> Result<bool, PlatformError>;

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, PlatformError>;

    /// Keys matching `pattern` with their values. Keys removed between the
    /// scan and the read are skipped.
    async fn list(&self, pattern: &str) -> Result<Vec<KvItem>, PlatformError> {
        let mut items = Vec::new();
        for key in self.keys(pattern).await? {
            if let Some(value) = self.get(&key).await? {
                items.push(KvItem { key, value });
            }
        }
        Ok(items)
    }
}

/// Redis backed store over a multiplexed connection.
#[derive(Clone)]
pub struct RedisKvStore {
    conn: MultiplexedConnection,
}

impl RedisKvStore {
    pub async fn connect(client: &redis::Client) -> Result<Self, PlatformError> {
        let conn = client.get_multiplexed_async_connection().await?;
        info!("Redis connection established");
        Ok(Self { conn })
    }
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, PlatformError> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PlatformError> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, PlatformError> {
        let mut conn = self.conn.clone();
        Ok(conn.set_nx(key, value).await?)
    }

    async fn delete(&self, key: &str) -> Result<bool, PlatformError> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, PlatformError> {
        let mut conn = self.conn.clone();
        let mut keys: Vec<String> = conn.keys(pattern).await?;
        keys.sort();
        Ok(keys)
    }
}

/// A view of another store with every key under a fixed prefix.
#[derive(Clone)]
pub struct ScopedKv {
    inner: Arc<dyn KvStore>,
    prefix: String,
}

impl ScopedKv {
    pub fn new(inner: Arc<dyn KvStore>, prefix: String) -> Self {
        Self { inner, prefix }
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

#[async_trait]
impl KvStore for ScopedKv {
    async fn get(&self, key: &str) -> Result<Option<String>, PlatformError> {
        self.inner.get(&self.scoped(key)).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PlatformError> {
        self.inner.set(&self.scoped(key), value).await
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, PlatformError> {
        self.inner.set_if_absent(&self.scoped(key), value).await
    }

    async fn delete(&self, key: &str) -> Result<bool, PlatformError> {
        self.inner.delete(&self.scoped(key)).await
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, PlatformError> {
        let keys = self.inner.keys(&self.scoped(pattern)).await?;
        Ok(keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(&self.prefix).map(str::to_string))
            .collect())
    }
}
