/// Revocation store: the server-side half of refresh-token state.
///
/// Each live refresh token has exactly one entry keyed by its `jti`, with a
/// TTL equal to the token's remaining validity. Absence of the entry is
/// what "revoked" means; expiry is passive and store-native. Access tokens
/// never appear here.
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;

const KEY_PREFIX: &str = "refresh_token:";

#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Records a live refresh token under its id for `ttl_seconds`.
    /// A non-positive TTL is a no-op: an already-expired token needs no entry.
    async fn put(&self, jti: &str, user_id: Uuid, ttl_seconds: i64) -> Result<(), StoreError>;

    /// True when the token id is still live (present and unexpired).
    async fn exists(&self, jti: &str) -> Result<bool, StoreError>;

    /// Removes the entry, reporting whether it was present. The returned
    /// flag is the single-use gate for rotation: of several concurrent
    /// refreshes with the same token, only one sees `true`.
    async fn delete(&self, jti: &str) -> Result<bool, StoreError>;
}

fn key_for(jti: &str) -> String {
    format!("{}{}", KEY_PREFIX, jti)
}

/// Redis-backed store. SETEX/EXISTS/DEL are each atomic on a single key,
/// which is all the rotation protocol needs.
#[derive(Clone)]
pub struct RedisRevocationStore {
    conn: ConnectionManager,
}

impl RedisRevocationStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn put(&self, jti: &str, user_id: Uuid, ttl_seconds: i64) -> Result<(), StoreError> {
        if ttl_seconds <= 0 {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(key_for(jti), user_id.to_string(), ttl_seconds as u64)
            .await?;
        Ok(())
    }

    async fn exists(&self, jti: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let present: bool = conn.exists(key_for(jti)).await?;
        Ok(present)
    }

    async fn delete(&self, jti: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(key_for(jti)).await?;
        Ok(removed > 0)
    }
}

/// Map-backed store for tests and local development. Expiry is checked on
/// read, mimicking Redis's behavior of a key that simply stops existing.
#[derive(Default)]
pub struct InMemoryRevocationStore {
    inner: RwLock<HashMap<String, Entry>>,
}

struct Entry {
    #[allow(dead_code)]
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn put(&self, jti: &str, user_id: Uuid, ttl_seconds: i64) -> Result<(), StoreError> {
        if ttl_seconds <= 0 {
            return Ok(());
        }
        let mut entries = self.inner.write().await;
        entries.insert(
            jti.to_string(),
            Entry {
                user_id,
                expires_at: Utc::now() + Duration::seconds(ttl_seconds),
            },
        );
        Ok(())
    }

    async fn exists(&self, jti: &str) -> Result<bool, StoreError> {
        let entries = self.inner.read().await;
        Ok(entries
            .get(jti)
            .map(|e| e.expires_at > Utc::now())
            .unwrap_or(false))
    }

    async fn delete(&self, jti: &str) -> Result<bool, StoreError> {
        let mut entries = self.inner.write().await;
        Ok(entries
            .remove(jti)
            .map(|e| e.expires_at > Utc::now())
            .unwrap_or(false))
    }
}
