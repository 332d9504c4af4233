/// Redis caching layer for catalog reads.
///
/// All operations return `Option<T>` for graceful degradation.
///
/// Key schema:
/// - `tmi:v1:tool:{lowercase name}`: JSON ToolRecord (TTL 600s)
/// - `tmi:v1:pool:{sha256(exclude_id|limit)}`: JSON Vec<ToolRecord> (TTL 600s)
///
/// Tool records expire on the same schedule as pools so a reference tool is
/// never scored with fresher or staler data than its candidates.
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::model::ToolRecord;
use mcp_common::redis::RedisCache;

const KEY_PREFIX: &str = "tmi:v1:";
const POOL_TTL_SECS: u64 = 600;
const TOOL_TTL_SECS: u64 = POOL_TTL_SECS;

pub struct InsightsCache {
    redis: RedisCache,
}

/// A serialized value ready to be written with `SETEX`.
#[derive(Debug, PartialEq)]
struct CacheEntry {
    key: String,
    json: String,
    ttl_secs: u64,
}

impl CacheEntry {
    fn new<T: Serialize + ?Sized>(key: String, value: &T, ttl_secs: u64) -> Option<Self> {
        let json = serde_json::to_string(value)
            .inspect_err(|e| warn!(error = %e, key, "cache serialization failed"))
            .ok()?;
        Some(Self { key, json, ttl_secs })
    }
}

impl InsightsCache {
    pub fn new(redis: RedisCache) -> Self {
        Self { redis }
    }

    pub async fn get_tool(&self, name: &str) -> Option<ToolRecord> {
        self.get_json(&tool_key(name)).await
    }

    pub async fn set_tool(&self, name: &str, tool: &ToolRecord) {
        if let Some(entry) = tool_entry(name, tool) {
            self.write(entry).await;
        }
    }

    pub async fn get_candidate_pool(
        &self,
        exclude_id: &str,
        limit: usize,
    ) -> Option<Vec<ToolRecord>> {
        self.get_json(&pool_key(exclude_id, limit)).await
    }

    pub async fn set_candidate_pool(&self, exclude_id: &str, limit: usize, pool: &[ToolRecord]) {
        if let Some(entry) = pool_entry(exclude_id, limit, pool) {
            self.write(entry).await;
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let json = self.redis.get(key).await?;
        serde_json::from_str(&json)
            .inspect_err(|e| warn!(error = %e, key, "cache deserialization failed"))
            .ok()
    }

    async fn write(&self, entry: CacheEntry) {
        self.redis
            .set_with_ttl(&entry.key, &entry.json, entry.ttl_secs)
            .await;
    }
}

fn tool_entry(name: &str, tool: &ToolRecord) -> Option<CacheEntry> {
    CacheEntry::new(tool_key(name), tool, TOOL_TTL_SECS)
}

fn pool_entry(exclude_id: &str, limit: usize, pool: &[ToolRecord]) -> Option<CacheEntry> {
    CacheEntry::new(pool_key(exclude_id, limit), pool, POOL_TTL_SECS)
}

fn tool_key(name: &str) -> String {
    format!("{KEY_PREFIX}tool:{}", name.trim().to_lowercase())
}

fn pool_key(exclude_id: &str, limit: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(exclude_id.as_bytes());
    hasher.update(b"|");
    hasher.update(limit.to_string().as_bytes());
    let hash = hasher.finalize();
    format!("{KEY_PREFIX}pool:{:x}", hash)
}
