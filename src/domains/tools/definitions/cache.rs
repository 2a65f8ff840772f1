//! Cache capability group.
//!
//! `redis_cache_set` / `redis_cache_get` sit on top of a [`CacheStore`]. The
//! stub backend acknowledges writes and answers reads with a canned,
//! simulated response; the memory backend is a real key/value map with
//! per-entry expiry that lives for the process lifetime.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::core::config::BackendKind;
use crate::domains::tools::{
    CapabilityGroup, ParameterSchema, ParameterSpec, ToolDescriptor, ToolError, ToolOutput,
    ValidatedArgs,
};

/// Result of a cache read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Hit(String),
    Miss,
    /// The backend has no data to consult.
    Simulated,
}

/// Key/value store behind the cache tools.
#[async_trait]
pub trait CacheStore: Send + Sync {
    fn kind(&self) -> BackendKind;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), ToolError>;

    async fn get(&self, key: &str) -> Result<CacheLookup, ToolError>;

    /// Number of live entries, if the backend keeps any.
    async fn len(&self) -> usize {
        0
    }
}

/// Stateless backend that simulates a cache.
#[derive(Debug, Default)]
pub struct StubCache;

#[async_trait]
impl CacheStore for StubCache {
    fn kind(&self) -> BackendKind {
        BackendKind::Stub
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), ToolError> {
        Ok(())
    }

    async fn get(&self, _key: &str) -> Result<CacheLookup, ToolError> {
        Ok(CacheLookup::Simulated)
    }
}

struct CacheEntry {
    value: String,
    /// `None` when the TTL is too large to represent.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// In-process cache with per-entry expiry.
///
/// Expired entries read as misses. They are evicted when read, and every
/// write sweeps out whatever else has expired.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries held in the map, expired or not.
    #[cfg(test)]
    async fn stored(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), ToolError> {
        let now = Instant::now();
        let entry = CacheEntry {
            value: value.to_string(),
            expires_at: now.checked_add(ttl),
        };

        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| e.is_live(now));
        if entries.len() < before {
            debug!("Swept {} expired cache keys", before - entries.len());
        }
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<CacheLookup, ToolError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(CacheLookup::Miss),
                Some(entry) if entry.is_live(now) => {
                    return Ok(CacheLookup::Hit(entry.value.clone()));
                }
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| !e.is_live(now)) {
            entries.remove(key);
            debug!("Evicted expired cache key '{}'", key);
        }
        Ok(CacheLookup::Miss)
    }

    async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| e.is_live(now))
            .count()
    }
}

/// Handler for the cache tools.
pub struct CacheTools {
    store: Arc<dyn CacheStore>,
}

impl CacheTools {
    pub const SET: &'static str = "redis_cache_set";
    pub const GET: &'static str = "redis_cache_get";

    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub fn from_kind(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Stub => Self::new(Arc::new(StubCache)),
            BackendKind::Memory => Self::new(Arc::new(MemoryCache::new())),
        }
    }

    async fn set(&self, args: &ValidatedArgs) -> Result<ToolOutput, ToolError> {
        let key = args.require_str("key")?;
        let value = args.require_str("value")?;
        let ttl_secs = args.f64("ttl").unwrap_or(3600.0);
        let ttl = Duration::try_from_secs_f64(ttl_secs)
            .ok()
            .filter(|ttl| !ttl.is_zero())
            .ok_or_else(|| {
                ToolError::execution_failed(format!(
                    "ttl must be a positive, finite number of seconds, got {}",
                    ttl_secs
                ))
            })?;

        self.store.set(key, value, ttl).await?;

        let simulated = self.store.kind() == BackendKind::Stub;
        Ok(ToolOutput::from_json(json!({
            "key": key,
            "value": value,
            "ttl": ttl_secs,
            "stored": true,
            "simulated": simulated,
            "text": format!(
                "Cache set\n\nkey: {}\nvalue: {}\nttl: {}s\n\nStored{}",
                key,
                value,
                ttl_secs,
                if simulated { " (simulated)" } else { "" }
            ),
        })))
    }

    async fn get(&self, args: &ValidatedArgs) -> Result<ToolOutput, ToolError> {
        let key = args.require_str("key")?;

        let output = match self.store.get(key).await? {
            CacheLookup::Hit(value) => json!({
                "key": key,
                "found": true,
                "value": value,
                "simulated": false,
            }),
            CacheLookup::Miss => json!({
                "key": key,
                "found": false,
                "value": null,
                "simulated": false,
            }),
            CacheLookup::Simulated => json!({
                "key": key,
                "found": false,
                "value": null,
                "simulated": true,
                "text": format!(
                    "Cache lookup\n\nkey: {}\nresult: cached data (simulated)\n\n\
                     Configure MCP_CACHE_BACKEND=memory to store real values",
                    key
                ),
            }),
        };

        Ok(ToolOutput::from_json(output))
    }
}

#[async_trait]
impl CapabilityGroup for CacheTools {
    fn name(&self) -> &'static str {
        "cache"
    }

    fn tools(&self) -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor::new(
                Self::SET,
                "Store a value in the cache",
                ParameterSchema::new()
                    .param("key", ParameterSpec::string("Cache key").required())
                    .param("value", ParameterSpec::string("Value to store").required())
                    .param(
                        "ttl",
                        ParameterSpec::number("Expiry in seconds").with_default(3600),
                    ),
            ),
            ToolDescriptor::new(
                Self::GET,
                "Look up a value in the cache",
                ParameterSchema::new().param("key", ParameterSpec::string("Cache key").required()),
            ),
        ]
    }

    async fn handle(&self, tool: &str, args: ValidatedArgs) -> Result<ToolOutput, ToolError> {
        match tool {
            Self::SET => self.set(&args).await,
            Self::GET => self.get(&args).await,
            other => Err(ToolError::unknown_tool(other)),
        }
    }

    async fn shutdown(&self) {
        info!(
            "Cache backend '{}' shutting down with {} live entries",
            self.store.kind().as_str(),
            self.store.len().await
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::testing::validated;
    use serde_json::Value;

    async fn call(group: &CacheTools, tool: &str, args: Value) -> Result<ToolOutput, ToolError> {
        let descriptor = group.tools().into_iter().find(|d| d.name == tool).unwrap();
        group.handle(tool, validated(&descriptor, args)).await
    }

    #[tokio::test]
    async fn test_stub_is_simulated() {
        let group = CacheTools::from_kind(BackendKind::Stub);

        let set = call(&group, CacheTools::SET, json!({ "key": "k", "value": "v" }))
            .await
            .unwrap();
        assert_eq!(set.data["simulated"], true);
        assert_eq!(set.data["ttl"], 3600.0);

        let get = call(&group, CacheTools::GET, json!({ "key": "k" })).await.unwrap();
        assert_eq!(get.data["simulated"], true);
        assert!(get.data["text"].as_str().unwrap().contains("key: k"));
    }

    #[tokio::test]
    async fn test_memory_round_trip() {
        let group = CacheTools::from_kind(BackendKind::Memory);

        call(&group, CacheTools::SET, json!({ "key": "user:1", "value": "alice" }))
            .await
            .unwrap();
        let hit = call(&group, CacheTools::GET, json!({ "key": "user:1" })).await.unwrap();
        assert_eq!(hit.data["found"], true);
        assert_eq!(hit.data["value"], "alice");

        let miss = call(&group, CacheTools::GET, json!({ "key": "user:2" })).await.unwrap();
        assert_eq!(miss.data["found"], false);
    }

    #[tokio::test]
    async fn test_memory_entries_expire() {
        let cache = MemoryCache::new();
        cache.set("short", "lived", Duration::from_millis(20)).await.unwrap();
        cache.set("long", "lived", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.len().await, 2);

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(cache.get("short").await.unwrap(), CacheLookup::Miss);
        assert_eq!(cache.get("long").await.unwrap(), CacheLookup::Hit("lived".into()));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_writes_sweep_expired_keys() {
        let cache = MemoryCache::new();
        for i in 0..100 {
            cache
                .set(&format!("tmp:{}", i), "x", Duration::from_millis(1))
                .await
                .unwrap();
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
        cache.set("fresh", "y", Duration::from_secs(60)).await.unwrap();

        assert_eq!(cache.stored().await, 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_rejects_non_positive_ttl() {
        let group = CacheTools::from_kind(BackendKind::Memory);
        for ttl in [0.0, -5.0] {
            let result = call(
                &group,
                CacheTools::SET,
                json!({ "key": "k", "value": "v", "ttl": ttl }),
            )
            .await;
            assert!(matches!(result, Err(ToolError::ExecutionFailed(_))));
        }
    }
}
