use crate::application::cache::{CacheEntry, CacheRegistry};
use crate::domain::error::QwarmError;
use crate::domain::model::{DriverId, ResultEnvelope};
use crate::domain::traits::QueryOperation;
use crate::infrastructure::config::CacheSettings;
use crate::infrastructure::drivers::DriverPools;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A rendered query text bound to a driver pool, as a named operation.
///
/// The templating that produces the text happens upstream; this type only
/// carries the finished string to the adapter.
pub struct DriverQuery {
    name: String,
    text: String,
    driver: DriverId,
    pools: Arc<DriverPools>,
}

impl DriverQuery {
    pub fn new(
        name: impl Into<String>,
        text: impl Into<String>,
        driver: DriverId,
        pools: Arc<DriverPools>,
    ) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            driver,
            pools,
        }
    }
}

#[async_trait]
impl QueryOperation for DriverQuery {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> ResultEnvelope {
        self.pools.execute(&self.text, self.driver).await
    }
}

struct CacheBinding {
    entry: Arc<CacheEntry>,
}

/// An operation wrapped by the cache layer.
///
/// Unmapped operations pass every call through untouched. Mapped ones are
/// served from cache while fresh and lazily refreshed (exactly once per
/// key at a time) when stale.
pub struct CachedQuery {
    inner: Arc<dyn QueryOperation>,
    cache: Option<CacheBinding>,
}

impl CachedQuery {
    /// Cache key this operation is bound to, if any.
    pub fn cache_key(&self) -> Option<&str> {
        self.cache.as_ref().map(|binding| binding.entry.key())
    }

    pub async fn call(&self) -> Arc<ResultEnvelope> {
        let Some(binding) = &self.cache else {
            // not caching this
            return Arc::new(self.inner.run().await);
        };

        if binding.entry.is_fresh().await {
            if let Some(payload) = binding.entry.get().await {
                debug!("{} - Return cached data", binding.entry.key());
                return payload;
            }
        }
        binding.entry.refresh(self.inner.as_ref()).await
    }
}

// A wrapped operation keeps the signature of the one it wraps.
#[async_trait]
impl QueryOperation for CachedQuery {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn run(&self) -> ResultEnvelope {
        (*self.call().await).clone()
    }
}

/// The cache layer: registry, apply map, and backing operations.
///
/// The apply map (operation name -> cache key) comes from configuration
/// and is validated at construction: a mapping that targets an
/// unregistered key is a fatal startup error. Operations opt in through
/// explicit [`CacheLayer::wrap`] registration.
pub struct CacheLayer {
    registry: Arc<CacheRegistry>,
    apply_map: HashMap<String, String>,
    backing: DashMap<String, Arc<dyn QueryOperation>>,
}

impl CacheLayer {
    pub fn from_settings(settings: &CacheSettings) -> Result<Self, QwarmError> {
        let registry = Arc::new(CacheRegistry::from_settings(settings));
        for (operation, key) in &settings.apply_map {
            if !registry.contains(key) {
                return Err(QwarmError::UnknownCacheKey {
                    operation: operation.clone(),
                    key: key.clone(),
                });
            }
        }
        Ok(Self {
            registry,
            apply_map: settings.apply_map.clone(),
            backing: DashMap::new(),
        })
    }

    pub fn registry(&self) -> Arc<CacheRegistry> {
        self.registry.clone()
    }

    /// Wrap an operation, registering it with its cache key when the
    /// apply map names one.
    ///
    /// The wrapped operation also becomes the backing operation for its
    /// key, which is what the background scheduler runs on a sweep.
    pub fn wrap(&self, op: Arc<dyn QueryOperation>) -> CachedQuery {
        let Some(key) = self.apply_map.get(op.name()) else {
            return CachedQuery {
                inner: op,
                cache: None,
            };
        };

        // Apply map is validated against the registry at construction.
        let Some(entry) = self.registry.entry(key) else {
            tracing::error!("{} - apply map target missing from registry", key);
            return CachedQuery {
                inner: op,
                cache: None,
            };
        };

        self.backing.insert(key.clone(), op.clone());
        CachedQuery {
            inner: op,
            cache: Some(CacheBinding { entry }),
        }
    }

    /// Snapshot of key -> backing operation pairs for the scheduler.
    pub fn backing_operations(&self) -> Vec<(String, Arc<dyn QueryOperation>)> {
        self.backing
            .iter()
            .map(|item| (item.key().clone(), item.value().clone()))
            .collect()
    }
}
