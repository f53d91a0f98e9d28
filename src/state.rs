use crate::application::query::{CacheLayer, CachedQuery};
use crate::application::scheduler::{self, SchedulerHandle};
use crate::domain::error::QwarmError;
use crate::domain::traits::QueryOperation;
use crate::infrastructure::config::Config;
use crate::infrastructure::drivers::DriverPools;
use std::sync::Arc;

/// Everything the query layer needs, bundled in one explicit handle.
///
/// Constructed once at startup and cloned into each caller; there is no
/// process-wide singleton. Configuration is read-only after construction.
#[derive(Clone)]
pub struct ServiceState {
    pub pools: Arc<DriverPools>,
    pub cache: Arc<CacheLayer>,
    pub config: Arc<Config>,
}

impl ServiceState {
    pub async fn new(config: Config) -> Result<Self, QwarmError> {
        let pools = Arc::new(DriverPools::init(&config.drivers).await?);
        let cache = Arc::new(CacheLayer::from_settings(&config.cache)?);

        Ok(Self {
            pools,
            cache,
            config: Arc::new(config),
        })
    }

    /// Build a state around pre-constructed pools (tests plug driver
    /// doubles in this way).
    pub fn with_pools(config: Config, pools: DriverPools) -> Result<Self, QwarmError> {
        let cache = Arc::new(CacheLayer::from_settings(&config.cache)?);
        Ok(Self {
            pools: Arc::new(pools),
            cache,
            config: Arc::new(config),
        })
    }

    /// Register an operation with the cache layer.
    pub fn wrap(&self, op: Arc<dyn QueryOperation>) -> CachedQuery {
        self.cache.wrap(op)
    }

    /// Start the background refresh scheduler, if configuration enables
    /// it. Call after all cacheable operations are registered so every
    /// key has its backing operation.
    pub fn start_scheduler(&self) -> Option<SchedulerHandle> {
        if !self.config.scheduler.enable {
            return None;
        }
        Some(scheduler::spawn(
            self.cache.registry(),
            self.cache.backing_operations(),
            &self.config.scheduler,
        ))
    }
}
