pub mod http;
pub mod sqlite;

use crate::domain::error::QwarmError;
use crate::domain::model::{DriverId, ResultEnvelope};
use crate::domain::traits::Driver;
use crate::infrastructure::config::DriverSettings;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

pub use http::HttpDriver;
pub use sqlite::SqliteDriver;

/// One pool per configured driver family.
///
/// This is the single point where heterogeneous driver failure modes
/// become one vocabulary: [`DriverPools::execute`] always resolves to a
/// [`ResultEnvelope`], never an `Err` and never a panic.
pub struct DriverPools {
    pools: HashMap<DriverId, Box<dyn Driver>>,
}

impl DriverPools {
    /// Build pools for the driver families named in the `use` list.
    ///
    /// Enabling a family without its credentials section is a fatal
    /// configuration error.
    pub async fn init(settings: &DriverSettings) -> Result<Self, QwarmError> {
        let mut pools = Self::empty();

        if settings.enabled.contains(&DriverId::Sqlite) {
            let sqlite = settings.sqlite.as_ref().ok_or_else(|| {
                QwarmError::Config("sqlite driver enabled but [drivers.sqlite] is missing".into())
            })?;
            let driver = if sqlite.path == ":memory:" {
                SqliteDriver::open_in_memory().await?
            } else {
                SqliteDriver::open(Path::new(&sqlite.path)).await?
            };
            pools.register(Box::new(driver));
        }

        if settings.enabled.contains(&DriverId::Http) {
            let http = settings.http.as_ref().ok_or_else(|| {
                QwarmError::Config("http driver enabled but [drivers.http] is missing".into())
            })?;
            pools.register(Box::new(HttpDriver::new(http)?));
        }

        debug!("Init connection-pools: complete");
        Ok(pools)
    }

    pub fn empty() -> Self {
        Self {
            pools: HashMap::new(),
        }
    }

    /// Add a driver; tests use this to plug in doubles.
    pub fn register(&mut self, driver: Box<dyn Driver>) {
        self.pools.insert(driver.id(), driver);
    }

    pub fn has(&self, driver: DriverId) -> bool {
        self.pools.contains_key(&driver)
    }

    /// Execute a rendered query against one pool.
    ///
    /// Every terminal branch is mutually exclusive and returns exactly
    /// one envelope: not-configured and not-connected short-circuit
    /// before dispatch, driver faults become `Failure`, zero rows become
    /// `NoData`.
    pub async fn execute(&self, query_text: &str, driver: DriverId) -> ResultEnvelope {
        debug!(
            target: "queries",
            "\n--------------------------------------------------------------\n{}\n--------------------------------------------------------------",
            query_text
        );

        let Some(pool) = self.pools.get(&driver) else {
            warn!("Driver: {} has no query operator", driver);
            return ResultEnvelope::failure("No connection");
        };
        if !pool.connected() {
            return ResultEnvelope::failure("No connection");
        }

        match pool.run_query(query_text).await {
            Ok(response) => response.into_envelope(),
            Err(e) => {
                warn!("{} - query failed: {}", driver, e);
                ResultEnvelope::failure(e.to_string())
            }
        }
    }
}
