//! Query-result caching and normalization core.
//!
//! Executes rendered query strings against heterogeneous backend drivers,
//! normalizes their result shapes into one envelope, caches selected
//! results with a TTL, and keeps a background scheduler refreshing stale
//! entries ahead of foreground callers.
//!
//! The HTTP layer, authentication, and the user/role store are external
//! collaborators; this crate is consumed in-process by the request layer.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod state;

// Re-export for convenience
pub use application::cache::{CacheEntry, CacheRegistry};
pub use application::query::{CacheLayer, CachedQuery, DriverQuery};
pub use application::scheduler::SchedulerHandle;
pub use domain::error::QwarmError;
pub use domain::model::{DriverId, DriverResponse, ErrorCode, RecordSet, ResultEnvelope, Row};
pub use domain::traits::{Driver, QueryOperation};
pub use infrastructure::config::{load_config, Config};
pub use infrastructure::drivers::DriverPools;
pub use state::ServiceState;
