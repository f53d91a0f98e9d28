use crate::domain::error::QwarmError;
use crate::domain::model::{DriverId, DriverResponse, ResultEnvelope};
use async_trait::async_trait;

/// Trait for backend drivers
///
/// One implementation per driver family. A driver runs a fully-rendered
/// query string and reports its native result shape; converting that
/// shape (or a failure) into a [`ResultEnvelope`] is the adapter's job,
/// so drivers stay free of envelope semantics.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Which pool this driver serves.
    fn id(&self) -> DriverId;

    /// Whether the underlying pool is ready to take queries.
    fn connected(&self) -> bool;

    /// Execute one query and return the driver-native result shape.
    async fn run_query(&self, query: &str) -> Result<DriverResponse, QwarmError>;
}

/// Trait for named query operations
///
/// The unit the cache layer works with: a zero-argument async operation
/// with a stable name. Operations never fail with an `Err` — every
/// outcome, including driver faults, is expressed in the envelope.
#[async_trait]
pub trait QueryOperation: Send + Sync {
    /// Stable operation name, used for cache apply-map lookups.
    fn name(&self) -> &str;

    /// Run the underlying query.
    async fn run(&self) -> ResultEnvelope;
}
