// Cache store: one entry per configured key, single writer per key
use crate::domain::model::{ErrorCode, ResultEnvelope};
use crate::domain::traits::QueryOperation;
use crate::infrastructure::config::CacheSettings;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

#[derive(Default)]
struct EntryState {
    last_refreshed: Option<DateTime<Utc>>,
    payload: Option<Arc<ResultEnvelope>>,
    // Outcome of the most recent refresh, success or not, plus a counter
    // so gate waiters can tell a refresh completed while they queued.
    attempts: u64,
    last_result: Option<Arc<ResultEnvelope>>,
}

/// One cacheable query family.
///
/// The payload is replaced wholesale on every successful refresh, so
/// concurrent readers see either the previous complete payload or the
/// next one. The refresh gate serializes writers: at most one refresh
/// per key is in flight at any moment.
pub struct CacheEntry {
    key: String,
    ttl: Duration,
    state: RwLock<EntryState>,
    refresh_gate: Mutex<()>,
}

impl CacheEntry {
    fn new(key: String, interval_seconds: u32) -> Self {
        Self {
            key,
            ttl: Duration::seconds(i64::from(interval_seconds)),
            state: RwLock::new(EntryState::default()),
            refresh_gate: Mutex::new(()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// True iff a payload is present and `now <= last_refreshed + ttl`.
    pub async fn is_fresh(&self) -> bool {
        let state = self.state.read().await;
        match (&state.payload, state.last_refreshed) {
            (Some(_), Some(at)) => Utc::now() <= at + self.ttl,
            _ => false,
        }
    }

    /// Current payload regardless of freshness. Callers decide whether
    /// stale data is acceptable.
    pub async fn get(&self) -> Option<Arc<ResultEnvelope>> {
        self.state.read().await.payload.clone()
    }

    /// Store a refresh result.
    ///
    /// Only a `Success` envelope replaces the payload and advances the
    /// freshness clock. Anything else is discarded: the last good payload
    /// stays available for stale reads and the entry keeps reporting
    /// stale, so the next caller retries instead of waiting out a TTL on
    /// bad data.
    pub async fn store(&self, envelope: ResultEnvelope) -> Arc<ResultEnvelope> {
        let envelope = Arc::new(envelope);
        let mut state = self.state.write().await;
        state.attempts += 1;
        state.last_result = Some(envelope.clone());
        if envelope.error_code == ErrorCode::Success {
            state.payload = Some(envelope.clone());
            state.last_refreshed = Some(Utc::now());
            debug!("{} - cache updated", self.key);
        } else {
            debug!("{} - cache dropped", self.key);
        }
        envelope
    }

    /// Run `op` and store its result, with per-key mutual exclusion.
    ///
    /// A caller that loses the race waits on the gate and takes the
    /// winner's outcome without touching the backend, whether the winner
    /// succeeded or failed. Only callers arriving after a failed refresh
    /// completed retry. Returns the refresh outcome; on failure that is
    /// the failure envelope, while [`CacheEntry::get`] keeps serving the
    /// last good payload.
    pub async fn refresh(&self, op: &dyn QueryOperation) -> Arc<ResultEnvelope> {
        let attempts_before = self.state.read().await.attempts;
        let _gate = self.refresh_gate.lock().await;
        if self.is_fresh().await {
            if let Some(payload) = self.get().await {
                debug!("{} - Return cached data", self.key);
                return payload;
            }
        }
        {
            let state = self.state.read().await;
            if state.attempts != attempts_before {
                if let Some(result) = &state.last_result {
                    debug!("{} - Return in-flight refresh result", self.key);
                    return result.clone();
                }
            }
        }
        let result = op.run().await;
        self.store(result).await
    }

    #[cfg(test)]
    pub(crate) async fn set_last_refreshed(&self, at: DateTime<Utc>) {
        self.state.write().await.last_refreshed = Some(at);
    }
}

/// Key -> entry map, constructed once at startup from configuration.
///
/// The key set is immutable afterwards; only entry payloads change, via
/// the refresh path.
pub struct CacheRegistry {
    entries: DashMap<String, Arc<CacheEntry>>,
}

impl CacheRegistry {
    pub fn from_settings(settings: &CacheSettings) -> Self {
        let entries = DashMap::new();
        for (key, item) in &settings.data {
            entries.insert(
                key.clone(),
                Arc::new(CacheEntry::new(key.clone(), item.interval_seconds)),
            );
        }
        debug!("Init cached data: complete");
        Self { entries }
    }

    pub fn entry(&self, key: &str) -> Option<Arc<CacheEntry>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freshness check by key; unknown keys are never fresh.
    pub async fn is_fresh(&self, key: &str) -> bool {
        match self.entry(key) {
            Some(entry) => entry.is_fresh().await,
            None => false,
        }
    }

    /// Payload by key regardless of freshness.
    pub async fn get(&self, key: &str) -> Option<Arc<ResultEnvelope>> {
        match self.entry(key) {
            Some(entry) => entry.get().await,
            None => None,
        }
    }
}
