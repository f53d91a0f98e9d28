//! End-to-end flow: config -> pools -> cached operations

use qwarm::infrastructure::config::{
    CacheItem, CacheSettings, Config, DriverSettings, SchedulerSettings, SqliteSettings,
};
use qwarm::infrastructure::queries::{v0, QueryFilters};
use qwarm::{DriverId, DriverQuery, ErrorCode, ServiceState};
use std::collections::HashMap;
use std::sync::Arc;

fn service_config() -> Config {
    let mut data = HashMap::new();
    data.insert(
        "dict_sample".to_string(),
        CacheItem {
            interval_seconds: 3600,
        },
    );
    let mut apply_map = HashMap::new();
    apply_map.insert("dict_sample_v0".to_string(), "dict_sample".to_string());

    Config {
        cache: CacheSettings { data, apply_map },
        scheduler: SchedulerSettings {
            enable: false,
            ..SchedulerSettings::default()
        },
        drivers: DriverSettings {
            enabled: vec![DriverId::Sqlite],
            sqlite: Some(SqliteSettings {
                path: ":memory:".to_string(),
            }),
            http: None,
        },
        ..Config::default()
    }
}

async fn seed(state: &ServiceState, rows: usize) {
    state
        .pools
        .execute(
            "CREATE TABLE IF NOT EXISTS dict_sample (id INTEGER PRIMARY KEY, word TEXT)",
            DriverId::Sqlite,
        )
        .await;
    for i in 0..rows {
        state
            .pools
            .execute(
                &format!(
                    "INSERT OR IGNORE INTO dict_sample (id, word) VALUES ({}, 'word_{}')",
                    i + 1,
                    i + 1
                ),
                DriverId::Sqlite,
            )
            .await;
    }
}

#[tokio::test]
async fn cached_operation_serves_warm_data_until_ttl() {
    let state = ServiceState::new(service_config()).await.unwrap();
    seed(&state, 2).await;

    let wrapped = state.wrap(Arc::new(DriverQuery::new(
        "dict_sample_v0",
        v0::dict_sample(&QueryFilters::default()),
        DriverId::Sqlite,
        state.pools.clone(),
    )));

    let first = wrapped.call().await;
    assert_eq!(first.error_code, ErrorCode::Success);
    assert_eq!(first.data.as_ref().unwrap()[0].rows_total, 2);

    // New rows land in the table, but the fresh cache keeps serving the
    // snapshot taken at refresh time.
    seed(&state, 3).await;
    let second = wrapped.call().await;
    assert_eq!(second.data.as_ref().unwrap()[0].rows_total, 2);
    assert!(state.cache.registry().is_fresh("dict_sample").await);
}

#[tokio::test]
async fn unmapped_operation_always_hits_the_backend() {
    let state = ServiceState::new(service_config()).await.unwrap();
    seed(&state, 1).await;

    let wrapped = state.wrap(Arc::new(DriverQuery::new(
        "dict_sample_recordset_v0",
        v0::dict_sample_recordset(&QueryFilters::default()),
        DriverId::Sqlite,
        state.pools.clone(),
    )));
    assert!(wrapped.cache_key().is_none());

    let first = wrapped.call().await;
    assert_eq!(first.data.as_ref().unwrap().len(), 2);
    assert_eq!(first.data.as_ref().unwrap()[0].rows_total, 1);

    seed(&state, 2).await;
    let second = wrapped.call().await;
    assert_eq!(second.data.as_ref().unwrap()[0].rows_total, 2);
}
