//! Driver adapter tests against a real embedded SQLite pool

use qwarm::infrastructure::config::{DriverSettings, SqliteSettings};
use qwarm::infrastructure::queries::{v0, QueryFilters};
use qwarm::{DriverId, DriverPools, ErrorCode};

async fn sqlite_pools() -> DriverPools {
    let settings = DriverSettings {
        enabled: vec![DriverId::Sqlite],
        sqlite: Some(SqliteSettings {
            path: ":memory:".to_string(),
        }),
        http: None,
    };
    DriverPools::init(&settings).await.unwrap()
}

async fn seed_dict_sample(pools: &DriverPools, rows: usize) {
    let ddl = "CREATE TABLE IF NOT EXISTS dict_sample (id INTEGER PRIMARY KEY, word TEXT)";
    let created = pools.execute(ddl, DriverId::Sqlite).await;
    assert_ne!(created.error_code, ErrorCode::Failure);

    for i in 0..rows {
        let insert = format!(
            "INSERT INTO dict_sample (id, word) VALUES ({}, 'word_{}')",
            i + 1,
            i + 1
        );
        let inserted = pools.execute(&insert, DriverId::Sqlite).await;
        assert_ne!(inserted.error_code, ErrorCode::Failure);
    }
}

#[tokio::test]
async fn select_returns_normalized_rows() {
    let pools = sqlite_pools().await;
    seed_dict_sample(&pools, 3).await;

    let envelope = pools
        .execute(&v0::dict_sample(&QueryFilters::default()), DriverId::Sqlite)
        .await;

    assert_eq!(envelope.error_code, ErrorCode::Success);
    let data = envelope.data.unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0].rows_total, 3);
    assert_eq!(data[0].rows[0]["id"], serde_json::json!(1));
    assert_eq!(data[0].rows[0]["word"], serde_json::json!("word_1"));
}

#[tokio::test]
async fn compound_statement_yields_two_recordsets() {
    let pools = sqlite_pools().await;
    seed_dict_sample(&pools, 2).await;

    let envelope = pools
        .execute(
            &v0::dict_sample_recordset(&QueryFilters::default()),
            DriverId::Sqlite,
        )
        .await;

    assert_eq!(envelope.error_code, ErrorCode::Success);
    let data = envelope.data.unwrap();
    assert_eq!(data.len(), 2);
    // First set ascending, second descending.
    assert_eq!(data[0].rows[0]["id"], serde_json::json!(1));
    assert_eq!(data[1].rows[0]["id"], serde_json::json!(2));
}

#[tokio::test]
async fn empty_result_is_no_data() {
    let pools = sqlite_pools().await;
    seed_dict_sample(&pools, 0).await;

    let envelope = pools
        .execute(&v0::dict_sample(&QueryFilters::default()), DriverId::Sqlite)
        .await;

    assert_eq!(envelope.error_code, ErrorCode::NoData);
    assert_eq!(envelope.error_desc.as_deref(), Some("No records found"));
    assert!(envelope.data.is_none());
}

#[tokio::test]
async fn sql_error_becomes_failure_envelope() {
    let pools = sqlite_pools().await;

    let envelope = pools
        .execute("SELECT * FROM table_that_is_not_there", DriverId::Sqlite)
        .await;

    assert_eq!(envelope.error_code, ErrorCode::Failure);
    assert!(envelope.error_desc.is_some());
    assert!(envelope.data.is_none());
}

#[tokio::test]
async fn quoted_semicolon_stays_one_statement() {
    let pools = sqlite_pools().await;

    let envelope = pools.execute("SELECT 'a;b' AS w", DriverId::Sqlite).await;

    assert_eq!(envelope.error_code, ErrorCode::Success);
    let data = envelope.data.unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0].rows_total, 1);
    assert_eq!(data[0].rows[0]["w"], serde_json::json!("a;b"));
}

#[tokio::test]
async fn unconfigured_driver_reports_no_connection() {
    let pools = sqlite_pools().await;

    let envelope = pools.execute("SELECT 1", DriverId::Http).await;

    assert_eq!(envelope.error_code, ErrorCode::Failure);
    assert_eq!(envelope.error_desc.as_deref(), Some("No connection"));
}

#[tokio::test]
async fn filter_fragment_applies() {
    let pools = sqlite_pools().await;
    seed_dict_sample(&pools, 5).await;

    let filters = QueryFilters {
        finally: "WHERE dict_sample.id > 3".to_string(),
    };
    let envelope = pools
        .execute(&v0::dict_sample(&filters), DriverId::Sqlite)
        .await;

    assert_eq!(envelope.error_code, ErrorCode::Success);
    assert_eq!(envelope.data.unwrap()[0].rows_total, 2);
}
