//! Integration tests against real PostgreSQL.
//!
//! Uses `DATABASE_URL` when set, otherwise starts a throwaway container.
//!
//! Run with: cargo test -p liteorm --features test-postgres --test postgres
//!
//! Note: Requires Docker to be running when `DATABASE_URL` is unset.

#![cfg(feature = "test-postgres")]

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use facet::Facet;
use liteorm::{Config, Database, Error, Value};
use testcontainers_modules::postgres::Postgres;
use testcontainers_modules::testcontainers::ContainerAsync;
use testcontainers_modules::testcontainers::runners::AsyncRunner;

#[derive(Debug, Clone, PartialEq, Facet)]
struct TestItem {
    id: i64,
    #[facet(liteorm::len = "25")]
    string_column: String,
    int_column: i32,
    time_column: NaiveDateTime,
    blob_column: Vec<u8>,
}

#[derive(Debug, Facet)]
struct NeverCreated {
    id: i64,
    hits: i32,
}

/// Keeps the container alive for as long as the database is in use.
struct TestDb {
    db: Database,
    _container: Option<ContainerAsync<Postgres>>,
}

async fn setup() -> TestDb {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    if let Ok(config) = Config::from_env() {
        let db = Database::connect(&config).await.unwrap();
        return TestDb {
            db,
            _container: None,
        };
    }

    let container = Postgres::default().start().await.unwrap();
    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(5432).await.unwrap();
    let config = Config::new(format!(
        "postgres://postgres:postgres@{host}:{port}/postgres"
    ));

    // The server may still be starting up
    let mut attempts = 0;
    let db = loop {
        match Database::connect(&config).await {
            Ok(db) => break db,
            Err(e) if attempts < 30 => {
                attempts += 1;
                tracing::debug!(error = %e, attempts, "waiting for postgres");
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            }
            Err(e) => panic!("postgres never came up: {e}"),
        }
    };

    TestDb {
        db,
        _container: Some(container),
    }
}

fn fixture_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 9)
        .unwrap()
        .and_hms_micro_opt(12, 30, 5, 123_456)
        .unwrap()
}

fn item() -> TestItem {
    TestItem {
        id: 0,
        string_column: "test".to_string(),
        int_column: 1337,
        time_column: fixture_time(),
        blob_column: vec![0x13, 0x37],
    }
}

fn assert_same_time(a: NaiveDateTime, b: NaiveDateTime) {
    let delta = (a - b).abs();
    assert!(
        delta <= TimeDelta::microseconds(1),
        "{a} and {b} differ by {delta}"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_round_trip() {
    let TestDb { db, _container } = setup().await;

    db.create_table::<TestItem>(true).await.unwrap();
    assert!(db.table_exists::<TestItem>().await.unwrap());
    assert!(!db.table_exists::<NeverCreated>().await.unwrap());

    // Creating it again without dropping fails
    let err = db.create_table::<TestItem>(false).await.unwrap_err();
    assert!(matches!(err, Error::Driver { .. }), "got {err}");

    let mut first = item();
    db.insert(&mut first).await.unwrap();
    assert_ne!(first.id, 0);

    let mut second = item();
    second.string_column = "second".to_string();
    db.insert(&mut second).await.unwrap();
    assert_ne!(second.id, first.id);

    let mut loaded = item();
    loaded.string_column.clear();
    db.select_one(&mut loaded, "WHERE id = $1", &[Value::I64(first.id)])
        .await
        .unwrap();
    assert_eq!(loaded.id, first.id);
    assert_eq!(loaded.string_column, "test");
    assert_eq!(loaded.int_column, 1337);
    assert_eq!(loaded.blob_column, vec![0x13, 0x37]);
    assert_same_time(loaded.time_column, first.time_column);

    let all: Vec<TestItem> = db.select("ORDER BY id", &[]).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, first.id);
    assert_eq!(all[1].string_column, "second");

    loaded.string_column = "hello".to_string();
    loaded.int_column = 42;
    db.update_one(&loaded).await.unwrap();

    let found: Vec<TestItem> = db
        .select("WHERE string_column = $1", &[Value::from("hello")])
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, first.id);
    assert_eq!(found[0].int_column, 42);

    // Nothing has this id
    let mut missing = loaded.clone();
    missing.id = second.id + 1000;
    assert!(matches!(
        db.update_one(&missing).await,
        Err(Error::UnexpectedRowCount { affected: 0, .. })
    ));

    let removed = db
        .delete::<TestItem>("WHERE id = $1", &[Value::I64(first.id)])
        .await
        .unwrap();
    assert_eq!(removed, 1);

    let removed = db
        .delete::<TestItem>("WHERE id = $1", &[Value::I64(first.id)])
        .await
        .unwrap();
    assert_eq!(removed, 0);

    let remaining: Vec<TestItem> = db.select("", &[]).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, second.id);

    db.create_table::<TestItem>(true).await.unwrap();
    let after_recreate: Vec<TestItem> = db.select("", &[]).await.unwrap();
    assert!(after_recreate.is_empty());
}
