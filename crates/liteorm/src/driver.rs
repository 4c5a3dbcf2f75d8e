//! The query-execution seam between the facade and a Postgres client.
//!
//! [`Driver`] is implemented for `tokio_postgres::Client` and
//! `deadpool_postgres::Object`. Every call is wrapped in a
//! `tracing::debug_span!` so statements show up in logs:
//!
//! ```text
//! db.execute{sql=INSERT INTO ... params=4 affected=1}
//! db.query{sql=SELECT ... params=1 rows=3}
//! ```

use crate::{BoxError, SqlParam, Value};
use futures::{Stream, TryStreamExt};
use std::future::Future;
use std::pin::Pin;
use tokio_postgres::types::ToSql;
use tracing::Instrument;

/// A boxed future resolving to a driver result.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BoxError>> + Send + 'a>>;

/// A lazy, forward-only stream of result rows.
///
/// Dropping the stream releases it, whether or not it was read to the end.
pub type RowStream<'a, R> = Pin<Box<dyn Stream<Item = Result<R, BoxError>> + Send + 'a>>;

/// Trait for database handles that can execute statements.
pub trait Driver: Send + Sync {
    /// Row type returned by queries.
    type Row: ScanRow + Send;

    /// Execute a statement, returning the number of rows affected.
    fn execute<'a>(&'a self, sql: &'a str, params: &'a [Value]) -> BoxFuture<'a, u64>;

    /// Execute a query, returning exactly one row.
    fn query_one<'a>(&'a self, sql: &'a str, params: &'a [Value]) -> BoxFuture<'a, Self::Row>;

    /// Execute a query, returning its rows as a stream.
    fn query_many<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [Value],
    ) -> BoxFuture<'a, RowStream<'a, Self::Row>>;
}

/// A result row that can be scanned into typed slots.
pub trait ScanRow {
    /// Number of columns in the row.
    fn column_count(&self) -> usize;

    /// Overwrite each slot with the column at the same position.
    ///
    /// The variant already held by a slot selects the type the column is
    /// decoded as.
    fn scan_into(&self, slots: &mut [Value]) -> Result<(), BoxError>;
}

impl ScanRow for tokio_postgres::Row {
    fn column_count(&self) -> usize {
        self.len()
    }

    fn scan_into(&self, slots: &mut [Value]) -> Result<(), BoxError> {
        for (idx, slot) in slots.iter_mut().enumerate() {
            match slot {
                Value::Bool(v) => *v = self.try_get(idx)?,
                Value::I32(v) => *v = self.try_get(idx)?,
                Value::I64(v) => *v = self.try_get(idx)?,
                Value::Text(v) => *v = self.try_get(idx)?,
                Value::Bytes(v) => *v = self.try_get(idx)?,
                Value::Timestamp(v) => *v = self.try_get(idx)?,
            }
        }
        Ok(())
    }
}

impl Driver for tokio_postgres::Client {
    type Row = tokio_postgres::Row;

    fn execute<'a>(&'a self, sql: &'a str, params: &'a [Value]) -> BoxFuture<'a, u64> {
        Box::pin(traced_execute(self, sql, params))
    }

    fn query_one<'a>(&'a self, sql: &'a str, params: &'a [Value]) -> BoxFuture<'a, Self::Row> {
        Box::pin(traced_query_one(self, sql, params))
    }

    fn query_many<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [Value],
    ) -> BoxFuture<'a, RowStream<'a, Self::Row>> {
        Box::pin(traced_query_many(self, sql, params))
    }
}

impl Driver for deadpool_postgres::Object {
    type Row = tokio_postgres::Row;

    fn execute<'a>(&'a self, sql: &'a str, params: &'a [Value]) -> BoxFuture<'a, u64> {
        // Deref to the underlying Client to avoid recursion
        use std::ops::Deref;
        let client: &tokio_postgres::Client = self.deref();
        Box::pin(traced_execute(client, sql, params))
    }

    fn query_one<'a>(&'a self, sql: &'a str, params: &'a [Value]) -> BoxFuture<'a, Self::Row> {
        use std::ops::Deref;
        let client: &tokio_postgres::Client = self.deref();
        Box::pin(traced_query_one(client, sql, params))
    }

    fn query_many<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [Value],
    ) -> BoxFuture<'a, RowStream<'a, Self::Row>> {
        use std::ops::Deref;
        let client: &tokio_postgres::Client = self.deref();
        Box::pin(traced_query_many(client, sql, params))
    }
}

async fn traced_execute(
    client: &tokio_postgres::Client,
    sql: &str,
    params: &[Value],
) -> Result<u64, BoxError> {
    let span = tracing::debug_span!(
        "db.execute",
        sql = %sql,
        params = params.len(),
        affected = tracing::field::Empty,
    );
    let owned: Vec<SqlParam<'_>> = params.iter().map(SqlParam).collect();
    let refs: Vec<&(dyn ToSql + Sync)> = owned.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

    let affected = client.execute(sql, &refs).instrument(span.clone()).await?;
    span.record("affected", affected);
    Ok(affected)
}

async fn traced_query_one(
    client: &tokio_postgres::Client,
    sql: &str,
    params: &[Value],
) -> Result<tokio_postgres::Row, BoxError> {
    let span = tracing::debug_span!(
        "db.query",
        sql = %sql,
        params = params.len(),
        rows = 1u64,
    );
    let owned: Vec<SqlParam<'_>> = params.iter().map(SqlParam).collect();
    let refs: Vec<&(dyn ToSql + Sync)> = owned.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

    Ok(client.query_one(sql, &refs).instrument(span).await?)
}

async fn traced_query_many<'a>(
    client: &'a tokio_postgres::Client,
    sql: &'a str,
    params: &'a [Value],
) -> Result<RowStream<'a, tokio_postgres::Row>, BoxError> {
    let span = tracing::debug_span!(
        "db.query",
        sql = %sql,
        params = params.len(),
        streamed = true,
    );
    let rows = client
        .query_raw(sql, params.iter().map(SqlParam))
        .instrument(span)
        .await?;
    Ok(Box::pin(rows.map_err(|e| Box::new(e) as BoxError)))
}
