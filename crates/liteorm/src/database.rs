//! The session facade: one driver handle plus the schema it works in.

use crate::driver::{Driver, ScanRow};
use crate::{Config, Error, Result, Value, marshal};
use facet::Facet;
use futures::TryStreamExt;
use liteorm_schema::Table;
use liteorm_sql::{
    build_create, build_delete, build_drop, build_insert, build_select, build_table_exists,
    build_update,
};

/// Clause shared by every statement keyed on the identity column.
const BY_IDENTITY: &str = "WHERE id = $1";

/// A database session over a single driver handle.
///
/// Every operation derives the record type's table descriptor, builds the
/// statement text, marshals parameters and runs one round trip.
///
/// ```ignore
/// let db = Database::connect(&Config::from_env()?).await?;
/// db.create_table::<Article>(true).await?;
///
/// let mut article = Article { id: 0, title: "hello".into(), views: 0 };
/// db.insert(&mut article).await?;
/// assert_ne!(article.id, 0);
///
/// let popular: Vec<Article> = db
///     .select("WHERE views > $1 ORDER BY id", &[Value::I32(100)])
///     .await?;
/// ```
pub struct Database<D: Driver = tokio_postgres::Client> {
    driver: D,
    schema: String,
}

impl Database<tokio_postgres::Client> {
    /// Connect with `tokio_postgres`, spawning the connection task.
    pub async fn connect(config: &Config) -> Result<Self> {
        let (client, connection) =
            tokio_postgres::connect(&config.connection_string, tokio_postgres::NoTls)
                .await
                .map_err(Error::Connect)?;

        // Spawn connection handler
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "database connection error");
            }
        });

        Ok(Self::with_schema(client, config.schema.clone()))
    }
}

impl<D: Driver> Database<D> {
    /// Wrap a driver, checking table existence against the `public` schema.
    pub fn new(driver: D) -> Self {
        Self::with_schema(driver, crate::config::DEFAULT_SCHEMA)
    }

    pub fn with_schema(driver: D, schema: impl Into<String>) -> Self {
        Self {
            driver,
            schema: schema.into(),
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Create the table for `T`, dropping any existing one (and everything
    /// depending on it) first when `drop_existing` is set.
    pub async fn create_table<T: Facet<'static>>(&self, drop_existing: bool) -> Result<()> {
        let table = Table::of::<T>()?;

        if drop_existing {
            let sql = build_drop(&table);
            self.driver
                .execute(&sql, &[])
                .await
                .map_err(Error::driver("drop table for", table.type_name))?;
        }

        let sql = build_create(&table);
        self.driver
            .execute(&sql, &[])
            .await
            .map_err(Error::driver("create table for", table.type_name))?;

        tracing::debug!(table = %table.name, drop_existing, "created table");
        Ok(())
    }

    /// Whether the table for `T` exists in the configured schema.
    pub async fn table_exists<T: Facet<'static>>(&self) -> Result<bool> {
        let table = Table::of::<T>()?;
        let sql = build_table_exists(&table, &self.schema);

        let row = self
            .driver
            .query_one(&sql, &[])
            .await
            .map_err(Error::driver("check table for", table.type_name))?;

        let mut slots = [Value::Bool(false)];
        row.scan_into(&mut slots)
            .map_err(Error::driver("check table for", table.type_name))?;
        Ok(matches!(slots, [Value::Bool(true)]))
    }

    /// Insert `record` and set its identity to the generated id.
    ///
    /// Nothing is sent when the record type has no integer `id` field.
    pub async fn insert<T: Facet<'static>>(&self, record: &mut T) -> Result<()> {
        let table = Table::of::<T>()?;
        marshal::writable_identity(&table)?;
        let sql = build_insert(&table);
        let params = marshal::to_parameters(&table, &*record)?;

        let row = self
            .driver
            .query_one(&sql, &params)
            .await
            .map_err(Error::driver("insert", table.type_name))?;

        let mut slots = [Value::I64(0)];
        row.scan_into(&mut slots)
            .map_err(Error::driver("insert", table.type_name))?;
        let [Value::I64(id)] = slots else {
            return Err(Error::FieldAccess {
                field: liteorm_schema::IDENTITY_FIELD.to_string(),
                message: "generated id is not a bigint".to_string(),
            });
        };

        marshal::set_identity(&table, record, id)?;
        tracing::debug!(table = %table.name, id, "inserted row");
        Ok(())
    }

    /// Run a select and overwrite `record` with the single row it returns.
    ///
    /// Zero rows, or more than one, is a driver error.
    pub async fn select_one<T: Facet<'static>>(
        &self,
        record: &mut T,
        clauses: &str,
        args: &[Value],
    ) -> Result<()> {
        let table = Table::of::<T>()?;
        let sql = build_select(&table, clauses);

        let row = self
            .driver
            .query_one(&sql, args)
            .await
            .map_err(Error::driver("select", table.type_name))?;

        let values = scan_row(&table, &row)?;
        marshal::apply_scanned(&table, record, values)
    }

    /// Run a select and build one record per returned row, in order.
    pub async fn select<T: Facet<'static>>(&self, clauses: &str, args: &[Value]) -> Result<Vec<T>> {
        let table = Table::of::<T>()?;
        let sql = build_select(&table, clauses);

        let mut rows = self
            .driver
            .query_many(&sql, args)
            .await
            .map_err(Error::driver("select", table.type_name))?;

        let mut records = Vec::new();
        while let Some(row) = rows
            .try_next()
            .await
            .map_err(Error::driver("select", table.type_name))?
        {
            let values = scan_row(&table, &row)?;
            records.push(marshal::from_scanned(&table, values)?);
        }

        tracing::debug!(table = %table.name, rows = records.len(), "selected rows");
        Ok(records)
    }

    /// Write every non-identity field of `record` to the row with its id.
    ///
    /// Fails with [`Error::UnexpectedRowCount`] unless exactly one row was
    /// updated.
    pub async fn update_one<T: Facet<'static>>(&self, record: &T) -> Result<()> {
        let table = Table::of::<T>()?;
        let (sql, _) = build_update(&table, BY_IDENTITY, 2);

        let mut params = vec![Value::I64(marshal::get_identity(&table, record)?)];
        params.extend(marshal::to_parameters(&table, record)?);

        let affected = self
            .driver
            .execute(&sql, &params)
            .await
            .map_err(Error::driver("update", table.type_name))?;

        if affected != 1 {
            return Err(Error::UnexpectedRowCount {
                type_name: table.type_name.to_string(),
                affected,
            });
        }
        Ok(())
    }

    /// Delete the rows matched by `clauses`, returning how many were removed.
    pub async fn delete<T: Facet<'static>>(&self, clauses: &str, args: &[Value]) -> Result<u64> {
        let table = Table::of::<T>()?;
        let sql = build_delete(&table, clauses);

        let affected = self
            .driver
            .execute(&sql, args)
            .await
            .map_err(Error::driver("delete", table.type_name))?;

        tracing::debug!(table = %table.name, affected, "deleted rows");
        Ok(affected)
    }
}

/// Scan a full row into fresh slots for `table`.
fn scan_row<R: ScanRow>(table: &Table, row: &R) -> Result<Vec<Value>> {
    let mut slots = marshal::scan_targets(table);
    if row.column_count() != slots.len() {
        return Err(Error::FieldCountMismatch {
            type_name: table.type_name.to_string(),
            expected: slots.len(),
            actual: row.column_count(),
        });
    }
    row.scan_into(&mut slots)
        .map_err(Error::driver("scan", table.type_name))?;
    Ok(slots)
}
