//! Minimal Postgres object-relational mapper, powered by facet reflection.
//!
//! A record type is a plain struct deriving `Facet`. Its table is derived
//! from its shape at runtime, and its rows are read and written through
//! reflection:
//!
//! ```ignore
//! use facet::Facet;
//! use liteorm::{Config, Database, Value};
//!
//! #[derive(Facet)]
//! struct TestItem {
//!     id: i64,
//!     #[facet(liteorm::len = "25")]
//!     string_column: String,
//!     int_column: i32,
//!     time_column: chrono::NaiveDateTime,
//!     blob_column: Vec<u8>,
//! }
//!
//! let db = Database::connect(&Config::from_env()?).await?;
//! db.create_table::<TestItem>(true).await?;
//!
//! let mut item = TestItem { id: 0, /* ... */ };
//! db.insert(&mut item).await?;
//!
//! let items: Vec<TestItem> = db.select("WHERE id = $1", &[Value::I64(item.id)]).await?;
//! ```
//!
//! # Naming Convention
//!
//! **Table names are plural**: the lower-cased type name with an `s`
//! appended (`TestItem` → `testitems`). Irregular plurals are not handled.
//!
//! The field named `id` is the identity column. It is always created as
//! `bigserial primary key`, comes first in every column list, and is set by
//! [`Database::insert`].
//!
//! # Tags
//!
//! - `#[facet(liteorm::len = "25")]`: length of the `varchar` backing a
//!   `String` field (required).
//! - `#[facet(liteorm::sql = "not null unique")]`: constraint text appended
//!   to the column definition.

mod config;
mod database;
mod driver;
mod error;
pub mod marshal;
mod value;

pub use config::{Config, ConfigError, DATABASE_URL_VAR, DEFAULT_SCHEMA, SCHEMA_VAR};
pub use database::Database;
pub use driver::{BoxFuture, Driver, RowStream, ScanRow};
pub use error::{BoxError, Error};
pub use value::{SqlParam, Value};

pub use liteorm_schema::{
    Column, FieldKind, IDENTITY_FIELD, SchemaError, SqlType, Table, table_name,
};

// Statement builders, for callers that run their own statements
pub use liteorm_sql as sql;

// Re-export attr grammar
pub use liteorm_schema::{__attr, __parse_attr, Attr};

pub type Result<T, E = Error> = std::result::Result<T, E>;
