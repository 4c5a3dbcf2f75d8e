//! Runtime values for query parameters and scan slots.

use chrono::NaiveDateTime;
use liteorm_schema::SqlType;
use tokio_postgres::types::{IsNull, ToSql, Type as PgTypeInfo};

/// A runtime SQL value.
///
/// Used for query parameters and row data. Maps to Postgres types.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean (BOOLEAN)
    Bool(bool),

    /// 32-bit signed integer (INT)
    I32(i32),

    /// 64-bit signed integer (BIGINT, BIGSERIAL)
    I64(i64),

    /// Text (VARCHAR)
    Text(String),

    /// Binary data (BYTEA)
    Bytes(Vec<u8>),

    /// Timestamp without time zone (TIMESTAMP)
    Timestamp(NaiveDateTime),
}

impl Value {
    /// The zero value read back from a column of the given type, used to
    /// allocate scan slots.
    pub fn zero(sql_type: SqlType) -> Self {
        match sql_type {
            SqlType::Int => Value::I32(0),
            SqlType::BigInt | SqlType::BigSerial => Value::I64(0),
            SqlType::Varchar(_) => Value::Text(String::new()),
            SqlType::Bytea => Value::Bytes(Vec::new()),
            SqlType::Timestamp => Value::Timestamp(NaiveDateTime::default()),
        }
    }

    /// Short name of the variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::I32(_) => "int",
            Value::I64(_) => "bigint",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytea",
            Value::Timestamp(_) => "timestamp",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

/// Wrapper to make our Value usable as a ToSql parameter.
#[derive(Debug)]
pub struct SqlParam<'a>(pub &'a Value);

impl ToSql for SqlParam<'_> {
    fn to_sql(
        &self,
        ty: &PgTypeInfo,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self.0 {
            Value::Bool(v) => v.to_sql(ty, out),
            Value::I32(v) => v.to_sql(ty, out),
            Value::I64(v) => v.to_sql(ty, out),
            Value::Text(v) => v.to_sql(ty, out),
            Value::Bytes(v) => v.to_sql(ty, out),
            Value::Timestamp(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(ty: &PgTypeInfo) -> bool {
        matches!(
            *ty,
            PgTypeInfo::BOOL
                | PgTypeInfo::INT4
                | PgTypeInfo::INT8
                | PgTypeInfo::TEXT
                | PgTypeInfo::VARCHAR
                | PgTypeInfo::BPCHAR
                | PgTypeInfo::BYTEA
                | PgTypeInfo::TIMESTAMP
        )
    }

    tokio_postgres::types::to_sql_checked!();
}
