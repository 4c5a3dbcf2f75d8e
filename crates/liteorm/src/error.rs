use facet_reflect::{AllocError, ReflectError, ShapeMismatchError};
use liteorm_schema::SchemaError;
use thiserror::Error;

/// Boxed error surfaced by a [`Driver`](crate::Driver).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    /// The record type cannot be mapped to a table.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("{type_name} has no `id` field")]
    IdentityFieldMissing { type_name: String },

    /// `value` is the generated id when one was already returned.
    #[error("the `id` field of {type_name} ({field_type}) cannot hold a generated identity")]
    NotAddressable {
        type_name: String,
        field_type: String,
        value: Option<i64>,
    },

    #[error("{type_name} has {expected} columns but {actual} values were scanned")]
    FieldCountMismatch {
        type_name: String,
        expected: usize,
        actual: usize,
    },

    #[error("update of {type_name} affected {affected} rows instead of 1")]
    UnexpectedRowCount { type_name: String, affected: u64 },

    #[error("descriptor for {expected} used with a {actual} record")]
    DescriptorMismatch { expected: String, actual: String },

    #[error("could not {operation} {type_name}: {source}")]
    Driver {
        operation: &'static str,
        type_name: String,
        #[source]
        source: BoxError,
    },

    #[error("could not connect to postgres: {0}")]
    Connect(#[source] tokio_postgres::Error),

    #[error("cannot read field `{field}`: {message}")]
    FieldAccess { field: String, message: String },

    #[error("reflection error: {0}")]
    Reflect(#[from] ReflectError),

    #[error("allocation error: {0}")]
    Alloc(#[from] AllocError),

    #[error("shape mismatch: {0}")]
    ShapeMismatch(#[from] ShapeMismatchError),
}

impl Error {
    /// Wrap a driver failure with the operation and record type it aborted.
    pub(crate) fn driver(
        operation: &'static str,
        type_name: &str,
    ) -> impl FnOnce(BoxError) -> Error + '_ {
        move |source| Error::Driver {
            operation,
            type_name: type_name.to_string(),
            source,
        }
    }
}
