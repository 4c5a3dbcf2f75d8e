//! Table descriptors for liteorm.
//!
//! A record type is any struct with named fields that derives `Facet`. Its
//! table descriptor is derived from the type's static [`Shape`]: the table
//! name comes from the bare type name, and every field becomes one column.
//!
//! ```ignore
//! use facet::Facet;
//!
//! #[derive(Facet)]
//! struct Article {
//!     id: i64,
//!     #[facet(liteorm::len = "120")]
//!     #[facet(liteorm::sql = "not null")]
//!     title: String,
//!     views: i32,
//! }
//!
//! let table = liteorm_schema::Table::of::<Article>()?;
//! assert_eq!(table.name, "articles");
//! ```

use facet::{Facet, Field, Shape, Type, UserType};
use facet_core::StructKind;
use std::fmt;

// Define the liteorm attribute grammar using facet's macro.
// This generates the `Attr` enum and the `__attr!` macro, re-exported by the
// `liteorm` crate so that `#[facet(liteorm::len = "25")]` resolves.
facet::define_attr_grammar! {
    ns "liteorm";
    crate_path ::liteorm;

    /// Liteorm column attribute types.
    pub enum Attr {
        /// Length of the `varchar` column backing a `String` field. Required
        /// on every `String` field.
        ///
        /// Usage: `#[facet(liteorm::len = "25")]`
        Len(&'static str),

        /// Constraint text appended verbatim to the column definition.
        ///
        /// Usage: `#[facet(liteorm::sql = "not null unique")]`
        Sql(&'static str),
    }
}

/// Name of the reserved identity field.
pub const IDENTITY_FIELD: &str = "id";

/// Constraint always attached to the identity column.
pub const IDENTITY_CONSTRAINT: &str = "primary key";

/// Errors raised while deriving a table descriptor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("{type_name} is not a struct with named fields")]
    NotAStruct { type_name: String },

    #[error("field `{field}` of {type_name} is a String without a `liteorm::len` tag")]
    MissingLengthTag { type_name: String, field: String },

    #[error(
        "`liteorm::len` tag on field `{field}` of {type_name} must be a positive integer, got {value:?}"
    )]
    InvalidLengthTag {
        type_name: String,
        field: String,
        value: String,
    },

    #[error("field `{field}` of {type_name} has unsupported type {field_type}")]
    UnsupportedFieldType {
        type_name: String,
        field: String,
        field_type: String,
    },
}

/// Postgres column types produced by the deriver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    /// BIGSERIAL, reserved for the identity column
    BigSerial,
    /// INT (4 bytes)
    Int,
    /// BIGINT (8 bytes)
    BigInt,
    /// VARCHAR(n)
    Varchar(u32),
    /// TIMESTAMP (without time zone)
    Timestamp,
    /// BYTEA
    Bytea,
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::BigSerial => write!(f, "bigserial"),
            SqlType::Int => write!(f, "int"),
            SqlType::BigInt => write!(f, "bigint"),
            SqlType::Varchar(len) => write!(f, "varchar({len})"),
            SqlType::Timestamp => write!(f, "timestamp"),
            SqlType::Bytea => write!(f, "bytea"),
        }
    }
}

/// The Rust type stored in a record field, as far as marshaling cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// `i32`
    I32,
    /// `i64`
    I64,
    /// `String`
    Text,
    /// `chrono::NaiveDateTime`
    Timestamp,
    /// `Vec<u8>`
    Bytes,
    /// Anything else. Only reachable for the identity field, whose SQL type
    /// does not depend on the Rust type.
    Other,
}

impl FieldKind {
    /// Classify a field shape.
    pub fn of(shape: &Shape) -> Self {
        if shape == i32::SHAPE {
            FieldKind::I32
        } else if shape == i64::SHAPE {
            FieldKind::I64
        } else if shape == String::SHAPE {
            FieldKind::Text
        } else if shape == chrono::NaiveDateTime::SHAPE {
            FieldKind::Timestamp
        } else if shape == <Vec<u8>>::SHAPE {
            FieldKind::Bytes
        } else {
            FieldKind::Other
        }
    }
}

/// A column of a derived table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name (lower-cased field name)
    pub name: String,
    /// Field name as declared on the struct
    pub field_name: &'static str,
    /// Position of the field in declaration order
    pub field_index: usize,
    /// Postgres type
    pub sql_type: SqlType,
    /// Constraint text appended after the type, verbatim
    pub constraint: Option<String>,
    /// Whether this is the identity column
    pub identity: bool,
    /// Rust-side storage of the field
    pub kind: FieldKind,
}

/// A table descriptor derived from a record type.
///
/// The identity column, when present, is always first. The remaining columns
/// follow field declaration order.
#[derive(Clone)]
pub struct Table {
    /// Table name
    pub name: String,
    /// Bare name of the record type
    pub type_name: &'static str,
    /// Shape the descriptor was derived from
    pub shape: &'static Shape,
    /// Columns
    pub columns: Vec<Column>,
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("columns", &self.columns)
            .finish()
    }
}

impl Table {
    /// Derive the descriptor for a record type.
    pub fn of<T: Facet<'static>>() -> Result<Self, SchemaError> {
        Self::derive(T::SHAPE)
    }

    /// Derive the descriptor for a shape.
    pub fn derive(shape: &'static Shape) -> Result<Self, SchemaError> {
        let columns = derive_columns(shape)?;
        Ok(Self {
            name: table_name(shape),
            type_name: shape.type_identifier,
            shape,
            columns,
        })
    }

    /// The identity column, if the record type has an `id` field.
    pub fn identity(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.identity)
    }

    /// Columns carrying record values, i.e. everything but the identity.
    pub fn value_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.identity)
    }

    /// Whether this descriptor was derived from `shape`.
    pub fn describes(&self, shape: &Shape) -> bool {
        self.shape == shape
    }
}

/// Table name for a shape: lower-cased bare type name plus `s`.
pub fn table_name(shape: &Shape) -> String {
    table_name_for(shape.type_identifier)
}

/// Table name for a bare type name.
///
/// Pluralization is naive: `Category` becomes `categorys`.
pub fn table_name_for(type_name: &str) -> String {
    format!("{}s", type_name.to_lowercase())
}

/// Derive the columns of a record type, identity first.
pub fn derive_columns(shape: &'static Shape) -> Result<Vec<Column>, SchemaError> {
    let fields = struct_fields(shape)?;

    let mut identity = None;
    let mut columns = Vec::with_capacity(fields.len());

    for (index, field) in fields.iter().enumerate() {
        let field_shape = field.shape();

        if field.name == IDENTITY_FIELD {
            // The identity mapping wins over the field's type and tags.
            identity = Some(Column {
                name: field.name.to_lowercase(),
                field_name: field.name,
                field_index: index,
                sql_type: SqlType::BigSerial,
                constraint: Some(IDENTITY_CONSTRAINT.to_string()),
                identity: true,
                kind: FieldKind::of(field_shape),
            });
            continue;
        }

        let kind = FieldKind::of(field_shape);
        let sql_type = match kind {
            FieldKind::I32 => SqlType::Int,
            FieldKind::I64 => SqlType::BigInt,
            FieldKind::Text => SqlType::Varchar(length_tag(shape, field)?),
            FieldKind::Timestamp => SqlType::Timestamp,
            FieldKind::Bytes => SqlType::Bytea,
            FieldKind::Other => {
                return Err(SchemaError::UnsupportedFieldType {
                    type_name: shape.type_identifier.to_string(),
                    field: field.name.to_string(),
                    field_type: field_shape.to_string(),
                });
            }
        };

        columns.push(Column {
            name: field.name.to_lowercase(),
            field_name: field.name,
            field_index: index,
            sql_type,
            constraint: field_get_liteorm_attr_str(field, "sql").map(|s| s.to_string()),
            identity: false,
            kind,
        });
    }

    if let Some(identity) = identity {
        columns.insert(0, identity);
    }

    Ok(columns)
}

/// Named fields of a struct shape.
fn struct_fields(shape: &'static Shape) -> Result<&'static [Field], SchemaError> {
    match &shape.ty {
        Type::User(UserType::Struct(s)) if s.kind == StructKind::Struct => Ok(s.fields),
        _ => Err(SchemaError::NotAStruct {
            type_name: shape.type_identifier.to_string(),
        }),
    }
}

/// Read the `liteorm::len` tag of a `String` field.
fn length_tag(owner: &Shape, field: &Field) -> Result<u32, SchemaError> {
    let Some(raw) = field_get_liteorm_attr_str(field, "len") else {
        return Err(SchemaError::MissingLengthTag {
            type_name: owner.type_identifier.to_string(),
            field: field.name.to_string(),
        });
    };

    match raw.parse::<u32>() {
        Ok(len) if len > 0 => Ok(len),
        _ => Err(SchemaError::InvalidLengthTag {
            type_name: owner.type_identifier.to_string(),
            field: field.name.to_string(),
            value: raw.to_string(),
        }),
    }
}

/// Get a string value from a liteorm attribute on a field.
fn field_get_liteorm_attr_str(field: &Field, key: &str) -> Option<&'static str> {
    field.attributes.iter().find_map(|attr| {
        if attr.ns == Some("liteorm") && attr.key == key {
            attr.get_as::<&str>().copied()
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests;
