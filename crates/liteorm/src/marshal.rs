//! Conversion between record instances and SQL values.
//!
//! Fields are read through [`Peek`] and written back by building a fresh
//! instance through [`Partial`], so records never need to be anything more
//! than plain structs deriving `Facet`.
//!
//! Every function takes the [`Table`] the caller derived for `T` and refuses
//! descriptors derived from another type.

use crate::{Error, Result, Value};
use facet::Facet;
use facet_reflect::{Partial, Peek};
use liteorm_schema::{Column, FieldKind, Table};
use std::fmt::Display;

/// Read every non-identity field of `record`, in declaration order.
pub fn to_parameters<T: Facet<'static>>(table: &Table, record: &T) -> Result<Vec<Value>> {
    ensure_describes::<T>(table)?;
    read_columns(table, record, table.value_columns())
}

/// Allocate one zero-valued slot per column, identity first.
///
/// The slots carry the value type the database returns for each column; the
/// identity slot is always a 64-bit integer.
pub fn scan_targets(table: &Table) -> Vec<Value> {
    table
        .columns
        .iter()
        .map(|col| Value::zero(col.sql_type))
        .collect()
}

/// Overwrite every field of `record` with scanned column values.
pub fn apply_scanned<T: Facet<'static>>(
    table: &Table,
    record: &mut T,
    values: Vec<Value>,
) -> Result<()> {
    *record = from_scanned(table, values)?;
    Ok(())
}

/// Build a fresh record from scanned column values.
pub fn from_scanned<T: Facet<'static>>(table: &Table, values: Vec<Value>) -> Result<T> {
    ensure_describes::<T>(table)?;

    if values.len() != table.columns.len() {
        return Err(Error::FieldCountMismatch {
            type_name: table.type_name.to_string(),
            expected: table.columns.len(),
            actual: values.len(),
        });
    }

    let mut partial = Partial::alloc_owned::<T>()?;
    for (col, value) in table.columns.iter().zip(values) {
        partial = partial.begin_field(col.field_name)?;
        partial = set_field(table, col, partial, value)?;
        partial = partial.end()?;
    }

    let heap_value = partial.build()?;
    Ok(heap_value.materialize()?)
}

/// Read the identity of `record`.
pub fn get_identity<T: Facet<'static>>(table: &Table, record: &T) -> Result<i64> {
    ensure_describes::<T>(table)?;
    let identity = identity_column(table)?;

    let mut values = read_columns(table, record, std::iter::once(identity))?;
    match values.pop() {
        Some(Value::I64(id)) => Ok(id),
        Some(Value::I32(id)) => Ok(i64::from(id)),
        _ => Err(Error::FieldAccess {
            field: identity.field_name.to_string(),
            message: "identity field is not an integer".to_string(),
        }),
    }
}

/// Set the identity of `record`, leaving every other field as it was.
pub fn set_identity<T: Facet<'static>>(table: &Table, record: &mut T, id: i64) -> Result<()> {
    ensure_describes::<T>(table)?;
    let identity = identity_column(table)?;

    let fits = match identity.kind {
        FieldKind::I64 => true,
        FieldKind::I32 => i32::try_from(id).is_ok(),
        _ => false,
    };
    if !fits {
        return Err(not_addressable(table, identity, Some(id)));
    }

    let mut values = read_columns(table, &*record, table.columns.iter())?;
    if let Some(slot) = table.columns.iter().position(|c| c.identity) {
        values[slot] = Value::I64(id);
    }
    apply_scanned(table, record, values)
}

/// The identity column of `table`, if it is an integer field that a
/// generated id can be written to.
///
/// Run before any statement whose result will be stored with
/// [`set_identity`]. An `i32` identity can still overflow once the id is
/// known; that error carries the id the database generated.
pub fn writable_identity(table: &Table) -> Result<&Column> {
    let identity = identity_column(table)?;
    match identity.kind {
        FieldKind::I32 | FieldKind::I64 => Ok(identity),
        _ => Err(not_addressable(table, identity, None)),
    }
}

fn ensure_describes<T: Facet<'static>>(table: &Table) -> Result<()> {
    if table.describes(T::SHAPE) {
        Ok(())
    } else {
        Err(Error::DescriptorMismatch {
            expected: table.type_name.to_string(),
            actual: T::SHAPE.type_identifier.to_string(),
        })
    }
}

fn identity_column(table: &Table) -> Result<&Column> {
    table.identity().ok_or_else(|| Error::IdentityFieldMissing {
        type_name: table.type_name.to_string(),
    })
}

fn not_addressable(table: &Table, identity: &Column, value: Option<i64>) -> Error {
    Error::NotAddressable {
        type_name: table.type_name.to_string(),
        field_type: format!("{:?}", identity.kind),
        value,
    }
}

fn field_access(col: &Column, e: impl Display) -> Error {
    Error::FieldAccess {
        field: col.field_name.to_string(),
        message: e.to_string(),
    }
}

/// Read the given columns of `record` into values.
fn read_columns<'t, T: Facet<'static>>(
    table: &Table,
    record: &T,
    columns: impl Iterator<Item = &'t Column>,
) -> Result<Vec<Value>> {
    let peek = Peek::new(record);
    let fields = peek.into_struct().map_err(|e| Error::FieldAccess {
        field: table.type_name.to_string(),
        message: e.to_string(),
    })?;

    columns
        .map(|col| {
            let field = fields
                .field(col.field_index)
                .map_err(|e| field_access(col, e))?;
            let value = match col.kind {
                FieldKind::I32 => {
                    Value::I32(*field.get::<i32>().map_err(|e| field_access(col, e))?)
                }
                FieldKind::I64 => {
                    Value::I64(*field.get::<i64>().map_err(|e| field_access(col, e))?)
                }
                FieldKind::Text => Value::Text(
                    field
                        .get::<String>()
                        .map_err(|e| field_access(col, e))?
                        .clone(),
                ),
                FieldKind::Bytes => Value::Bytes(
                    field
                        .get::<Vec<u8>>()
                        .map_err(|e| field_access(col, e))?
                        .clone(),
                ),
                FieldKind::Timestamp => Value::Timestamp(
                    *field
                        .get::<chrono::NaiveDateTime>()
                        .map_err(|e| field_access(col, e))?,
                ),
                FieldKind::Other => {
                    return Err(field_access(col, "field type has no SQL mapping"));
                }
            };
            Ok(value)
        })
        .collect()
}

/// Store one scanned value into the field the partial is positioned on.
fn set_field(
    table: &Table,
    col: &Column,
    partial: Partial<'static, false>,
    value: Value,
) -> Result<Partial<'static, false>> {
    let partial = match (col.kind, value) {
        (FieldKind::I32, Value::I32(v)) => partial.set(v)?,
        (FieldKind::I64, Value::I64(v)) => partial.set(v)?,
        (FieldKind::Text, Value::Text(v)) => partial.set(v)?,
        (FieldKind::Bytes, Value::Bytes(v)) => partial.set(v)?,
        (FieldKind::Timestamp, Value::Timestamp(v)) => partial.set(v)?,

        // bigserial comes back as i64 whatever the identity field holds
        (FieldKind::I32, Value::I64(v)) if col.identity => {
            let narrowed =
                i32::try_from(v).map_err(|_| not_addressable(table, col, Some(v)))?;
            partial.set(narrowed)?
        }
        (FieldKind::Other, Value::I64(v)) if col.identity => {
            return Err(not_addressable(table, col, Some(v)));
        }

        (kind, value) => {
            return Err(field_access(
                col,
                format!("expected {kind:?} but got {}", value.type_name()),
            ));
        }
    };
    Ok(partial)
}
