use super::*;
use proptest::prelude::*;

#[derive(Facet)]
struct Counter {
    id: i64,
    hits: i32,
    total: i64,
    stamp: chrono::NaiveDateTime,
    payload: Vec<u8>,
}

#[derive(Facet)]
struct LateIdentity {
    created: chrono::NaiveDateTime,
    id: i32,
    score: i64,
}

#[derive(Facet)]
struct TextIdentity {
    id: String,
    hits: i32,
}

#[derive(Facet)]
struct Untagged {
    id: i64,
    label: String,
}

#[derive(Facet)]
struct Floaty {
    id: i64,
    ratio: f64,
}

#[derive(Facet)]
struct NoIdentity {
    hits: i32,
}

#[derive(Facet)]
struct Pair(i32, i64);

#[test]
fn test_table_name_lowercases_and_pluralizes() {
    assert_eq!(table_name_for("TestItem"), "testitems");
    assert_eq!(table_name_for("Category"), "categorys");
    assert_eq!(table_name(Counter::SHAPE), "counters");
}

#[test]
fn test_columns_follow_declaration_order() {
    let columns = derive_columns(Counter::SHAPE).unwrap();
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["id", "hits", "total", "stamp", "payload"]);

    let types: Vec<SqlType> = columns.iter().map(|c| c.sql_type).collect();
    assert_eq!(
        types,
        [
            SqlType::BigSerial,
            SqlType::Int,
            SqlType::BigInt,
            SqlType::Timestamp,
            SqlType::Bytea
        ]
    );

    for (idx, col) in columns.iter().enumerate() {
        assert_eq!(col.field_index, idx);
    }
}

#[test]
fn test_identity_column() {
    let table = Table::of::<Counter>().unwrap();
    let id = table.identity().unwrap();
    assert!(id.identity);
    assert_eq!(id.sql_type, SqlType::BigSerial);
    assert_eq!(id.constraint.as_deref(), Some("primary key"));
    assert_eq!(id.kind, FieldKind::I64);
    assert_eq!(table.value_columns().count(), 4);
}

#[test]
fn test_identity_moves_first() {
    let columns = derive_columns(LateIdentity::SHAPE).unwrap();
    assert_eq!(columns[0].name, "id");
    assert_eq!(columns[0].field_index, 1);
    assert_eq!(columns[0].kind, FieldKind::I32);
    assert_eq!(columns[1].name, "created");
    assert_eq!(columns[1].field_index, 0);
    assert_eq!(columns[2].name, "score");
}

#[test]
fn test_identity_ignores_declared_type() {
    let columns = derive_columns(TextIdentity::SHAPE).unwrap();
    assert_eq!(columns[0].sql_type, SqlType::BigSerial);
    assert_eq!(columns[0].kind, FieldKind::Other);
}

#[test]
fn test_missing_length_tag() {
    let err = derive_columns(Untagged::SHAPE).unwrap_err();
    assert_eq!(
        err,
        SchemaError::MissingLengthTag {
            type_name: "Untagged".to_string(),
            field: "label".to_string(),
        }
    );
}

#[test]
fn test_unsupported_field_type() {
    let err = derive_columns(Floaty::SHAPE).unwrap_err();
    match err {
        SchemaError::UnsupportedFieldType {
            type_name, field, ..
        } => {
            assert_eq!(type_name, "Floaty");
            assert_eq!(field, "ratio");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_not_a_struct() {
    assert!(matches!(
        Table::derive(i32::SHAPE),
        Err(SchemaError::NotAStruct { .. })
    ));
    assert!(matches!(
        Table::derive(Pair::SHAPE),
        Err(SchemaError::NotAStruct { .. })
    ));
}

#[test]
fn test_table_without_identity() {
    let table = Table::of::<NoIdentity>().unwrap();
    assert!(table.identity().is_none());
    assert_eq!(table.name, "noidentitys");
    assert!(table.describes(NoIdentity::SHAPE));
    assert!(!table.describes(Counter::SHAPE));
}

#[test]
fn test_derivation_is_deterministic() {
    let a = Table::of::<Counter>().unwrap();
    let b = Table::of::<Counter>().unwrap();
    assert_eq!(a.name, b.name);
    assert_eq!(a.columns, b.columns);
}

#[test]
fn test_sql_type_display() {
    assert_eq!(SqlType::BigSerial.to_string(), "bigserial");
    assert_eq!(SqlType::Int.to_string(), "int");
    assert_eq!(SqlType::BigInt.to_string(), "bigint");
    assert_eq!(SqlType::Varchar(25).to_string(), "varchar(25)");
    assert_eq!(SqlType::Timestamp.to_string(), "timestamp");
    assert_eq!(SqlType::Bytea.to_string(), "bytea");
}

proptest! {
    #[test]
    fn table_name_is_lowercase_plus_s(name in "[A-Za-z][A-Za-z0-9]{0,30}") {
        let table = table_name_for(&name);
        prop_assert!(table.ends_with('s'));
        prop_assert_eq!(&table[..table.len() - 1], name.to_lowercase());
        prop_assert_eq!(table_name_for(&name), table);
    }
}
