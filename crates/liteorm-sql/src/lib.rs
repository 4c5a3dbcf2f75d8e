//! SQL statement text for liteorm.
//!
//! Every builder is a pure function of a [`Table`] descriptor and the
//! caller's raw clause text. Placeholders are positional (`$1`, `$2`, ...),
//! following the order in which the marshaler produces parameter values.
//!
//! Clauses are appended verbatim. They own their placeholders, so a clause
//! used together with generated placeholders must continue the numbering
//! (see [`build_update`]).

use liteorm_schema::{Column, Table};

/// A PostgreSQL string literal wrapper.
///
/// Display writes the value escaped and quoted with single quotes.
///
/// # Example
/// ```
/// use liteorm_sql::Lit;
/// assert_eq!(format!("{}", Lit("foo")), "'foo'");
/// assert_eq!(format!("{}", Lit("it's")), "'it''s'");
/// ```
pub struct Lit<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> std::fmt::Display for Lit<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'")?;
        for c in self.0.as_ref().chars() {
            if c == '\'' {
                write!(f, "''")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "'")
    }
}

/// Generate CREATE TABLE SQL statement.
///
/// One definition per column: name, type, then the constraint text if any.
pub fn build_create(table: &Table) -> String {
    let defs: Vec<String> = table.columns.iter().map(column_definition).collect();
    format!("CREATE TABLE {} ({});", table.name, defs.join(", "))
}

fn column_definition(col: &Column) -> String {
    let mut def = format!("{} {}", col.name, col.sql_type);
    if let Some(constraint) = col.constraint.as_deref().filter(|c| !c.is_empty()) {
        def.push(' ');
        def.push_str(constraint);
    }
    def
}

/// Generate the cascading DROP TABLE statement issued before a re-create.
pub fn build_drop(table: &Table) -> String {
    format!("DROP TABLE IF EXISTS {} CASCADE;", table.name)
}

/// Generate a SELECT over every column, identity first.
pub fn build_select(table: &Table, clauses: &str) -> String {
    let columns: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
    let head = format!("SELECT {} FROM {}", columns.join(","), table.name);
    with_clauses(head, clauses)
}

/// Generate an INSERT of every non-identity column, returning the new id.
///
/// A table with no value columns gets `DEFAULT VALUES`.
pub fn build_insert(table: &Table) -> String {
    if table.value_columns().next().is_none() {
        return format!("INSERT INTO {} DEFAULT VALUES RETURNING id;", table.name);
    }

    let columns: Vec<&str> = table.value_columns().map(|c| c.name.as_str()).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|idx| format!("${idx}")).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING id;",
        table.name,
        columns.join(","),
        placeholders.join(",")
    )
}

/// Generate an UPDATE of every non-identity column.
///
/// SET placeholders are numbered from `start`, leaving the indices below it
/// to the caller's clause (`WHERE id = $1` with `start = 2`). Returns the
/// statement and the next free placeholder index.
///
/// A table with no value columns assigns the identity to itself, so the
/// statement stays valid and still reports the rows it matched.
pub fn build_update(table: &Table, clauses: &str, start: usize) -> (String, usize) {
    let mut next = start;
    let mut assignments = Vec::new();
    for col in table.value_columns() {
        assignments.push(format!("{} = ${}", col.name, next));
        next += 1;
    }
    if assignments.is_empty() {
        assignments.push("id = id".to_string());
    }

    let head = format!("UPDATE {} SET {}", table.name, assignments.join(", "));
    (with_clauses(head, clauses), next)
}

/// Generate a DELETE restricted by the caller's clauses.
pub fn build_delete(table: &Table, clauses: &str) -> String {
    with_clauses(format!("DELETE FROM {}", table.name), clauses)
}

/// Generate a catalog query answering whether the table exists in `schema`.
pub fn build_table_exists(table: &Table, schema: &str) -> String {
    format!(
        "SELECT EXISTS (SELECT FROM information_schema.tables WHERE table_schema = {} AND table_name = {});",
        Lit(schema),
        Lit(&table.name)
    )
}

fn with_clauses(mut sql: String, clauses: &str) -> String {
    if !clauses.is_empty() {
        sql.push(' ');
        sql.push_str(clauses);
    }
    sql.push(';');
    sql
}
