//! SQL statement builders.
//!
//! Statements are assembled from an object's field-list accessors. Values are
//! always bound as `?` parameters; table and column names come from the
//! generated accessors and are used verbatim.

use crate::object::DbObject;

/// `n` comma-separated `?` placeholders.
pub fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}

/// Number of columns in a comma-separated field list.
pub fn field_count(fields: &str) -> usize {
    if fields.is_empty() {
        0
    } else {
        fields.split(',').count()
    }
}

/// `a=?,b=?` for a comma-separated field list.
pub fn set_params(fields: &str) -> String {
    if fields.is_empty() {
        return String::new();
    }
    fields
        .split(',')
        .map(|field| format!("{field}=?"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Selects every column of the object's table, with an optional clause.
pub fn select_query<T: DbObject + ?Sized>(obj: &T, clause: &str) -> String {
    let query = format!("select {} from {}", obj.select_fields(), obj.table_name());
    if clause.is_empty() {
        query
    } else {
        format!("{query} {clause}")
    }
}

/// Selects the row whose key equals one bound parameter.
pub fn select_by_key_query<T: DbObject + ?Sized>(obj: &T) -> String {
    select_query(obj, &format!("where {}=?", obj.key_field()))
}

/// Inserts the non-key columns; the database assigns the key.
pub fn insert_query<T: DbObject + ?Sized>(obj: &T) -> String {
    write_query("insert", obj.table_name(), obj.insert_fields())
}

/// Replaces a row by the given column list.
pub fn replace_query(table: &str, fields: &str) -> String {
    write_query("replace", table, fields)
}

fn write_query(verb: &str, table: &str, fields: &str) -> String {
    let count = field_count(fields);
    if count == 0 {
        format!("{verb} into {table} default values")
    } else {
        format!("{verb} into {table} ({fields}) values({})", placeholders(count))
    }
}

/// Updates the updatable columns of the row matching the key.
pub fn update_query<T: DbObject + ?Sized>(obj: &T) -> String {
    format!(
        "update {} set {} where {}=?",
        obj.table_name(),
        set_params(obj.update_fields()),
        obj.key_field()
    )
}

/// Deletes the row matching the key.
pub fn delete_query<T: DbObject + ?Sized>(obj: &T) -> String {
    format!("delete from {} where {}=?", obj.table_name(), obj.key_field())
}
