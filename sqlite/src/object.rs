//! The contract between generated code and the runtime.
//!
//! Every method answers from compile-time constants or direct field access;
//! the runtime never inspects field metadata itself.

use chrono::{DateTime, Utc};
use rusqlite::Row;
use rusqlite::types::{FromSql, ToSql};

/// Persistence accessors for one table-mapped type.
///
/// Implementations are produced by `dbgen`. Field lists are comma-separated
/// with no spaces, and the positional slices line up with them:
///
/// - [`names`](Self::names) and [`member_pointers`](Self::member_pointers)
///   follow [`select_fields`](Self::select_fields), key first.
/// - [`insert_values`](Self::insert_values) follows
///   [`insert_fields`](Self::insert_fields).
/// - [`update_values`](Self::update_values) follows
///   [`update_fields`](Self::update_fields) with the key appended last.
pub trait DbObject {
    /// A fresh zero-valued instance.
    fn new_obj() -> Self
    where
        Self: Sized;

    /// Field identifiers in select order.
    fn names(&self) -> &'static [&'static str];

    fn table_name(&self) -> &'static str;

    /// Key column name, or `""` when the type has no key.
    fn key_field(&self) -> &'static str;

    /// Key field identifier, or `""` when the type has no key.
    fn key_name(&self) -> &'static str;

    /// Key column first, then every other column.
    fn select_fields(&self) -> &'static str;

    /// Every non-key column.
    fn insert_fields(&self) -> &'static str;

    /// Non-key columns minus those tagged `update:"false"`.
    fn update_fields(&self) -> &'static str;

    /// Current key value; always 0 for keyless types.
    fn key(&self) -> i64;

    /// Stores a newly assigned key; a no-op for keyless types.
    fn set_id(&mut self, id: i64);

    fn insert_values(&self) -> Vec<&dyn ToSql>;

    fn update_values(&self) -> Vec<&dyn ToSql>;

    /// Writable slots for a row fetched with `select_fields`.
    fn member_pointers(&mut self) -> Vec<&mut dyn Column>;

    /// Records who changed the object and when.
    fn modified_by(&mut self, user: i64, at: DateTime<Utc>);
}

/// A field a result column can be read into.
pub trait Column {
    /// Replaces the field with column `idx` of `row`.
    fn read_column(&mut self, row: &Row<'_>, idx: usize) -> rusqlite::Result<()>;
}

impl<T: FromSql> Column for T {
    fn read_column(&mut self, row: &Row<'_>, idx: usize) -> rusqlite::Result<()> {
        *self = row.get(idx)?;
        Ok(())
    }
}

/// Reads one row, produced by `select_fields`, into `obj`.
pub(crate) fn scan_row<T: DbObject + ?Sized>(obj: &mut T, row: &Row<'_>) -> rusqlite::Result<()> {
    for (idx, slot) in obj.member_pointers().into_iter().enumerate() {
        slot.read_column(row, idx)?;
    }
    Ok(())
}
