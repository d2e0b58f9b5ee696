//! `#[derive(DbTable)]` for structs persisted through `dbobj`.
//!
//! The derive registers the `db` field attribute so tags compile, and checks
//! the tags with the same rules `dbgen` applies: every `db` attribute must be
//! a single string literal, at most one field may be the key, a struct
//! with persisted fields must name its table, and the key field must be an
//! `i64` (the runtime stores keys as SQLite rowids). It emits no code; the
//! `DbObject` implementation comes from `dbgen`.

use proc_macro::TokenStream;

mod check;

#[proc_macro_derive(DbTable, attributes(db))]
pub fn derive_db_table(input: TokenStream) -> TokenStream {
    check::derive_db_table(input.into()).into()
}
