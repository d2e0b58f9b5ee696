//! SQLite object persistence for types with generated accessors.
//!
//! `dbgen` writes one [`DbObject`] implementation per tagged struct. This
//! crate supplies that trait and [`Dbu`], which turns the accessors into
//! parameterized SQL: inserts, updates, deletes, keyed lookups and listings.
//!
//! # Architecture
//!
//! - **`object`**: the [`DbObject`] contract and [`Column`] row slots
//! - **`query`**: statement builders over the field-list accessors
//! - **`dbu`**: the locked connection handle running those statements
//!
//! Generated code refers to [`rusqlite`] and [`chrono`] through the
//! re-exports here, so including crates do not need their own dependency.
//!
//! # Quick start
//!
//! ```no_run
//! # use dbobj::{Column, DbObject, Dbu};
//! # use dbobj::chrono::{DateTime, Utc};
//! # use dbobj::rusqlite::ToSql;
//! # #[derive(Default)]
//! # struct User { id: i64, name: String }
//! # impl DbObject for User {
//! #     fn new_obj() -> Self { Self::default() }
//! #     fn names(&self) -> &'static [&'static str] { &["id", "name"] }
//! #     fn table_name(&self) -> &'static str { "users" }
//! #     fn key_field(&self) -> &'static str { "id" }
//! #     fn key_name(&self) -> &'static str { "id" }
//! #     fn select_fields(&self) -> &'static str { "id,name" }
//! #     fn insert_fields(&self) -> &'static str { "name" }
//! #     fn update_fields(&self) -> &'static str { "name" }
//! #     fn key(&self) -> i64 { self.id }
//! #     fn set_id(&mut self, id: i64) { self.id = id; }
//! #     fn insert_values(&self) -> Vec<&dyn ToSql> { vec![&self.name as &dyn ToSql] }
//! #     fn update_values(&self) -> Vec<&dyn ToSql> { vec![&self.name as &dyn ToSql, &self.id as &dyn ToSql] }
//! #     fn member_pointers(&mut self) -> Vec<&mut dyn Column> { vec![&mut self.id as &mut dyn Column, &mut self.name as &mut dyn Column] }
//! #     fn modified_by(&mut self, _user: i64, _at: DateTime<Utc>) {}
//! # }
//! let dbu = Dbu::open("app.db").unwrap();
//! dbu.execute_batch("create table if not exists users (id integer primary key, name text)")
//!     .unwrap();
//!
//! let mut user = User { name: "alice".into(), ..Default::default() };
//! dbu.add(&mut user).unwrap();
//!
//! let loaded: Option<User> = dbu.find_by_id(user.id).unwrap();
//! assert!(loaded.is_some());
//! ```

mod dbu;
mod error;
mod object;
pub mod query;

pub use dbu::{Dbu, ExecResult};
pub use error::{DbError, Result};
pub use object::{Column, DbObject};

pub use dbobj_derive::DbTable;

pub use chrono;
pub use rusqlite;
