//! A small application persisting its models through `dbobj`.
//!
//! `build.rs` runs the generator over `src/models.rs` and the output is
//! included at the end of that module.

pub mod models;

use dbobj::chrono::Utc;
use dbobj::{DbObject, Dbu};

pub use models::billing::Invoice;
pub use models::{Event, User};

/// Tables for every model.
pub const SCHEMA: &str = "
    create table if not exists users (
        id integer primary key,
        username text not null unique,
        email text,
        role integer not null default 0,
        userid integer,
        modified text,
        created text not null
    );
    create table if not exists events (
        message text not null,
        at text not null
    );
    create table if not exists invoices (
        id integer primary key,
        number text not null,
        cents integer not null
    );
";

/// Opens an in-memory database with the schema applied.
pub fn open_in_memory() -> dbobj::Result<Dbu> {
    let dbu = Dbu::open_in_memory()?;
    dbu.execute_batch(SCHEMA)?;
    Ok(dbu)
}

/// Stamps `obj` as modified by `user` now, then saves it.
pub fn save_as<T: DbObject>(dbu: &Dbu, obj: &mut T, user: i64) -> dbobj::Result<()> {
    obj.modified_by(user, Utc::now());
    dbu.save(obj)
}
