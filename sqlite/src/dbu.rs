//! The database handle objects are persisted through.
//!
//! [`Dbu`] turns an object's generated accessors into parameterized SQL and
//! maps result rows back through its member slots. Every statement runs with
//! the connection lock held, so writes from concurrent callers never
//! interleave and an insert's rowid is read under the same lock.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;
use rusqlite::types::{FromSql, ToSql};
use tracing::debug;

use crate::error::{DbError, Result};
use crate::object::{DbObject, scan_row};
use crate::query::{
    delete_query, insert_query, replace_query, select_by_key_query, select_query, update_query,
};

/// Outcome of one write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: usize,
    pub last_insert_id: i64,
}

/// A SQLite connection shared behind a lock.
///
/// # Examples
///
/// ```no_run
/// use dbobj::Dbu;
///
/// let dbu = Dbu::open("app.db").unwrap();
/// dbu.execute_batch("create table if not exists users (id integer primary key, name text)")
///     .unwrap();
/// let count = dbu.get_int("select count(*) from users", &[]).unwrap();
/// println!("{count} users");
/// ```
#[derive(Debug)]
pub struct Dbu {
    conn: Mutex<Connection>,
}

impl Dbu {
    /// Opens (or creates) the database file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Database`] if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Opening database");
        Ok(Self::from_connection(Connection::open(path)?))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Releases the underlying connection.
    pub fn into_inner(self) -> Result<Connection> {
        self.conn.into_inner().map_err(|_| DbError::LockPoisoned)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    /// Runs one or more statements without parameters.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        debug!(sql = %sql, "Executing batch");
        self.lock()?.execute_batch(sql)?;
        Ok(())
    }

    /// Runs one write statement.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Database`] for any SQLite failure.
    pub fn exec(&self, query: &str, params: &[&dyn ToSql]) -> Result<ExecResult> {
        debug!(query = %query, params = params.len(), "Executing statement");
        let conn = self.lock()?;
        let rows_affected = conn.execute(query, params)?;
        Ok(ExecResult {
            rows_affected,
            last_insert_id: conn.last_insert_rowid(),
        })
    }

    /// Runs one statement per parameter row inside a single transaction.
    ///
    /// Returns the total number of rows affected. Nothing is committed if
    /// any row fails.
    pub fn insert_many(&self, query: &str, rows: &[Vec<&dyn ToSql>]) -> Result<usize> {
        debug!(query = %query, rows = rows.len(), "Executing statement for many rows");
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut total = 0;
        {
            let mut stmt = tx.prepare(query)?;
            for values in rows {
                total += stmt.execute(values.as_slice())?;
            }
        }
        tx.commit()?;
        Ok(total)
    }

    // -----------------------------------------------------------------------
    // Object writes
    // -----------------------------------------------------------------------

    /// Inserts `obj` and stores the assigned key back into it.
    pub fn add<T: DbObject>(&self, obj: &mut T) -> Result<()> {
        let query = insert_query(&*obj);
        let id = {
            let values = obj.insert_values();
            self.exec(&query, &values)?.last_insert_id
        };
        obj.set_id(id);
        Ok(())
    }

    /// Inserts `obj`, replacing any row with the same key.
    ///
    /// An object whose key is unset is inserted as new and receives the
    /// assigned key, like [`add`](Self::add).
    pub fn replace<T: DbObject>(&self, obj: &mut T) -> Result<()> {
        let key = obj.key();
        let id = if obj.key_field().is_empty() || key == 0 {
            let values = obj.insert_values();
            let query = replace_query(obj.table_name(), obj.insert_fields());
            self.exec(&query, &values)?.last_insert_id
        } else {
            let mut values: Vec<&dyn ToSql> = vec![&key as &dyn ToSql];
            values.extend(obj.insert_values());
            let query = replace_query(obj.table_name(), obj.select_fields());
            self.exec(&query, &values)?.last_insert_id
        };
        obj.set_id(id);
        Ok(())
    }

    /// Writes the updatable columns of `obj` to the row matching its key.
    ///
    /// Columns tagged `update:"false"` keep their stored values. A type with
    /// no updatable columns is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NoKeyField`] if the type has no key.
    pub fn save<T: DbObject>(&self, obj: &T) -> Result<()> {
        if obj.key_field().is_empty() {
            return Err(DbError::NoKeyField(obj.table_name()));
        }
        if obj.update_fields().is_empty() {
            debug!(table = obj.table_name(), "No updatable columns; skipping save");
            return Ok(());
        }
        let values = obj.update_values();
        self.exec(&update_query(obj), &values)?;
        Ok(())
    }

    /// Deletes the row matching the key of `obj`.
    pub fn delete<T: DbObject>(&self, obj: &T) -> Result<()> {
        self.delete_key(obj, obj.key())
    }

    /// Deletes the `T` row whose key is `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NoKeyField`] for keyless types and
    /// [`DbError::NoRecordDeleted`] when no row matched.
    pub fn delete_by_id<T: DbObject>(&self, id: i64) -> Result<()> {
        self.delete_key(&T::new_obj(), id)
    }

    fn delete_key<T: DbObject>(&self, obj: &T, id: i64) -> Result<()> {
        if obj.key_field().is_empty() {
            return Err(DbError::NoKeyField(obj.table_name()));
        }
        let result = self.exec(&delete_query(obj), &[&id as &dyn ToSql])?;
        if result.rows_affected == 0 {
            return Err(DbError::NoRecordDeleted(id));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Object reads
    // -----------------------------------------------------------------------

    /// Runs `query` and reads its first row into `obj`.
    ///
    /// The query must select the object's `select_fields` in order. Returns
    /// false, leaving `obj` unchanged, when no row matched.
    pub fn load<T: DbObject + ?Sized>(
        &self,
        obj: &mut T,
        query: &str,
        params: &[&dyn ToSql],
    ) -> Result<bool> {
        debug!(query = %query, params = params.len(), "Loading object");
        let conn = self.lock()?;
        let mut stmt = conn.prepare(query)?;
        let mut rows = stmt.query(params)?;
        let found = match rows.next()? {
            Some(row) => {
                scan_row(obj, row)?;
                true
            }
            None => false,
        };
        Ok(found)
    }

    /// Finds the first `T` whose columns equal all the given values.
    ///
    /// With no conditions the first row of the table is returned.
    pub fn find<T: DbObject>(&self, conditions: &[(&str, &dyn ToSql)]) -> Result<Option<T>> {
        let mut obj = T::new_obj();
        let clause = if conditions.is_empty() {
            String::new()
        } else {
            let terms: Vec<String> = conditions
                .iter()
                .map(|(column, _)| format!("{column}=?"))
                .collect();
            format!("where {}", terms.join(" and "))
        };
        let query = select_query(&obj, &clause);
        let params: Vec<&dyn ToSql> = conditions.iter().map(|(_, value)| *value).collect();
        Ok(self.load(&mut obj, &query, &params)?.then_some(obj))
    }

    /// Finds the first `T` whose `column` equals `value`.
    pub fn find_by<T: DbObject>(&self, column: &str, value: &dyn ToSql) -> Result<Option<T>> {
        self.find(&[(column, value)])
    }

    /// Finds the `T` whose key is `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NoKeyField`] for keyless types.
    pub fn find_by_id<T: DbObject>(&self, id: i64) -> Result<Option<T>> {
        let mut obj = T::new_obj();
        if obj.key_field().is_empty() {
            return Err(DbError::NoKeyField(obj.table_name()));
        }
        let query = select_by_key_query(&obj);
        Ok(self.load(&mut obj, &query, &[&id as &dyn ToSql])?.then_some(obj))
    }

    /// Reloads `obj` from the row matching its current key.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NoKeyField`] for keyless types and
    /// [`DbError::KeyMissing`] when the key is zero.
    pub fn find_self<T: DbObject + ?Sized>(&self, obj: &mut T) -> Result<bool> {
        if obj.key_field().is_empty() {
            return Err(DbError::NoKeyField(obj.table_name()));
        }
        let key = obj.key();
        if key == 0 {
            return Err(DbError::KeyMissing(obj.table_name()));
        }
        let query = select_by_key_query(&*obj);
        self.load(obj, &query, &[&key as &dyn ToSql])
    }

    /// Every `T` in its table.
    pub fn list<T: DbObject>(&self) -> Result<Vec<T>> {
        self.list_query("", &[])
    }

    /// Every `T` selected with `clause` appended (for example
    /// `where role=? order by name`).
    pub fn list_query<T: DbObject>(&self, clause: &str, params: &[&dyn ToSql]) -> Result<Vec<T>> {
        let query = select_query(&T::new_obj(), clause);
        debug!(query = %query, params = params.len(), "Listing objects");
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&query)?;
        let mut rows = stmt.query(params)?;
        let mut objects = Vec::new();
        while let Some(row) = rows.next()? {
            let mut obj = T::new_obj();
            scan_row(&mut obj, row)?;
            objects.push(obj);
        }
        Ok(objects)
    }

    // -----------------------------------------------------------------------
    // Scalar reads
    // -----------------------------------------------------------------------

    /// The first column of every row, read as integers.
    pub fn get_ids(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<i64>> {
        debug!(query = %query, params = params.len(), "Querying ids");
        let conn = self.lock()?;
        let mut stmt = conn.prepare(query)?;
        let ids = stmt
            .query_map(params, |row| row.get::<_, i64>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    /// The first column of the first row as text.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Database`] if no row matched or the value is not
    /// text.
    pub fn get_string(&self, query: &str, params: &[&dyn ToSql]) -> Result<String> {
        self.get_value(query, params)
    }

    /// The first column of the first row as an integer.
    pub fn get_int(&self, query: &str, params: &[&dyn ToSql]) -> Result<i64> {
        self.get_value(query, params)
    }

    fn get_value<V: FromSql>(&self, query: &str, params: &[&dyn ToSql]) -> Result<V> {
        debug!(query = %query, params = params.len(), "Querying value");
        let conn = self.lock()?;
        let value = conn.query_row(query, params, |row| row.get(0))?;
        Ok(value)
    }
}
