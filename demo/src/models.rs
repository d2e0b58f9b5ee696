//! Table types. Their `DbObject` impls are generated by `build.rs`.

use dbobj::chrono::{DateTime, Utc};

#[derive(Debug, Default, Clone, PartialEq, dbobj::DbTable)]
pub struct User {
    #[db(r#"sql:"id" key:"true" table:"users""#)]
    pub id: i64,
    #[db(r#"sql:"username""#)]
    pub username: String,
    #[db(r#"sql:"email""#)]
    pub email: Option<String>,
    #[db(r#"sql:"role""#)]
    pub role: i32,
    #[db(r#"sql:"userid" audit:"user""#)]
    pub editor: Option<i64>,
    #[db(r#"sql:"modified" audit:"time""#)]
    pub modified: Option<DateTime<Utc>>,
    #[db(r#"sql:"created" update:"false""#)]
    pub created: DateTime<Utc>,
    /// Not persisted.
    pub session: Option<String>,
}

/// Append-only log; it has no key.
#[derive(Debug, Default, Clone, PartialEq, dbobj::DbTable)]
pub struct Event {
    #[db(r#"sql:"message" table:"events""#)]
    pub message: String,
    #[db(r#"sql:"at""#)]
    pub at: DateTime<Utc>,
}

pub mod billing {
    #[derive(Debug, Default, Clone, PartialEq, dbobj::DbTable)]
    pub struct Invoice {
        #[db(r#"sql:"id" key:"true" table:"invoices""#)]
        pub id: i64,
        #[db(r#"sql:"number""#)]
        pub number: String,
        #[db(r#"sql:"cents""#)]
        pub cents: i64,
    }
}

include!(concat!(env!("OUT_DIR"), "/db_generated.rs"));
