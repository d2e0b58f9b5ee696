//! Struct-tag driven code generation for the `dbobj` runtime.
//!
//! The generator reads Rust source files, finds structs whose fields carry
//! `#[db("...")]` tags, and writes one `impl dbobj::DbObject` block per
//! persistable type. The runtime then performs inserts, updates, deletes and
//! lookups purely through those generated accessors; no field metadata is
//! inspected at run time.
//!
//! The pipeline runs in one direction:
//!
//! - [`FieldTag`]: parses one field's tag string.
//! - [`Package`]: loads a module's source files and scans their structs.
//! - [`TypeDescriptor`]: aggregates a struct's tags into table, key,
//!   ordered columns, audit fields and the no-update set.
//! - [`synth::render`]: renders the impl block for one descriptor.
//! - [`Generator`]: assembles and normalizes the output unit.
//!
//! # Tag grammar
//!
//! A tag is a string of space-separated `key:"value"` pairs. The usual
//! spelling is a raw string so the quotes need no escaping:
//!
//! ```text
//! #[derive(Default, dbobj::DbTable)]
//! pub struct User {
//!     #[db(r#"sql:"id" key:"true" table:"users""#)]
//!     pub id: i64,
//!     #[db(r#"sql:"username""#)]
//!     pub username: String,
//!     #[db(r#"sql:"created" update:"false""#)]
//!     pub created: DateTime<Utc>,
//!     #[db(r#"sql:"modified" audit:"time""#)]
//!     pub modified: DateTime<Utc>,
//! }
//! ```
//!
//! # Example
//!
//! ```
//! use dbobj_gen::{Generator, Package};
//!
//! let source = r##"
//!     #[derive(Default)]
//!     struct Thing {
//!         #[db(r#"sql:"id" key:"true" table:"things""#)]
//!         id: i64,
//!         #[db(r#"sql:"name""#)]
//!         name: String,
//!     }
//! "##;
//! let package = Package::from_sources("models", &[("models.rs", source)]).unwrap();
//! let unit = Generator::new(&package).generate(&[]).unwrap();
//! assert!(unit.source.contains("impl ::dbobj::DbObject for Thing"));
//! assert!(unit.source.contains("\"id,name\""));
//! ```

mod config;
mod descriptor;
mod error;
mod output;
mod scanner;
pub mod synth;
mod tag;

pub use config::{GenConfig, GenerateOutcome};
pub use descriptor::{ColumnField, FieldInfo, TypeDescriptor};
pub use error::{GenError, Result};
pub use output::{
    DEFAULT_OUTPUT_NAME, DEFAULT_RUNTIME_PATH, GeneratedUnit, Generator, default_output_path,
    parse_type_list,
};
pub use scanner::{GENERATED_BANNER, Package, SourceFile, TAG_ATTRIBUTE, describe_struct};
pub use tag::{AuditRole, FieldTag, lookup, parse_bool};
