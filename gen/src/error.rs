//! Error types for code generation.
//!
//! Every variant here is fatal for a generation run: nothing is written to
//! the output destination once one of them is raised.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while scanning sources or emitting generated code.
#[derive(Debug, Error)]
pub enum GenError {
    /// Source file or output destination could not be read or written.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A source file is not valid Rust.
    #[error("parsing '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: syn::Error,
    },

    /// The input named no Rust source files.
    #[error("{0}: no Rust source files")]
    NoSourceFiles(PathBuf),

    /// Input files were spread across more than one directory.
    #[error("input files must belong to a single module directory, found '{first}' and '{other}'")]
    MixedModules { first: PathBuf, other: PathBuf },

    /// A source file holding persistable types cannot be named as a module.
    #[error("'{0}': file name is not a valid module name")]
    InvalidModuleName(PathBuf),

    /// A `#[db(...)]` attribute was not a single string literal.
    #[error("invalid #[db] attribute on {type_name}.{field}: {message}")]
    InvalidAttribute {
        type_name: String,
        field: String,
        message: String,
    },

    /// More than one field of a type is tagged as the key.
    #[error("type {type_name} has more than one key field: {first} and {second}")]
    DuplicateKey {
        type_name: String,
        first: String,
        second: String,
    },

    /// A type has persisted fields but no `table` tag.
    #[error("type {0} has sql fields but no table tag")]
    MissingTable(String),

    /// The configured runtime crate path is not a Rust path.
    #[error("invalid runtime path '{0}'")]
    InvalidRuntimePath(String),

    /// Configuration file could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),
}

/// Convenience alias for results with [`GenError`].
pub type Result<T> = std::result::Result<T, GenError>;
