//! Generator configuration.
//!
//! A [`GenConfig`] describes one generation run. The CLI fills it from an
//! optional YAML file and then applies its flags on top; build scripts
//! construct it directly.
//!
//! # Example YAML
//!
//! ```yaml
//! inputs:
//!   - src/models.rs
//! types:
//!   - User
//!   - Role
//! output: src/db_generated.rs
//! runtime_path: "::dbobj"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{GenError, Result};
use crate::output::{DEFAULT_RUNTIME_PATH, GeneratedUnit, Generator, default_output_path};
use crate::scanner::Package;

/// Settings for one generation run.
///
/// # Examples
///
/// ```
/// use dbobj_gen::GenConfig;
///
/// let config = GenConfig {
///     inputs: vec!["src/models.rs".into()],
///     types: vec!["User".into()],
///     ..GenConfig::default()
/// };
/// assert_eq!(config.runtime_path, "::dbobj");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenConfig {
    /// One directory, or files from a single directory. Empty means `.`.
    /// Several files are addressed from the directory root module, each
    /// non-root file as its own child module.
    pub inputs: Vec<PathBuf>,
    /// Types to generate for; empty means every persistable struct.
    pub types: Vec<String>,
    /// Destination file; derived from the source directory when unset.
    pub output: Option<PathBuf>,
    /// Path generated code uses to reach the runtime crate.
    pub runtime_path: String,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            types: Vec::new(),
            output: None,
            runtime_path: DEFAULT_RUNTIME_PATH.to_string(),
        }
    }
}

/// What a completed run produced.
#[derive(Debug)]
pub struct GenerateOutcome {
    pub output: PathBuf,
    pub unit: GeneratedUnit,
}

impl GenConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML for
    /// this structure.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| GenError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_yaml::from_str(&text)?)
    }

    /// Resolves the destination path for this configuration.
    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => default_output_path(&self.source_dir(), &self.types),
        }
    }

    fn input_list(&self) -> Vec<PathBuf> {
        if self.inputs.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            self.inputs.clone()
        }
    }

    fn single_dir(&self) -> Option<PathBuf> {
        match self.input_list().as_slice() {
            [only] if only.is_dir() => Some(only.clone()),
            _ => None,
        }
    }

    fn source_dir(&self) -> PathBuf {
        if let Some(dir) = self.single_dir() {
            return dir;
        }
        match self.input_list().first().and_then(|path| path.parent()) {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Scans the inputs, generates the unit and writes it.
    ///
    /// `invocation` is recorded in the generated banner. Nothing is written
    /// unless every earlier step succeeds.
    ///
    /// # Errors
    ///
    /// Returns the first scan, generation or write failure.
    pub fn run(&self, invocation: &str) -> Result<GenerateOutcome> {
        let output = self.output_path();
        let package = match self.single_dir() {
            Some(dir) => Package::parse_dir(&dir, Some(&output))?,
            None => Package::parse_files(&self.input_list(), Some(&output))?,
        };

        let unit = Generator::new(&package)
            .with_runtime_path(&self.runtime_path)?
            .with_invocation(invocation)
            .generate(&self.types)?;
        unit.write_to(&output)?;

        info!(
            output = %output.display(),
            types = unit.types.len(),
            formatted = unit.formatted,
            "Wrote generated code"
        );
        Ok(GenerateOutcome { output, unit })
    }
}
