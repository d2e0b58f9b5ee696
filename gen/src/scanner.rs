//! Source loading and struct discovery.
//!
//! A [`Package`] is the set of Rust files that make up one module scope:
//! either every `*.rs` file directly inside a directory, or an explicit list
//! of files from a single directory. It is built once per generation run and
//! dropped with it; nothing is cached between runs.
//!
//! [`Package::scan`] walks the declared items of every file and returns one
//! [`TypeDescriptor`] per struct that has at least one persisted field.
//! Inline `mod` blocks are searched too; function bodies are not, since a
//! type declared there cannot be named from the generated code.
//!
//! Type paths are relative to the module that includes the generated file.
//! A single input file is that module itself. For a directory or a list of
//! several files the including module is the directory's `lib.rs`,
//! `main.rs` or `mod.rs`, and every other file `foo.rs` is the child module
//! `foo`, so its types are addressed as `foo::Type`.

use std::fs;
use std::path::{Path, PathBuf};

use syn::ext::IdentExt;
use syn::visit::{self, Visit};
use syn::{Block, Fields, Ident, ItemMod, ItemStruct, LitStr};
use tracing::{debug, warn};

use crate::descriptor::{FieldInfo, TypeDescriptor};
use crate::error::{GenError, Result};
use crate::tag::FieldTag;

/// First-line prefix of every file the generator writes.
pub const GENERATED_BANNER: &str = "// generated by 'dbgen";

/// Name of the field attribute that carries a tag string.
pub const TAG_ATTRIBUTE: &str = "db";

/// File stems that name the directory's own module rather than a child.
const ROOT_MODULE_STEMS: [&str; 3] = ["lib", "main", "mod"];

/// One parsed source file.
pub struct SourceFile {
    pub path: PathBuf,
    pub ast: syn::File,
    /// Child module this file forms under the including module, if any.
    pub module: Option<String>,
}

impl SourceFile {
    /// Module path prefix for types declared in this file.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::InvalidModuleName`] when the file is a child
    /// module whose stem is not a Rust identifier.
    pub fn module_prefix(&self) -> Result<Vec<Ident>> {
        let Some(stem) = &self.module else {
            return Ok(Vec::new());
        };
        syn::parse_str::<Ident>(stem)
            .or_else(|_| syn::parse_str::<Ident>(&format!("r#{stem}")))
            .map(|ident| vec![ident])
            .map_err(|_| GenError::InvalidModuleName(self.path.clone()))
    }
}

/// The parsed module being scanned.
pub struct Package {
    /// Module name used in the generated banner.
    pub name: String,
    pub dir: PathBuf,
    pub files: Vec<SourceFile>,
}

impl Package {
    /// Parses every `*.rs` file directly inside `dir`, in file-name order.
    ///
    /// `exclude` names the output destination so that a previous run's
    /// output is never scanned.
    ///
    /// # Errors
    ///
    /// Fails when the directory cannot be read, a file does not parse, or no
    /// source files remain.
    pub fn parse_dir(dir: &Path, exclude: Option<&Path>) -> Result<Self> {
        let entries = fs::read_dir(dir).map_err(|source| GenError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| GenError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() && is_rust_source(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let name = module_name_for_dir(dir);
        Self::load(name, dir.to_path_buf(), &paths, exclude, true)
    }

    /// Parses an explicit list of files, which must share one directory.
    ///
    /// Files without an `.rs` extension are ignored. A single file is the
    /// including module; several files are laid out like a directory.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::MixedModules`] when the files live in different
    /// directories, plus the failures of [`Package::parse_dir`].
    pub fn parse_files(paths: &[PathBuf], exclude: Option<&Path>) -> Result<Self> {
        let sources: Vec<PathBuf> = paths
            .iter()
            .filter(|path| is_rust_source(path))
            .cloned()
            .collect();
        let Some(first) = sources.first() else {
            return Err(GenError::NoSourceFiles(
                paths.first().cloned().unwrap_or_else(|| PathBuf::from(".")),
            ));
        };

        let dir = parent_dir(first);
        let canonical_dir = fs::canonicalize(&dir).unwrap_or_else(|_| dir.clone());
        for other in &sources[1..] {
            let other_dir = parent_dir(other);
            let canonical_other = fs::canonicalize(&other_dir).unwrap_or(other_dir);
            if canonical_other != canonical_dir {
                return Err(GenError::MixedModules {
                    first: first.clone(),
                    other: other.clone(),
                });
            }
        }

        let name = first
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| module_name_for_dir(&dir));
        let file_modules = sources.len() > 1;
        Self::load(name, dir, &sources, exclude, file_modules)
    }

    /// Builds a package from in-memory sources instead of files on disk.
    ///
    /// Module layout follows [`Package::parse_files`].
    ///
    /// # Errors
    ///
    /// Returns [`GenError::Parse`] when a source does not parse.
    pub fn from_sources(name: &str, sources: &[(&str, &str)]) -> Result<Self> {
        let file_modules = sources.len() > 1;
        let mut files = Vec::with_capacity(sources.len());
        for (path, text) in sources {
            if text.starts_with(GENERATED_BANNER) {
                continue;
            }
            files.push(parse_source(Path::new(path), text, file_modules)?);
        }
        Ok(Self {
            name: name.to_string(),
            dir: PathBuf::from("."),
            files,
        })
    }

    fn load(
        name: String,
        dir: PathBuf,
        paths: &[PathBuf],
        exclude: Option<&Path>,
        file_modules: bool,
    ) -> Result<Self> {
        let excluded = exclude.and_then(|path| fs::canonicalize(path).ok());

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            if excluded.is_some() && fs::canonicalize(path).ok() == excluded {
                debug!(file = %path.display(), "Skipping output destination");
                continue;
            }
            let text = fs::read_to_string(path).map_err(|source| GenError::Io {
                path: path.clone(),
                source,
            })?;
            if text.starts_with(GENERATED_BANNER) {
                debug!(file = %path.display(), "Skipping previously generated file");
                continue;
            }
            files.push(parse_source(path, &text, file_modules)?);
        }

        if files.is_empty() {
            return Err(GenError::NoSourceFiles(dir));
        }
        Ok(Self { name, dir, files })
    }

    /// Collects descriptors for persistable structs, in file then
    /// declaration order.
    ///
    /// With `find_name` set, only structs with that name are considered.
    ///
    /// # Errors
    ///
    /// Propagates attribute and aggregation errors for matched structs.
    pub fn scan(&self, find_name: Option<&str>) -> Result<Vec<TypeDescriptor>> {
        let mut found = Vec::new();
        for file in &self.files {
            debug!(file = %file.path.display(), "Scanning source file");
            let mut visitor = StructVisitor {
                find_name,
                module_path: Vec::new(),
                found: Vec::new(),
                error: None,
            };
            visitor.visit_file(&file.ast);
            if let Some(err) = visitor.error {
                return Err(err);
            }
            if visitor.found.is_empty() {
                continue;
            }
            let prefix = file.module_prefix()?;
            found.extend(visitor.found.into_iter().map(|desc| {
                let mut module_path = prefix.clone();
                module_path.extend(desc.module_path.iter().cloned());
                desc.with_module_path(module_path)
            }));
        }
        Ok(found)
    }
}

fn parse_source(path: &Path, text: &str, file_modules: bool) -> Result<SourceFile> {
    let ast = syn::parse_file(text).map_err(|source| GenError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let module = if file_modules {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !ROOT_MODULE_STEMS.contains(&stem.as_str()))
    } else {
        None
    };
    Ok(SourceFile {
        path: path.to_path_buf(),
        ast,
        module,
    })
}

fn is_rust_source(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "rs")
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn module_name_for_dir(dir: &Path) -> String {
    fs::canonicalize(dir)
        .ok()
        .as_deref()
        .unwrap_or(dir)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "crate".to_string())
}

struct StructVisitor<'a> {
    find_name: Option<&'a str>,
    module_path: Vec<Ident>,
    found: Vec<TypeDescriptor>,
    error: Option<GenError>,
}

impl<'ast> Visit<'ast> for StructVisitor<'_> {
    fn visit_item_mod(&mut self, node: &'ast ItemMod) {
        // `mod foo;` declarations point at files outside this scan.
        if node.content.is_none() {
            return;
        }
        self.module_path.push(node.ident.clone());
        visit::visit_item_mod(self, node);
        self.module_path.pop();
    }

    fn visit_block(&mut self, _node: &'ast Block) {}

    fn visit_item_struct(&mut self, node: &'ast ItemStruct) {
        if self.error.is_some() {
            return;
        }
        let name = node.ident.unraw().to_string();
        if self.find_name.is_some_and(|wanted| wanted != name) {
            return;
        }

        match describe_struct(node) {
            Ok(Some(desc)) => {
                debug!(type_name = %name, table = %desc.table, "Found persistable type");
                self.found
                    .push(desc.with_module_path(self.module_path.clone()));
            }
            Ok(None) => {}
            Err(err) => self.error = Some(err),
        }
    }
}

/// Builds the descriptor for one struct declaration.
///
/// Returns `None` for tuple, unit and generic structs and for structs with
/// no `sql` tags.
///
/// # Errors
///
/// Returns [`GenError::InvalidAttribute`] for a `db` attribute that is not a
/// single string literal, and the aggregation errors of
/// [`TypeDescriptor::from_fields`].
pub fn describe_struct(node: &ItemStruct) -> Result<Option<TypeDescriptor>> {
    let Fields::Named(named) = &node.fields else {
        return Ok(None);
    };
    let name = node.ident.unraw().to_string();
    let name = name.as_str();

    let mut fields = Vec::with_capacity(named.named.len());
    for field in &named.named {
        let Some(ident) = &field.ident else {
            continue;
        };
        let tag = field_tag(name, ident, &field.attrs)?;
        fields.push(FieldInfo::new(ident.clone(), FieldTag::parse(&tag)));
    }

    let descriptor = TypeDescriptor::from_fields(&node.ident, &fields)?;
    if descriptor.is_some() && !node.generics.params.is_empty() {
        warn!(type_name = %name, "Skipping generic struct; generated impls cannot name its parameters");
        return Ok(None);
    }
    Ok(descriptor)
}

/// Joins the literals of every `#[db("...")]` attribute on a field.
fn field_tag(type_name: &str, ident: &syn::Ident, attrs: &[syn::Attribute]) -> Result<String> {
    let mut parts = Vec::new();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident(TAG_ATTRIBUTE)) {
        let literal = attr
            .parse_args::<LitStr>()
            .map_err(|err| GenError::InvalidAttribute {
                type_name: type_name.to_string(),
                field: ident.unraw().to_string(),
                message: err.to_string(),
            })?;
        parts.push(literal.value());
    }
    Ok(parts.join(" "))
}
