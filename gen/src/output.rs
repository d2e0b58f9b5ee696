//! Assembles the generated unit for one run.
//!
//! The unit is a banner, a fixed import line, and one impl block per
//! descriptor in request order (explicit type list) or discovery order (file
//! then declaration order). The code part is normalized once with
//! `prettyplease`; if the text does not parse, the raw text is kept and a
//! warning is logged instead of failing the run.

use std::fs;
use std::path::{Path, PathBuf};

use proc_macro2::TokenStream;
use quote::quote;
use tracing::{debug, warn};

use crate::error::{GenError, Result};
use crate::scanner::{GENERATED_BANNER, Package};
use crate::synth;

/// Runtime crate path used when none is configured.
pub const DEFAULT_RUNTIME_PATH: &str = "::dbobj";

/// Output file name used when no type filter is given.
pub const DEFAULT_OUTPUT_NAME: &str = "db_generated.rs";

/// Full generated output of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUnit {
    pub source: String,
    /// False when normalization failed and `source` holds raw text.
    pub formatted: bool,
    /// Qualified names of the types that produced a block, in output order.
    pub types: Vec<String>,
}

impl GeneratedUnit {
    /// Writes the unit to `path`, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::Io`] if the file cannot be written.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, &self.source).map_err(|source| GenError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Buffers generated code for one package.
pub struct Generator<'a> {
    package: &'a Package,
    runtime: syn::Path,
    invocation: String,
}

impl<'a> Generator<'a> {
    pub fn new(package: &'a Package) -> Self {
        Self {
            package,
            runtime: syn::parse_quote!(::dbobj),
            invocation: String::new(),
        }
    }

    /// Sets the path generated code uses to reach the runtime crate.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::InvalidRuntimePath`] if `path` is not a Rust path.
    pub fn with_runtime_path(mut self, path: &str) -> Result<Self> {
        self.runtime = syn::parse_str(path)
            .map_err(|_| GenError::InvalidRuntimePath(path.to_string()))?;
        Ok(self)
    }

    /// Sets the argument text recorded in the banner.
    pub fn with_invocation(mut self, args: impl Into<String>) -> Self {
        self.invocation = args.into();
        self
    }

    /// Generates the unit for the requested types, or for every persistable
    /// struct when `type_names` is empty.
    ///
    /// Requested names that match nothing are reported with a warning and
    /// otherwise ignored.
    ///
    /// # Errors
    ///
    /// Propagates scan and aggregation errors; no partial unit is returned.
    pub fn generate(&self, type_names: &[String]) -> Result<GeneratedUnit> {
        let names = normalize_type_names(type_names);

        let descriptors = if names.is_empty() {
            self.package.scan(None)?
        } else {
            let mut found = Vec::new();
            for name in &names {
                let matches = self.package.scan(Some(name))?;
                if matches.is_empty() {
                    warn!(type_name = %name, "Requested type not found or has no sql fields");
                }
                found.extend(matches);
            }
            found
        };

        let runtime = &self.runtime;
        let mut body: TokenStream = quote! {
            #[allow(unused_imports)]
            use #runtime::{Column as _, DbObject as _};
        };
        let mut types = Vec::with_capacity(descriptors.len());
        for desc in &descriptors {
            debug!(type_name = %desc.qualified_name(), "Rendering DbObject impl");
            body.extend(synth::render(desc, runtime));
            types.push(desc.qualified_name());
        }

        let (code, formatted) = normalize(&body.to_string());
        let mut source = self.banner();
        source.push_str(&code);
        if !source.ends_with('\n') {
            source.push('\n');
        }

        Ok(GeneratedUnit {
            source,
            formatted,
            types,
        })
    }

    fn banner(&self) -> String {
        let args = if self.invocation.is_empty() {
            String::new()
        } else {
            format!(" {}", single_line(&self.invocation))
        };
        format!(
            "{GENERATED_BANNER}{args}'; DO NOT EDIT\n// module: {}\n\n",
            single_line(&self.package.name)
        )
    }
}

/// Keeps banner text inside its line comment.
fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

/// Pretty-prints generated code, falling back to the raw text.
fn normalize(raw: &str) -> (String, bool) {
    match syn::parse_file(raw) {
        Ok(file) => (prettyplease::unparse(&file), true),
        Err(err) => {
            warn!(error = %err, "Internal error: invalid Rust generated; writing unformatted output");
            warn!("Compile the including crate to analyze the error");
            (raw.to_string(), false)
        }
    }
}

/// Splits a comma-separated type list, trimming entries and dropping
/// empties and repeats.
pub fn parse_type_list(list: &str) -> Vec<String> {
    normalize_type_names(&list.split(',').map(str::to_string).collect::<Vec<_>>())
}

fn normalize_type_names(names: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim();
        if !name.is_empty() && !out.iter().any(|seen| seen == name) {
            out.push(name.to_string());
        }
    }
    out
}

/// Output path used when none is configured.
///
/// `db_generated.rs` in `dir`, or `db_generated_<first type>.rs` when a type
/// filter is present.
pub fn default_output_path(dir: &Path, type_names: &[String]) -> PathBuf {
    let file_name = match normalize_type_names(type_names).first() {
        Some(first) => format!("db_generated_{}.rs", first.to_lowercase()),
        None => DEFAULT_OUTPUT_NAME.to_string(),
    };
    dir.join(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODELS: &str = r##"
        #[derive(Default)]
        pub struct User {
            #[db(r#"sql:"id" key:"true" table:"users""#)]
            pub id: i64,
            #[db(r#"sql:"name""#)]
            pub name: String,
        }

        #[derive(Default)]
        pub struct Role {
            #[db(r#"sql:"id" key:"true" table:"roles""#)]
            pub id: i64,
        }
    "##;

    fn package() -> Package {
        Package::from_sources("models", &[("models.rs", MODELS)]).unwrap()
    }

    #[test]
    fn test_banner_and_imports() {
        let pkg = package();
        let unit = Generator::new(&pkg)
            .with_invocation("--type User")
            .generate(&[])
            .unwrap();
        assert!(unit.formatted);
        assert!(unit
            .source
            .starts_with("// generated by 'dbgen --type User'; DO NOT EDIT\n// module: models\n"));
        assert!(unit.source.contains("use ::dbobj::{Column as _, DbObject as _};"));
        assert_eq!(unit.types, ["User", "Role"]);
    }

    #[test]
    fn test_line_breaks_in_invocation_stay_in_the_banner() {
        let pkg = package();
        let unit = Generator::new(&pkg)
            .with_invocation("--type User\nfn broken(")
            .generate(&[])
            .unwrap();
        assert!(unit.formatted);
        assert!(unit
            .source
            .starts_with("// generated by 'dbgen --type User fn broken('; DO NOT EDIT\n// module: models\n\n"));
        assert!(syn::parse_file(&unit.source).is_ok());
    }

    #[test]
    fn test_raw_module_path_in_generated_impl() {
        let source = r##"
            mod r#type {
                #[derive(Default)]
                pub struct Row {
                    #[db(r#"sql:"id" key:"true" table:"rows""#)]
                    pub id: i64,
                }
            }
        "##;
        let pkg = Package::from_sources("m", &[("m.rs", source)]).unwrap();
        let unit = Generator::new(&pkg).generate(&[]).unwrap();
        assert!(unit.formatted);
        assert!(unit.source.contains("impl ::dbobj::DbObject for r#type::Row"));
        assert_eq!(unit.types, ["type::Row"]);
    }

    #[test]
    fn test_request_order_is_kept() {
        let pkg = package();
        let unit = Generator::new(&pkg)
            .generate(&["Role".to_string(), "User".to_string(), "Role".to_string()])
            .unwrap();
        assert_eq!(unit.types, ["Role", "User"]);
        let role_at = unit.source.find("for Role").unwrap();
        let user_at = unit.source.find("for User").unwrap();
        assert!(role_at < user_at);
    }

    #[test]
    fn test_unknown_type_is_not_an_error() {
        let pkg = package();
        let unit = Generator::new(&pkg).generate(&["Ghost".to_string()]).unwrap();
        assert!(unit.types.is_empty());
        assert!(!unit.source.contains("impl"));
    }

    #[test]
    fn test_custom_runtime_path() {
        let pkg = package();
        let unit = Generator::new(&pkg)
            .with_runtime_path("crate::orm")
            .unwrap()
            .generate(&[])
            .unwrap();
        assert!(unit.source.contains("impl crate::orm::DbObject for User"));
        assert!(matches!(
            Generator::new(&pkg).with_runtime_path("not a path"),
            Err(GenError::InvalidRuntimePath(_))
        ));
    }

    #[test]
    fn test_normalize_falls_back_to_raw_text() {
        let (code, formatted) = normalize("impl for {");
        assert!(!formatted);
        assert_eq!(code, "impl for {");
    }

    #[test]
    fn test_parse_type_list() {
        assert_eq!(parse_type_list(" User, ,Role,User "), ["User", "Role"]);
        assert!(parse_type_list("").is_empty());
    }

    #[test]
    fn test_default_output_path() {
        let dir = Path::new("src");
        assert_eq!(default_output_path(dir, &[]), dir.join("db_generated.rs"));
        assert_eq!(
            default_output_path(dir, &["UserRole".to_string()]),
            dir.join("db_generated_userrole.rs")
        );
    }
}
