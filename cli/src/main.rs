use std::path::PathBuf;

use clap::Parser;
use dbobj_gen::{GenConfig, parse_type_list};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "dbgen", version)]
#[command(about = "Generate dbobj::DbObject implementations from #[db] struct tags")]
struct Cli {
    /// Comma-separated type names (default: every struct with sql tags).
    #[arg(long = "type", value_name = "TYPES")]
    types: Option<String>,
    /// Output file (default: db_generated.rs next to the sources, or
    /// db_generated_<type>.rs when --type is given).
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// YAML configuration file; command-line flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Path the generated code uses to reach the runtime crate.
    #[arg(long, value_name = "PATH")]
    runtime_path: Option<String>,
    /// Log debug output to stderr.
    #[arg(short, long)]
    verbose: bool,
    /// One directory, or source files from a single directory (default: .).
    inputs: Vec<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let invocation = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if let Err(err) = run(cli, &invocation) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli, invocation: &str) -> Result<(), String> {
    let config = resolve_config(cli)?;
    debug!(?config, "Resolved configuration");
    config.run(invocation).map_err(|err| err.to_string())?;
    Ok(())
}

/// Loads the optional config file, then applies flags on top of it.
fn resolve_config(cli: Cli) -> Result<GenConfig, String> {
    let mut config = match &cli.config {
        Some(path) => GenConfig::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?,
        None => GenConfig::default(),
    };

    if let Some(types) = cli.types {
        config.types = parse_type_list(&types);
    }
    if let Some(output) = cli.output {
        config.output = Some(output);
    }
    if let Some(runtime_path) = cli.runtime_path {
        config.runtime_path = runtime_path;
    }
    if !cli.inputs.is_empty() {
        config.inputs = cli.inputs;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_without_config() {
        let cli = Cli::try_parse_from([
            "dbgen",
            "--type",
            "User, Role",
            "-o",
            "out.rs",
            "src/models.rs",
        ])
        .unwrap();
        let config = resolve_config(cli).unwrap();
        assert_eq!(config.types, ["User", "Role"]);
        assert_eq!(config.output, Some(PathBuf::from("out.rs")));
        assert_eq!(config.inputs, [PathBuf::from("src/models.rs")]);
        assert_eq!(config.runtime_path, "::dbobj");
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dbgen.yaml");
        std::fs::write(
            &path,
            "inputs: [models]\ntypes: [User]\noutput: a.rs\nruntime_path: crate::orm\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "dbgen",
            "--config",
            path.to_str().unwrap(),
            "--output",
            "b.rs",
        ])
        .unwrap();
        let config = resolve_config(cli).unwrap();
        assert_eq!(config.types, ["User"]);
        assert_eq!(config.inputs, [PathBuf::from("models")]);
        assert_eq!(config.output, Some(PathBuf::from("b.rs")));
        assert_eq!(config.runtime_path, "crate::orm");
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let cli = Cli::try_parse_from(["dbgen", "--config", "/nonexistent/dbgen.yaml"]).unwrap();
        let err = resolve_config(cli).unwrap_err();
        assert!(err.contains("Failed to load config"));
    }
}
