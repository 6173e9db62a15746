//! recipebuilder - Run-Spec Builder CLI
//!
//! Reads a desire-app request as JSON and prints the resulting run-spec.
//!
//! ## Usage
//!
//! ```sh
//! recipebuilder build --config recipebuilder.yml --request desire.json
//! recipebuilder build --config recipebuilder.yml < desire.json
//! recipebuilder ports --request desire.json
//! recipebuilder normalize myregistry.com:5000/foo/bar:1.0
//! ```
//!
//! Logs go to stderr (filter with `RUST_LOG`); stdout carries only JSON.

use clap::{Parser, Subcommand};
use recipebuilder::{normalize_image_reference, Config, DesireRequest, RecipeBuilder};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

// =============================================================================
// Exit Codes
// =============================================================================

const EXIT_BUILD_FAILED: u8 = 1;
const EXIT_USAGE: u8 = 2;

// =============================================================================
// CLI Parsing
// =============================================================================

#[derive(Debug, Parser)]
#[command(name = "recipebuilder", version, about = "Build container run-specs from desire requests")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build a run-spec and print it as JSON.
    Build {
        /// Builder configuration (YAML or JSON).
        #[arg(long, short)]
        config: PathBuf,
        /// Desire request (JSON). Reads stdin when omitted.
        #[arg(long, short)]
        request: Option<PathBuf>,
    },
    /// Print the ports a request's image exposes.
    Ports {
        #[arg(long, short)]
        request: Option<PathBuf>,
    },
    /// Print the canonical URI of an image reference.
    Normalize { image: String },
}

/// Failure of a command, mapped to an exit code.
enum Failure {
    Usage(String),
    Build(recipebuilder::Error),
}

impl From<recipebuilder::Error> for Failure {
    fn from(err: recipebuilder::Error) -> Self {
        Self::Build(err)
    }
}

// =============================================================================
// Commands
// =============================================================================

fn read_request(path: Option<&Path>) -> Result<DesireRequest, Failure> {
    let body = match path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| Failure::Usage(format!("cannot read {}: {}", path.display(), e)))?,
        None => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .map_err(|e| Failure::Usage(format!("cannot read stdin: {}", e)))?;
            body
        }
    };
    serde_json::from_str(&body).map_err(|e| Failure::Usage(format!("invalid request: {}", e)))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Failure> {
    let json = serde_json::to_string_pretty(value).map_err(recipebuilder::Error::from)?;
    println!("{}", json);
    Ok(())
}

fn cmd_build(config: &Path, request: Option<&Path>) -> Result<(), Failure> {
    let config = Config::from_file(config).map_err(|e| Failure::Usage(e.to_string()))?;
    let request = read_request(request)?;
    let run_spec = RecipeBuilder::new(config).build(&request)?;
    print_json(&run_spec)
}

fn cmd_ports(request: Option<&Path>) -> Result<(), Failure> {
    let request = read_request(request)?;
    let metadata = recipebuilder::ExecutionMetadata::parse(&request.execution_metadata)?;
    let ports = recipebuilder::extract_exposed_ports(&metadata)?;
    print_json(&ports)
}

fn cmd_normalize(image: &str) -> Result<(), Failure> {
    println!("{}", normalize_image_reference(image)?);
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match &cli.command {
        Command::Build { config, request } => cmd_build(config, request.as_deref()),
        Command::Ports { request } => cmd_ports(request.as_deref()),
        Command::Normalize { image } => cmd_normalize(image),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(Failure::Usage(msg)) => {
            eprintln!("error: {}", msg);
            ExitCode::from(EXIT_USAGE)
        }
        Err(Failure::Build(e)) => {
            eprintln!("error: {}", e);
            ExitCode::from(EXIT_BUILD_FAILED)
        }
    }
}
