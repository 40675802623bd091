//! lectern: command-line access to a catalogue of endpoints
//!
//! Builds a client from the config file, the environment and a catalogue
//! file, then invokes or lists its operations.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use lectern::version::BuildInfo;
use lectern::{CallOptions, CategoryDescriptor, ClientConfig, Lectern, Params};
use serde_json::Value;

/// Lectern CLI
#[derive(Parser)]
#[command(name = "lectern")]
#[command(version = lectern::PKG_VERSION)]
#[command(about = "Call Canvas-style REST endpoints from a catalogue")]
struct Args {
    /// Config file (default: $LECTERN_CONFIG, then ~/.config/lectern/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API host, overrides config and LECTERN_HOST
    #[arg(long)]
    host: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Invoke an operation and print its JSON result
    Call {
        /// Dotted operation path, e.g. courses.assignments.list
        operation: String,
        /// Parameter as key=value (value parsed as JSON, else taken as a string)
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, Value)>,
        /// Catalogue file (.json or .toml)
        #[arg(long)]
        catalogue: PathBuf,
        /// Print compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// List every operation in a catalogue
    Operations {
        /// Catalogue file (.json or .toml)
        #[arg(long)]
        catalogue: PathBuf,
    },

    /// Print build information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Command::Version => {
            let info = BuildInfo::current();
            println!("lectern {info}");
        }

        Command::Operations { catalogue } => {
            let api = Lectern::builder()
                .config(load_config(args.config.as_deref(), args.host)?)
                .catalogue(load_catalogue(&catalogue)?)
                .build()?;
            let operations = api.operations();
            if operations.is_empty() {
                println!("no operations in catalogue");
            }
            for op in operations {
                let required = if op.required_params.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", op.required_params.join(", "))
                };
                println!("{} {}: {}{required}", op.path, op.method, op.action);
            }
        }

        Command::Call {
            operation,
            params,
            catalogue,
            compact,
        } => {
            let api = Lectern::builder()
                .config(load_config(args.config.as_deref(), args.host)?)
                .catalogue(load_catalogue(&catalogue)?)
                .build()?;
            let params: Params = params.into_iter().collect();
            let result = api.call(&operation, CallOptions::from(params)).await?;
            if compact {
                println!("{result}");
            } else {
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>, host: Option<String>) -> lectern::Result<ClientConfig> {
    let mut config = ClientConfig::load(path)?.with_env();
    if host.is_some() {
        config.host = host;
    }
    Ok(config)
}

fn load_catalogue(path: &Path) -> lectern::Result<CategoryDescriptor> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        lectern::LecternError::Configuration(format!("cannot read {}: {e}", path.display()))
    })?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => CategoryDescriptor::from_toml_str(&raw),
        _ => CategoryDescriptor::from_json_str(&raw),
    }
}

fn parse_param(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty parameter name in '{raw}'"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
