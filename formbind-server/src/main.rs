//! formbind command line
//!
//! Serves the mapping API, or maps a single urlencoded form from the
//! command line and prints the resulting JSON.
//!
//! Usage:
//!   formbind serve --schema schema.json --listen 127.0.0.1:8080
//!   formbind map --schema schema.json --type User --allow name,address_city 'name=Ann&address_city=Paris'

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use formbind_mapper::MapOptions;
use formbind_model::SchemaRegistry;
use formbind_server::{build_router, map_form, split_allow, AppState, ServerConfig};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "formbind")]
#[command(about = "Schema-driven form mapping")]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "formbind.toml")]
    config: PathBuf,

    /// Schema document (overrides the config file)
    #[arg(short, long, global = true)]
    schema: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Address to bind (overrides the config file)
        #[arg(short, long)]
        listen: Option<String>,
    },
    /// Map one urlencoded form and print the result
    Map {
        /// Registered type to map into
        #[arg(short = 't', long = "type")]
        type_name: String,

        /// Comma-separated whitelist paths
        #[arg(short, long, default_value = "")]
        allow: String,

        /// Keep existing truthy values instead of replacing them
        #[arg(long)]
        keep_existing: bool,

        /// The urlencoded form body
        input: String,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_registry(path: &Path) -> Result<SchemaRegistry> {
    let registry = SchemaRegistry::from_path(path)
        .with_context(|| format!("failed to load schema from {}", path.display()))?;
    info!(types = registry.len(), "schema loaded from {}", path.display());
    Ok(registry)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = ServerConfig::load(&args.config)?;
    let schema_path = args.schema.unwrap_or_else(|| config.schema_path.clone());
    let registry = load_registry(&schema_path)?;

    match args.command {
        Command::Serve { listen } => {
            let listen = listen.unwrap_or_else(|| config.listen.clone());
            let state = AppState::new(
                registry,
                MapOptions {
                    overwrite: config.overwrite,
                },
            );
            let app = build_router(state);

            let listener = tokio::net::TcpListener::bind(&listen)
                .await
                .with_context(|| format!("failed to bind {listen}"))?;
            info!("formbind API listening on {}", listen);
            axum::serve(listener, app).await.context("HTTP server failed")?;
        }
        Command::Map {
            type_name,
            allow,
            keep_existing,
            input,
        } => {
            let options = MapOptions {
                overwrite: config.overwrite && !keep_existing,
            };
            let allow = split_allow(Some(allow.as_str()));
            let response = map_form(&registry, &type_name, &allow, options, input).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }
    Ok(())
}
