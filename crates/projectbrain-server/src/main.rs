//! Project Brain CLI
//!
//! Serves the chat and extraction API, or loads PDFs and pre-chunked documents into
//! the store.

use anyhow::Context;
use clap::{Parser, Subcommand};
use projectbrain_server::{config::ServerConfig, import_chunks, ingest_documents, start_server};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Project Brain - chat with and extract tables from construction documents.
#[derive(Debug, Parser)]
#[command(name = "projectbrain")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "PROJECTBRAIN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the HTTP server (default)
    Serve(ServeArgs),

    /// Read every PDF in a directory into the document store, one chunk per page
    Ingest(IngestArgs),

    /// Load a JSON array of chunks into the document store
    Import(ImportArgs),
}

#[derive(Debug, Default, Parser)]
struct ServeArgs {
    /// Override the configured port
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,
}

#[derive(Debug, Parser)]
struct IngestArgs {
    /// Directory holding the PDFs
    #[arg(default_value = "docs")]
    dir: PathBuf,

    /// Remove existing chunks first
    #[arg(long)]
    replace: bool,
}

#[derive(Debug, Parser)]
struct ImportArgs {
    /// File of `{content, metadata: {filename, page}}` objects
    file: PathBuf,

    /// Remove existing chunks first
    #[arg(long)]
    replace: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => {
            tracing::warn!("No config file specified, using defaults");
            ServerConfig::default()
        }
    };

    match cli.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => {
            if let Some(port) = args.port {
                config.bind_port = port;
            }
            start_server(config).await?;
        }
        Command::Ingest(args) => {
            let report = ingest_documents(&config, &args.dir, args.replace)?;
            println!(
                "Ingested {} pages from {} PDFs into {}",
                report.chunks,
                report.files,
                config.store.database_path.display()
            );
            for (path, reason) in &report.failed {
                eprintln!("Skipped {}: {}", path.display(), reason);
            }
        }
        Command::Import(args) => {
            let added = import_chunks(&config, &args.file, args.replace)?;
            println!("Imported {} chunks into {}", added, config.store.database_path.display());
        }
    }

    Ok(())
}
