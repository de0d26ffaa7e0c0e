//! Sopwright - streamed SOP authoring
//!
//! `serve` runs the HTTP surface; `render`, `validate` and `parse` work on
//! local files without an upstream model.

mod server;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;

use sopwright_core::ai::UpstreamClient;
use sopwright_core::document::parse;
use sopwright_core::store::ArtifactStore;
use sopwright_core::synthesis::{extract_title, validate};
use sopwright_core::{Config, Orchestrator};

use server::AppState;

#[derive(Parser)]
#[command(name = "sopwright")]
#[command(about = "Turn model output into structured SOP documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory rendered documents are written to
        #[arg(long)]
        storage_dir: Option<PathBuf>,
    },
    /// Validate, render and store a local markdown file
    Render {
        file: PathBuf,

        /// Document title (defaults to one taken from the text)
        #[arg(short, long)]
        title: Option<String>,

        /// Output directory (defaults to the storage directory)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
    /// Print the structural validation result for a local file as JSON
    Validate { file: PathBuf },
    /// Print the parsed block sequence of a local file as JSON
    Parse { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, storage_dir } => {
            let config = Config {
                port: port.unwrap_or(config.port),
                storage_dir: storage_dir.unwrap_or(config.storage_dir),
                ..config
            };
            run_server(config).await?;
        }
        Commands::Render {
            file,
            title,
            out_dir,
        } => {
            let dir = out_dir.unwrap_or(config.storage_dir);
            render_file(&file, title, dir).await?;
        }
        Commands::Validate { file } => {
            let text = read_text(&file).await?;
            let result = validate(&text).context("Nothing to validate")?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Parse { file } => {
            let text = read_text(&file).await?;
            println!("{}", serde_json::to_string_pretty(&parse(&text))?);
        }
    }

    Ok(())
}

async fn run_server(config: Config) -> Result<()> {
    info!(
        port = config.port,
        bind = %config.bind_address,
        model = %config.model,
        "Starting Sopwright server"
    );
    if config.api_key.is_none() {
        tracing::warn!("OPENROUTER_API_KEY is not set; upstream requests will be unauthenticated");
    }

    let client = UpstreamClient::new(config.client_config()).context("Failed to build upstream client")?;
    let orchestrator = Orchestrator::new(ArtifactStore::new(&config.storage_dir))
        .with_heartbeat_period(config.heartbeat_period());
    info!(dir = %orchestrator.store().dir().display(), "Artifact store ready");

    let app = server::build_router(AppState::new(orchestrator, client));
    let addr = format!("{}:{}", config.bind_address, config.port);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn render_file(file: &Path, title: Option<String>, out_dir: PathBuf) -> Result<()> {
    let text = read_text(file).await?;
    let result = validate(&text).context("Nothing to render")?;
    if !result.is_valid {
        eprintln!("Missing required headings, no document produced:");
        println!("{}", serde_json::to_string_pretty(&result)?);
        std::process::exit(1);
    }

    let orchestrator = Orchestrator::new(ArtifactStore::new(out_dir));
    let title = title.unwrap_or_else(|| extract_title(&text));
    let doc = orchestrator
        .publish_as(&text, title)
        .await
        .context("Failed to render document")?;

    let path = orchestrator.store().resolve(&doc.filename)?;
    eprintln!("{}", doc.status());
    println!("{}", path.display());
    Ok(())
}

async fn read_text(file: &Path) -> Result<String> {
    tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))
}
