// Catalog Match - Web Server
// Serves catalog reads and /match over HTTP

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use catalog_match::api::{router, AppState};
use catalog_match::logging::{init_logging, LogConfig};
use catalog_match::{Config, SqliteCatalog};

#[derive(Parser)]
#[command(name = "catalog-server", version, about = "HTTP API for the vehicle inspection catalog")]
struct Args {
    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// -v debug, -vv trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&LogConfig::from_verbosity(args.verbose))?;

    let config = Config::load(args.config.as_deref())?;

    // Open once up front so the schema exists before the first request
    let catalog = SqliteCatalog::new(&config.db_path);
    catalog
        .connect()
        .with_context(|| format!("Failed to open database {:?}", config.db_path))?;
    info!(db = %config.db_path.display(), "database opened");

    let app = router(AppState { catalog }, &config.allowed_origins);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!(
        addr = %config.bind_addr,
        origins = ?config.allowed_origins,
        "catalog server listening"
    );

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
