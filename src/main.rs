use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use accountmock::config::Config;
use accountmock::http_api::run_server;
use accountmock::store::AccountStore;

#[derive(Parser)]
#[command(name = "accountmock")]
#[command(about = "Serve a mock account directory over HTTP for integration testing")]
#[command(version)]
struct Cli {
    /// Host to bind to [default: 0.0.0.0]
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port to listen on [default: 8080]
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to the JSON fixture served to clients [default: response.json]
    #[arg(short, long)]
    fixture: Option<PathBuf>,

    /// Path to an accountmock.toml config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => Config::from_file(&path)?,
        None => Config::default(),
    };

    // Explicit flags win over the config file, which wins over defaults.
    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let fixture = cli.fixture.unwrap_or(config.fixture.path);

    let store = Arc::new(AccountStore::new(fixture));
    store.warm().await;

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    println!(
        "accountmock serving {} on http://{}",
        store.fixture_path().display(),
        addr
    );

    run_server(listener, store).await
}
