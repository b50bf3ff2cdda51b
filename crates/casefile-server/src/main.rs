//! casefile server binary.
//!
//! Reads `casefile.toml` (or the path given with `--config`), opens the
//! SQLite case store, and serves the investigation API over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for an `[[investigators]]` entry:
//!
//! ```text
//! cargo run -p casefile-server --bin server -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use casefile_lifecycle::CaseController;
use casefile_server::{
  ServerConfig,
  remote::{HttpAnalysisService, HttpCollector},
};
use casefile_store_sqlite::SqliteStore;
use clap::Parser;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "casefile investigation server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "casefile.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let password = read_password()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("CASEFILE"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  if server_cfg.investigators.is_empty() {
    tracing::warn!("no investigators configured; every request will be rejected");
  }

  let controller_cfg = server_cfg
    .controller_config()
    .context("invalid risk_weights")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let client = reqwest::Client::builder()
    .user_agent(concat!("casefile/", env!("CARGO_PKG_VERSION")))
    .build()
    .context("failed to build HTTP client")?;

  let controller = CaseController::new(
    store,
    HttpCollector::new(client.clone(), &server_cfg.collector_url),
    HttpAnalysisService::new(client, &server_cfg.analysis_url),
    controller_cfg,
  );

  let app = casefile_server::router(
    Arc::new(controller),
    Arc::new(server_cfg.investigators.clone()),
  );
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password line from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_owned())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
