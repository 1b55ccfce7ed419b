//! `santa` server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! event store (SQLite when `store_path` is set, memory otherwise), and serves
//! the JSON API over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `admin_password_hash`:
//!
//! ```
//! cargo run -p santa-server -- --hash-password
//! ```

mod notifier;
mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use rand_core::OsRng;
use santa_api::{AppState, AuthConfig};
use santa_core::{SecretSanta, memory::MemoryStore, store::SantaStore};
use santa_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use notifier::LogNotifier;
use settings::{ServerConfig, expand_tilde};

#[derive(Parser)]
#[command(author, version, about = "Secret Santa assignment server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
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

  let server_cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  match &server_cfg.store_path {
    Some(path) => {
      let store_path = expand_tilde(path);
      let store = SqliteStore::open(&store_path)
        .await
        .with_context(|| format!("failed to open store at {store_path:?}"))?;
      tracing::info!(path = ?store_path, "using SQLite store");
      serve(store, server_cfg).await
    }
    None => {
      tracing::warn!("no store_path configured; participants will not survive a restart");
      serve(MemoryStore::new(), server_cfg).await
    }
  }
}

async fn serve<S: SantaStore + 'static>(store: S, server_cfg: ServerConfig) -> anyhow::Result<()> {
  let state = AppState {
    santa:    Arc::new(SecretSanta::new(store, server_cfg.policy.clone())),
    auth:     Arc::new(AuthConfig {
      username:      server_cfg.admin_username.clone(),
      password_hash: server_cfg.admin_password_hash.clone(),
    }),
    notifier: Arc::new(LogNotifier),
  };

  let app = santa_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}
