//! desi-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) and `DESI_*`
//! environment variables, loads the KB from the configured store, and serves
//! the chat API over HTTP.
//!
//! # Admin key hash generation
//!
//! To generate the argon2 PHC string for `admin_key_hash` in config.toml:
//!
//! ```
//! cargo run -p desi-server --bin server -- --hash-key
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use desi_core::KbStore;
use desi_server::{AppState, ServerConfig, StoreBackend, state::KbState};
use desi_store_file::JsonFileStore;
use desi_store_sqlite::SqliteStore;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Desi Food support chatbot server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for an admin key entered on stdin and exit.
  #[arg(long)]
  hash_key: bool,
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

  if cli.hash_key {
    let key = read_key()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(key.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("DESI")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("allowed_origins"),
    )
    .build()
    .context("failed to read config file")?;

  let mut server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  server_cfg.store_path = expand_tilde(&server_cfg.store_path);

  if server_cfg.admin_key_hash.is_none() {
    tracing::warn!("admin_key_hash is not set; kb/add and kb/import will reject every request");
  }

  match server_cfg.store_backend {
    StoreBackend::File => {
      let store = JsonFileStore::new(&server_cfg.store_path);
      serve(store, server_cfg).await
    }
    StoreBackend::Sqlite => {
      let store = SqliteStore::open(&server_cfg.store_path)
        .await
        .with_context(|| format!("failed to open store at {:?}", server_cfg.store_path))?;
      serve(store, server_cfg).await
    }
  }
}

async fn serve<S>(store: S, server_cfg: ServerConfig) -> anyhow::Result<()>
where
  S: KbStore + Clone + Send + Sync + 'static,
{
  tracing::info!(
    backend = ?server_cfg.store_backend,
    path = %server_cfg.store_path.display(),
    "loading kb"
  );
  let kb = KbState::load(store).await;

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let app = desi_server::router(AppState::new(kb, server_cfg));

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read the admin key from stdin.
fn read_key() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Admin key: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
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
