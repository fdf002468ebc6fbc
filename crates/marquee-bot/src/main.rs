//! marquee bot binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `MARQUEE_*` environment variables, opens the SQLite ratings store and
//! connects to Discord.
//!
//! ```toml
//! discord_token = "..."
//! guild_id      = 184563986342215680   # optional; global commands if unset
//! store_path    = "~/.local/share/marquee/marquee.db"
//!
//! [catalog]
//! api_key = "..."
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use marquee_bot::{App, BotConfig, discord::Handler};
use marquee_catalog::OmdbClient;
use marquee_store_sqlite::SqliteStore;
use serenity::{Client, prelude::GatewayIntents};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Marquee movie-rating Discord bot")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("MARQUEE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .context("failed to read config file")?;

  let mut bot_cfg: BotConfig = settings
    .try_deserialize()
    .context("failed to deserialise BotConfig")?;
  bot_cfg.store_path = expand_tilde(&bot_cfg.store_path);

  // The store is required for every command, so a broken one stops startup.
  let store = SqliteStore::open(&bot_cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", bot_cfg.store_path))?;
  tracing::info!(path = %bot_cfg.store_path.display(), "opened ratings store");

  let catalog = OmdbClient::new(bot_cfg.catalog.clone()).context("failed to build catalog client")?;

  let token = bot_cfg.discord_token.clone();
  let app = Arc::new(App { store, catalog, config: Arc::new(bot_cfg) });

  let mut client = Client::builder(&token, GatewayIntents::GUILDS)
    .event_handler(Handler::new(app))
    .await
    .context("failed to build Discord client")?;

  client.start().await.context("Discord client error")?;

  Ok(())
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
