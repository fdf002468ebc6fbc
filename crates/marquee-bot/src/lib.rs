//! Discord front end for Marquee.
//!
//! Slash commands resolve movies through a [`Catalog`], register them in a
//! [`RatingsStore`] and post rating buttons; button presses record ratings.
//! The command logic in [`commands`] is independent of Discord and produces
//! [`commands::Reply`] values that [`discord`] renders.

pub mod commands;
pub mod controls;
pub mod discord;
pub mod error;
pub mod format;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use marquee_catalog::CatalogConfig;
use marquee_core::{catalog::Catalog, store::{DEFAULT_LEADERBOARD_LIMIT, RatingsStore}};
use serde::Deserialize;

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_store_path() -> PathBuf { PathBuf::from("marquee.db") }

fn default_leaderboard_limit() -> usize { DEFAULT_LEADERBOARD_LIMIT }

/// Runtime bot configuration, deserialised from `config.toml` and
/// `MARQUEE_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct BotConfig {
  pub discord_token:     String,
  /// Register commands for this guild only; globally when unset.
  #[serde(default)]
  pub guild_id:          Option<u64>,
  #[serde(default = "default_store_path")]
  pub store_path:        PathBuf,
  #[serde(default = "default_leaderboard_limit")]
  pub leaderboard_limit: usize,
  #[serde(default)]
  pub catalog:           CatalogConfig,
}

impl BotConfig {
  /// The configured leaderboard size, kept within what one message can list.
  pub fn leaderboard_limit(&self) -> usize {
    self.leaderboard_limit.clamp(1, DEFAULT_LEADERBOARD_LIMIT)
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state handed to every interaction.
pub struct App<S: RatingsStore, C: Catalog> {
  pub store:   S,
  pub catalog: C,
  pub config:  Arc<BotConfig>,
}
