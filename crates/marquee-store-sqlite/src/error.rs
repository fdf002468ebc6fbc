//! Error type for `marquee-store-sqlite`.

use marquee_core::movie::{GuildId, MovieId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] marquee_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A rating was submitted for a movie the guild never registered.
  #[error("movie {movie_id} is not registered in guild {guild_id}")]
  MovieNotRegistered { guild_id: GuildId, movie_id: MovieId },

  /// The file was written by a newer build with a schema we don't know.
  #[error("schema version {found} is newer than the supported version {supported}")]
  UnsupportedSchemaVersion { found: i64, supported: i64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
