//! Identifiers and movie records.
//!
//! Every record is partitioned by the guild it belongs to. The same catalog
//! movie registered in two guilds yields two independent records, each with
//! its own title/year snapshot.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// A chat-platform guild (community server) snowflake.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GuildId(pub u64);

/// A chat-platform user snowflake.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub u64);

/// The canonical catalog identifier: the numeric part of an IMDb `tt` id.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MovieId(pub u64);

impl MovieId {
  /// The public catalog page for this movie.
  pub fn catalog_url(self) -> String {
    format!("https://www.imdb.com/title/{self}/")
  }
}

/// Renders the IMDb form, `tt` followed by at least seven digits.
impl fmt::Display for MovieId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "tt{:07}", self.0)
  }
}

/// Accepts `tt0111161` as well as the bare number `111161`.
impl FromStr for MovieId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let s = s.trim();
    let digits = s.strip_prefix("tt").unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
      return Err(Error::InvalidMovieId(s.to_owned()));
    }
    digits
      .parse()
      .map(MovieId)
      .map_err(|_| Error::InvalidMovieId(s.to_owned()))
  }
}

impl fmt::Display for GuildId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(&self.0, f) }
}

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(&self.0, f) }
}

// ─── Catalog data ────────────────────────────────────────────────────────────

/// What the external catalog knows about a movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieInfo {
  pub movie_id: MovieId,
  pub title:    String,
  pub year:     Option<i32>,
}

// ─── Stored records ──────────────────────────────────────────────────────────

/// A movie registered in a guild.
///
/// `title` and `year` are a snapshot taken when the movie was first
/// registered and are never re-synced with the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
  pub guild_id:      GuildId,
  pub movie_id:      MovieId,
  /// Empty for rows carried over from the title-less schema.
  pub title:         String,
  pub year:          Option<i32>,
  /// `None` for rows carried over from schemas without the column.
  pub registered_at: Option<DateTime<Utc>>,
}

impl MovieRecord {
  /// `Title (Year)`, falling back to the catalog id when no title was stored.
  pub fn display_title(&self) -> String {
    let title = if self.title.trim().is_empty() {
      format!("Movie {}", self.movie_id)
    } else {
      self.title.clone()
    };
    match self.year {
      Some(year) => format!("{title} ({year})"),
      None => title,
    }
  }
}

/// A movie record with its ratings aggregated. Never stored, always derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
  pub record:        MovieRecord,
  /// Mean rating rounded to two decimal places; `None` while unrated.
  pub avg_rating:    Option<f64>,
  pub total_ratings: u64,
}

/// How [`crate::store::RatingsStore::get_movie`] finds a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovieLookup {
  /// Exact catalog id.
  Id(MovieId),
  /// Case-insensitive exact title.
  Title(String),
}

impl MovieLookup {
  /// Interpret free-text input: a catalog link or id selects by id,
  /// anything else by title.
  pub fn from_input(input: &str) -> Self {
    match crate::catalog::parse_catalog_link(input) {
      Some(id) => Self::Id(id),
      None => Self::Title(input.trim().to_owned()),
    }
  }
}
