//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Snowflakes and catalog ids are stored as `INTEGER`; the `u64` ↔ `i64`
//! conversion is a bit-for-bit reinterpretation so every id round-trips.
//! Timestamps are stored as RFC 3339 strings.

use chrono::{DateTime, Utc};
use marquee_core::movie::{GuildId, MovieId, MovieRecord, MovieSummary, UserId};

use crate::{Error, Result};

// ─── Ids ─────────────────────────────────────────────────────────────────────

pub fn encode_guild(id: GuildId) -> i64 { id.0 as i64 }

pub fn encode_movie(id: MovieId) -> i64 { id.0 as i64 }

pub fn encode_user(id: UserId) -> i64 { id.0 as i64 }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Rows ────────────────────────────────────────────────────────────────────

/// Column list shared by every summary query; pairs with
/// [`RawSummary::from_row`].
pub const SUMMARY_COLUMNS: &str = "
  m.guild_id,
  m.movie_id,
  COALESCE(m.title, ''),
  m.year,
  m.registered_at,
  ROUND(AVG(r.rating), 2),
  COUNT(r.rating)";

/// A summary row as read from SQLite, before domain decoding.
pub struct RawSummary {
  pub guild_id:      i64,
  pub movie_id:      i64,
  pub title:         String,
  pub year:          Option<i64>,
  pub registered_at: Option<String>,
  pub avg_rating:    Option<f64>,
  pub total_ratings: i64,
}

impl RawSummary {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      guild_id:      row.get(0)?,
      movie_id:      row.get(1)?,
      title:         row.get(2)?,
      year:          row.get(3)?,
      registered_at: row.get(4)?,
      avg_rating:    row.get(5)?,
      total_ratings: row.get(6)?,
    })
  }

  pub fn into_summary(self) -> Result<MovieSummary> {
    let registered_at = self.registered_at.as_deref().map(decode_dt).transpose()?;
    let total_ratings = self.total_ratings.max(0) as u64;

    Ok(MovieSummary {
      record: MovieRecord {
        guild_id: GuildId(self.guild_id as u64),
        movie_id: MovieId(self.movie_id as u64),
        title: self.title,
        year: self.year.and_then(|y| i32::try_from(y).ok()),
        registered_at,
      },
      // AVG is NULL without ratings; keep it that way.
      avg_rating: if total_ratings == 0 { None } else { self.avg_rating },
      total_ratings,
    })
  }
}
