//! [`SqliteStore`] — the SQLite implementation of [`RatingsStore`].

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use chrono::Utc;
use marquee_core::{
  movie::{GuildId, MovieId, MovieLookup, MovieSummary, UserId},
  rating::Rating,
  store::RatingsStore,
};
use rusqlite::{OpenFlags, OptionalExtension as _};
use uuid::Uuid;

use crate::{
  encode::{encode_dt, encode_guild, encode_movie, encode_user, RawSummary, SUMMARY_COLUMNS},
  schema::{self, fold_title, Migrated, CONNECTION_PRAGMAS, CURRENT_VERSION, JOURNAL_PRAGMA},
  Error, Result,
};

/// How long a writer waits on a locked file before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Location ────────────────────────────────────────────────────────────────

#[derive(Clone)]
enum Location {
  File(PathBuf),
  /// A named shared-cache database. SQLite drops it as soon as its last
  /// connection closes, so `_anchor` stays open for the store's lifetime.
  Memory {
    uri:     String,
    _anchor: tokio_rusqlite::Connection,
  },
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Marquee ratings store backed by a single SQLite file.
///
/// The store holds no connection of its own: every operation opens one,
/// uses it and closes it. Cloning is cheap.
#[derive(Clone)]
pub struct SqliteStore {
  location: Location,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and bring its schema up to date.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let store = Self { location: Location::File(path.as_ref().to_path_buf()) };
    store.initialize().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let uri = format!("file:marquee-{}?mode=memory&cache=shared", Uuid::new_v4());
    let anchor = tokio_rusqlite::Connection::open_with_flags(&uri, memory_flags()).await?;
    let store = Self { location: Location::Memory { uri, _anchor: anchor } };
    store.initialize().await?;
    Ok(store)
  }

  /// Schema version currently recorded in the file.
  pub async fn schema_version(&self) -> Result<i64> {
    self.with_conn(|conn| Ok(schema::user_version(conn)?)).await
  }

  async fn connect(&self) -> Result<tokio_rusqlite::Connection> {
    let conn = match &self.location {
      Location::File(path) => tokio_rusqlite::Connection::open(path).await?,
      Location::Memory { uri, .. } => {
        tokio_rusqlite::Connection::open_with_flags(uri, memory_flags()).await?
      }
    };
    Ok(conn)
  }

  /// Run `f` on a fresh connection, then close it.
  pub(crate) async fn with_conn<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut rusqlite::Connection) -> tokio_rusqlite::Result<T> + Send + 'static,
  {
    let conn = self.connect().await?;
    let out = conn
      .call(move |conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(CONNECTION_PRAGMAS)?;
        f(conn)
      })
      .await;

    if let Err(e) = conn.close().await {
      tracing::warn!(error = %e, "failed to close sqlite connection");
    }
    Ok(out?)
  }
}

fn memory_flags() -> OpenFlags {
  OpenFlags::SQLITE_OPEN_READ_WRITE
    | OpenFlags::SQLITE_OPEN_CREATE
    | OpenFlags::SQLITE_OPEN_URI
    | OpenFlags::SQLITE_OPEN_NO_MUTEX
}

// ─── RatingsStore impl ───────────────────────────────────────────────────────

impl RatingsStore for SqliteStore {
  type Error = Error;

  async fn initialize(&self) -> Result<()> {
    let outcome = self
      .with_conn(|conn| {
        conn.execute_batch(JOURNAL_PRAGMA)?;
        Ok(schema::migrate(conn)?)
      })
      .await?;

    match outcome {
      Migrated::AlreadyCurrent => {
        tracing::debug!(version = CURRENT_VERSION, "schema is current");
        Ok(())
      }
      Migrated::Upgraded { from } => {
        tracing::info!(from, to = CURRENT_VERSION, "migrated schema");
        Ok(())
      }
      Migrated::TooNew { found } => {
        Err(Error::UnsupportedSchemaVersion { found, supported: CURRENT_VERSION })
      }
    }
  }

  async fn register_movie(
    &self,
    guild_id: GuildId,
    movie_id: MovieId,
    title: &str,
    year: Option<i32>,
  ) -> Result<bool> {
    let guild  = encode_guild(guild_id);
    let movie  = encode_movie(movie_id);
    let folded = fold_title(title);
    let title  = title.to_owned();
    let at_str = encode_dt(Utc::now());

    let inserted = self
      .with_conn(move |conn| {
        Ok(conn.execute(
          "INSERT INTO movies (guild_id, movie_id, title, title_folded, year, registered_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (guild_id, movie_id) DO NOTHING",
          rusqlite::params![guild, movie, title, folded, year, at_str],
        )?)
      })
      .await?;

    tracing::debug!(%guild_id, %movie_id, inserted = inserted > 0, "register_movie");
    Ok(inserted > 0)
  }

  async fn record_rating(
    &self,
    guild_id: GuildId,
    movie_id: MovieId,
    user_id: UserId,
    rating: Rating,
  ) -> Result<()> {
    let guild  = encode_guild(guild_id);
    let movie  = encode_movie(movie_id);
    let user   = encode_user(user_id);
    let value  = rating.get();
    let at_str = encode_dt(Utc::now());

    // The existence check and the upsert are one statement.
    let changed = self
      .with_conn(move |conn| {
        Ok(conn.execute(
          "INSERT INTO ratings (guild_id, movie_id, user_id, rating, rated_at)
           SELECT ?1, ?2, ?3, ?4, ?5
           WHERE EXISTS (SELECT 1 FROM movies WHERE guild_id = ?1 AND movie_id = ?2)
           ON CONFLICT (guild_id, movie_id, user_id)
           DO UPDATE SET rating = excluded.rating, rated_at = excluded.rated_at",
          rusqlite::params![guild, movie, user, value, at_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::MovieNotRegistered { guild_id, movie_id });
    }
    tracing::debug!(%guild_id, %movie_id, %user_id, %rating, "record_rating");
    Ok(())
  }

  async fn get_movie(
    &self,
    guild_id: GuildId,
    lookup: &MovieLookup,
  ) -> Result<Option<MovieSummary>> {
    let guild = encode_guild(guild_id);
    // A blank title is no lookup key at all; untitled legacy rows must not
    // match it.
    let lookup = match lookup {
      MovieLookup::Title(title) => {
        let folded = fold_title(title);
        if folded.is_empty() {
          return Ok(None);
        }
        MovieLookup::Title(folded)
      }
      MovieLookup::Id(id) => MovieLookup::Id(*id),
    };

    let raw: Option<RawSummary> = self
      .with_conn(move |conn| {
        let raw = match lookup {
          MovieLookup::Id(movie_id) => conn
            .query_row(
              &format!(
                "SELECT {SUMMARY_COLUMNS}
                 FROM movies m
                 LEFT JOIN ratings r ON r.guild_id = m.guild_id AND r.movie_id = m.movie_id
                 WHERE m.guild_id = ?1 AND m.movie_id = ?2
                 GROUP BY m.guild_id, m.movie_id"
              ),
              rusqlite::params![guild, encode_movie(movie_id)],
              RawSummary::from_row,
            )
            .optional()?,
          MovieLookup::Title(folded) => conn
            .query_row(
              &format!(
                "SELECT {SUMMARY_COLUMNS}
                 FROM movies m
                 LEFT JOIN ratings r ON r.guild_id = m.guild_id AND r.movie_id = m.movie_id
                 WHERE m.guild_id = ?1 AND m.title_folded = ?2
                 GROUP BY m.guild_id, m.movie_id
                 ORDER BY m.movie_id ASC
                 LIMIT 1"
              ),
              rusqlite::params![guild, folded],
              RawSummary::from_row,
            )
            .optional()?,
        };
        Ok(raw)
      })
      .await?;

    raw.map(RawSummary::into_summary).transpose()
  }

  async fn list_top_movies(&self, guild_id: GuildId, limit: usize) -> Result<Vec<MovieSummary>> {
    let guild = encode_guild(guild_id);
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawSummary> = self
      .with_conn(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUMMARY_COLUMNS}
           FROM movies m
           LEFT JOIN ratings r ON r.guild_id = m.guild_id AND r.movie_id = m.movie_id
           WHERE m.guild_id = ?1
           GROUP BY m.guild_id, m.movie_id
           ORDER BY COALESCE(AVG(r.rating), 0) DESC, COUNT(r.rating) DESC, m.movie_id ASC
           LIMIT ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![guild, limit], RawSummary::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSummary::into_summary).collect()
  }
}
