//! SQL schema for the Marquee SQLite store.
//!
//! The schema version lives in `PRAGMA user_version`. Each migration moves
//! the file forward by exactly one version inside its own transaction, so an
//! interrupted upgrade resumes from the last completed step.

use rusqlite::{Connection, OptionalExtension as _, Transaction};

/// Version a freshly initialised file ends up at.
pub const CURRENT_VERSION: i64 = MIGRATIONS.len() as i64;

/// Persistent file setting, applied once on initialisation.
pub const JOURNAL_PRAGMA: &str = "PRAGMA journal_mode = WAL;";

/// Per-connection settings; every fresh connection runs these.
pub const CONNECTION_PRAGMAS: &str = "PRAGMA synchronous = NORMAL;";

struct Migration {
  description: &'static str,
  apply:       fn(&Transaction<'_>) -> rusqlite::Result<()>,
}

/// Ordered forward migrations. Entry `n` upgrades version `n` to `n + 1`.
const MIGRATIONS: &[Migration] = &[
  Migration { description: "movies and ratings tables", apply: v1_base_tables },
  Migration { description: "movie title and year", apply: v2_title_and_year },
  Migration { description: "timestamps and title index", apply: v3_timestamps },
  Migration { description: "case-folded title", apply: v4_folded_title },
];

/// Outcome of [`migrate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Migrated {
  /// Applied every step from `from` up to [`CURRENT_VERSION`].
  Upgraded { from: i64 },
  AlreadyCurrent,
  /// The file is ahead of this build (or its version is garbage); nothing
  /// was touched.
  TooNew { found: i64 },
}

pub fn user_version(conn: &Connection) -> rusqlite::Result<i64> {
  conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}

/// Apply every pending migration.
pub fn migrate(conn: &mut Connection) -> rusqlite::Result<Migrated> {
  let from = user_version(conn)?;
  if !(0..=CURRENT_VERSION).contains(&from) {
    return Ok(Migrated::TooNew { found: from });
  }
  if from == CURRENT_VERSION {
    return Ok(Migrated::AlreadyCurrent);
  }

  for (index, migration) in MIGRATIONS.iter().enumerate().skip(from as usize) {
    let target = index as i64 + 1;
    let tx = conn.transaction()?;
    (migration.apply)(&tx)?;
    tx.pragma_update(None, "user_version", target)?;
    tx.commit()?;
    tracing::debug!(version = target, description = migration.description, "applied migration");
  }

  Ok(Migrated::Upgraded { from })
}

// ─── Steps ───────────────────────────────────────────────────────────────────

// `IF NOT EXISTS` adopts files created before the schema was versioned; those
// have the same keys, only without the NOT NULL and CHECK constraints.
fn v1_base_tables(tx: &Transaction<'_>) -> rusqlite::Result<()> {
  tx.execute_batch(
    "
CREATE TABLE IF NOT EXISTS movies (
    guild_id  INTEGER NOT NULL,
    movie_id  INTEGER NOT NULL,
    PRIMARY KEY (guild_id, movie_id)
);

-- One row per user per movie per guild; re-votes overwrite.
CREATE TABLE IF NOT EXISTS ratings (
    guild_id  INTEGER NOT NULL,
    movie_id  INTEGER NOT NULL,
    user_id   INTEGER NOT NULL,
    rating    INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 10),
    PRIMARY KEY (guild_id, movie_id, user_id)
);
",
  )
}

fn v2_title_and_year(tx: &Transaction<'_>) -> rusqlite::Result<()> {
  add_column_if_missing(tx, "movies", "title", "TEXT NOT NULL DEFAULT ''")?;
  add_column_if_missing(tx, "movies", "year", "INTEGER")
}

fn v3_timestamps(tx: &Transaction<'_>) -> rusqlite::Result<()> {
  add_column_if_missing(tx, "movies", "registered_at", "TEXT")?;
  add_column_if_missing(tx, "ratings", "rated_at", "TEXT")?;
  tx.execute_batch(
    "CREATE INDEX IF NOT EXISTS movies_title_idx ON movies(guild_id, title COLLATE NOCASE);",
  )
}

fn v4_folded_title(tx: &Transaction<'_>) -> rusqlite::Result<()> {
  add_column_if_missing(tx, "movies", "title_folded", "TEXT NOT NULL DEFAULT ''")?;

  let rows = {
    let mut stmt = tx.prepare("SELECT rowid, COALESCE(title, '') FROM movies")?;
    let rows = stmt
      .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    rows
  };
  {
    let mut update = tx.prepare("UPDATE movies SET title_folded = ?2 WHERE rowid = ?1")?;
    for (rowid, title) in rows {
      update.execute(rusqlite::params![rowid, fold_title(&title)])?;
    }
  }

  tx.execute_batch(
    "
DROP INDEX IF EXISTS movies_title_idx;
CREATE INDEX IF NOT EXISTS movies_title_folded_idx ON movies(guild_id, title_folded);
",
  )
}

/// Key used for title lookups. SQLite's `NOCASE` folds ASCII only, so the
/// folding happens here instead.
pub fn fold_title(title: &str) -> String { title.trim().to_lowercase() }

// Unversioned files may already carry some of the later columns.
fn add_column_if_missing(
  tx: &Transaction<'_>,
  table: &str,
  column: &str,
  definition: &str,
) -> rusqlite::Result<()> {
  let exists = tx
    .query_row(
      "SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2",
      rusqlite::params![table, column],
      |_| Ok(()),
    )
    .optional()?
    .is_some();

  if !exists {
    tx.execute_batch(&format!("ALTER TABLE {table} ADD COLUMN {column} {definition};"))?;
  }
  Ok(())
}
