//! Integration tests for `SqliteStore` against in-memory and temporary-file
//! databases.

use std::path::PathBuf;

use marquee_core::{
  movie::{GuildId, MovieId, MovieLookup, UserId},
  rating::Rating,
  store::{DEFAULT_LEADERBOARD_LIMIT, RatingsStore},
};
use uuid::Uuid;

use crate::{Error, SqliteStore, CURRENT_VERSION};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn r(v: u8) -> Rating { Rating::new(v).unwrap() }

fn by_id(id: u64) -> MovieLookup { MovieLookup::Id(MovieId(id)) }

/// A file path under the system temp dir, removed (with WAL siblings) on drop.
struct TempDb(PathBuf);

impl TempDb {
  fn new() -> Self {
    Self(std::env::temp_dir().join(format!("marquee-test-{}.db", Uuid::new_v4())))
  }
}

impl Drop for TempDb {
  fn drop(&mut self) {
    for suffix in ["", "-wal", "-shm"] {
      let mut path = self.0.clone().into_os_string();
      path.push(suffix);
      let _ = std::fs::remove_file(path);
    }
  }
}

// ─── Scenario ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_rate_and_rerate() {
  let s = store().await;
  let g = GuildId(1);

  assert!(s.register_movie(g, MovieId(100), "Alpha", Some(2000)).await.unwrap());

  let m = s.get_movie(g, &by_id(100)).await.unwrap().unwrap();
  assert_eq!(m.record.title, "Alpha");
  assert_eq!(m.record.year, Some(2000));
  assert_eq!(m.total_ratings, 0);
  assert_eq!(m.avg_rating, None);
  assert!(m.record.registered_at.is_some());

  s.record_rating(g, MovieId(100), UserId(7), r(8)).await.unwrap();
  s.record_rating(g, MovieId(100), UserId(9), r(10)).await.unwrap();
  let m = s.get_movie(g, &by_id(100)).await.unwrap().unwrap();
  assert_eq!(m.avg_rating, Some(9.0));
  assert_eq!(m.total_ratings, 2);

  s.record_rating(g, MovieId(100), UserId(7), r(2)).await.unwrap();
  let m = s.get_movie(g, &by_id(100)).await.unwrap().unwrap();
  assert_eq!(m.avg_rating, Some(6.0));
  assert_eq!(m.total_ratings, 2);
}

// ─── Movies ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_movie_keeps_first_snapshot() {
  let s = store().await;
  let g = GuildId(1);

  assert!(s.register_movie(g, MovieId(5), "Original", Some(1990)).await.unwrap());
  assert!(!s.register_movie(g, MovieId(5), "Remaster", Some(2020)).await.unwrap());

  let m = s.get_movie(g, &by_id(5)).await.unwrap().unwrap();
  assert_eq!(m.record.title, "Original");
  assert_eq!(m.record.year, Some(1990));
}

#[tokio::test]
async fn register_movie_without_year() {
  let s = store().await;
  s.register_movie(GuildId(1), MovieId(5), "Undated", None).await.unwrap();
  let m = s.get_movie(GuildId(1), &by_id(5)).await.unwrap().unwrap();
  assert_eq!(m.record.year, None);
  assert_eq!(m.record.display_title(), "Undated");
}

#[tokio::test]
async fn get_movie_missing_returns_none() {
  let s = store().await;
  assert!(s.get_movie(GuildId(1), &by_id(404)).await.unwrap().is_none());
  assert!(
    s.get_movie(GuildId(1), &MovieLookup::Title("Nope".into()))
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn get_movie_by_title_is_case_insensitive_and_exact() {
  let s = store().await;
  let g = GuildId(1);
  s.register_movie(g, MovieId(133093), "The Matrix", Some(1999)).await.unwrap();
  s.register_movie(g, MovieId(234215), "The Matrix Reloaded", Some(2003)).await.unwrap();
  s.record_rating(g, MovieId(133093), UserId(1), r(9)).await.unwrap();

  let m = s
    .get_movie(g, &MovieLookup::Title("the MATRIX".into()))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(m.record.movie_id, MovieId(133093));
  assert_eq!(m.total_ratings, 1);

  assert!(
    s.get_movie(g, &MovieLookup::Title("Matrix".into()))
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn get_movie_by_title_folds_non_ascii_case() {
  let s = store().await;
  let g = GuildId(1);
  s.register_movie(g, MovieId(211915), "Amélie", Some(2001)).await.unwrap();
  s.register_movie(g, MovieId(17136), "Metropolis", Some(1927)).await.unwrap();
  s.register_movie(g, MovieId(82096), "Ölümsüz Şövalye", None).await.unwrap();

  for query in ["AMÉLIE", "amélie", "  Amélie  "] {
    let m = s.get_movie(g, &MovieLookup::Title(query.into())).await.unwrap().unwrap();
    assert_eq!(m.record.movie_id, MovieId(211915), "{query}");
    assert_eq!(m.record.title, "Amélie");
  }
  let m = s
    .get_movie(g, &MovieLookup::Title("ÖLÜMSÜZ ŞÖVALYE".into()))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(m.record.movie_id, MovieId(82096));
  assert!(
    s.get_movie(g, &MovieLookup::Title("Amelie".into()))
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn blank_title_lookup_matches_nothing() {
  let s = store().await;
  let g = GuildId(1);
  s.register_movie(g, MovieId(5), "", None).await.unwrap();

  for query in ["", "   "] {
    assert!(s.get_movie(g, &MovieLookup::Title(query.into())).await.unwrap().is_none());
    assert!(s.get_movie(g, &MovieLookup::from_input(query)).await.unwrap().is_none());
  }
  assert!(s.get_movie(g, &by_id(5)).await.unwrap().is_some());
}

#[tokio::test]
async fn duplicate_titles_resolve_to_lowest_id() {
  let s = store().await;
  let g = GuildId(1);
  s.register_movie(g, MovieId(900), "Dune", Some(2021)).await.unwrap();
  s.register_movie(g, MovieId(87182), "Dune", Some(1984)).await.unwrap();

  let m = s.get_movie(g, &MovieLookup::Title("dune".into())).await.unwrap().unwrap();
  assert_eq!(m.record.movie_id, MovieId(900));
}

// ─── Ratings ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn rerating_overwrites_instead_of_appending() {
  let s = store().await;
  let g = GuildId(3);
  s.register_movie(g, MovieId(1), "One", None).await.unwrap();

  s.record_rating(g, MovieId(1), UserId(42), r(3)).await.unwrap();
  s.record_rating(g, MovieId(1), UserId(42), r(7)).await.unwrap();
  s.record_rating(g, MovieId(1), UserId(42), r(7)).await.unwrap();

  let m = s.get_movie(g, &by_id(1)).await.unwrap().unwrap();
  assert_eq!(m.total_ratings, 1);
  assert_eq!(m.avg_rating, Some(7.0));
}

#[tokio::test]
async fn rating_unregistered_movie_errors() {
  let s = store().await;
  let err = s
    .record_rating(GuildId(1), MovieId(77), UserId(1), r(5))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::MovieNotRegistered { guild_id: GuildId(1), movie_id: MovieId(77) }
  ));
}

#[tokio::test]
async fn average_is_rounded_to_two_places() {
  let s = store().await;
  let g = GuildId(1);
  s.register_movie(g, MovieId(1), "Thirds", None).await.unwrap();
  s.record_rating(g, MovieId(1), UserId(1), r(10)).await.unwrap();
  s.record_rating(g, MovieId(1), UserId(2), r(10)).await.unwrap();
  s.record_rating(g, MovieId(1), UserId(3), r(9)).await.unwrap();

  let m = s.get_movie(g, &by_id(1)).await.unwrap().unwrap();
  assert_eq!(m.avg_rating, Some(9.67));
}

// ─── Guild isolation ─────────────────────────────────────────────────────────

#[tokio::test]
async fn guilds_are_isolated_even_with_colliding_ids() {
  let s = store().await;
  let (a, b) = (GuildId(1), GuildId(2));

  s.register_movie(a, MovieId(100), "Alpha", Some(2000)).await.unwrap();
  s.record_rating(a, MovieId(100), UserId(7), r(9)).await.unwrap();

  assert!(s.get_movie(b, &by_id(100)).await.unwrap().is_none());
  assert!(s.list_top_movies(b, 25).await.unwrap().is_empty());
  assert!(matches!(
    s.record_rating(b, MovieId(100), UserId(7), r(1)).await,
    Err(Error::MovieNotRegistered { .. })
  ));

  s.register_movie(b, MovieId(100), "Alpha (B's copy)", Some(2001)).await.unwrap();
  let in_b = s.get_movie(b, &by_id(100)).await.unwrap().unwrap();
  assert_eq!(in_b.record.title, "Alpha (B's copy)");
  assert_eq!(in_b.total_ratings, 0);

  let in_a = s.get_movie(a, &by_id(100)).await.unwrap().unwrap();
  assert_eq!(in_a.record.title, "Alpha");
  assert_eq!(in_a.total_ratings, 1);
}

#[tokio::test]
async fn large_snowflakes_roundtrip() {
  let s = store().await;
  let g = GuildId(184_563_986_342_215_680);
  let u = UserId(u64::MAX - 1);
  s.register_movie(g, MovieId(1), "Big", None).await.unwrap();
  s.record_rating(g, MovieId(1), u, r(4)).await.unwrap();

  let top = s.list_top_movies(g, 1).await.unwrap();
  assert_eq!(top[0].record.guild_id, g);
  assert_eq!(top[0].total_ratings, 1);
}

// ─── Leaderboard ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn leaderboard_orders_by_average_with_tie_breaks() {
  let s = store().await;
  let g = GuildId(1);
  for (id, title) in [(10, "Ten"), (20, "Twenty"), (30, "Thirty"), (40, "Forty"), (50, "Fifty")] {
    s.register_movie(g, MovieId(id), title, None).await.unwrap();
  }
  // 30: avg 8 from two ratings; 20: avg 8 from one; 10: avg 8 from one;
  // 40: avg 5; 50: unrated.
  s.record_rating(g, MovieId(30), UserId(1), r(7)).await.unwrap();
  s.record_rating(g, MovieId(30), UserId(2), r(9)).await.unwrap();
  s.record_rating(g, MovieId(20), UserId(1), r(8)).await.unwrap();
  s.record_rating(g, MovieId(10), UserId(1), r(8)).await.unwrap();
  s.record_rating(g, MovieId(40), UserId(1), r(5)).await.unwrap();

  let top = s.list_top_movies(g, DEFAULT_LEADERBOARD_LIMIT).await.unwrap();
  let ids: Vec<u64> = top.iter().map(|m| m.record.movie_id.0).collect();
  assert_eq!(ids, vec![30, 10, 20, 40, 50]);

  let last = top.last().unwrap();
  assert_eq!(last.avg_rating, None);
  assert_eq!(last.total_ratings, 0);
}

#[tokio::test]
async fn leaderboard_respects_limit() {
  let s = store().await;
  let g = GuildId(1);
  for id in 1..=30u64 {
    s.register_movie(g, MovieId(id), &format!("Movie {id}"), None).await.unwrap();
    s.record_rating(g, MovieId(id), UserId(1), r((id % 10 + 1) as u8)).await.unwrap();
  }

  let top = s.list_top_movies(g, DEFAULT_LEADERBOARD_LIMIT).await.unwrap();
  assert_eq!(top.len(), 25);
  assert!(
    top
      .windows(2)
      .all(|w| w[0].avg_rating.unwrap_or(0.0) >= w[1].avg_rating.unwrap_or(0.0))
  );

  assert_eq!(s.list_top_movies(g, 3).await.unwrap().len(), 3);
  assert!(s.list_top_movies(g, 0).await.unwrap().is_empty());
  assert_eq!(s.list_top_movies(g, usize::MAX).await.unwrap().len(), 30);
}

// ─── Concurrency ─────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_wait_instead_of_failing() {
  const USERS: u64 = 64;
  let db = TempDb::new();
  let s = SqliteStore::open(&db.0).await.unwrap();
  let g = GuildId(1);
  s.register_movie(g, MovieId(1), "Crowded", None).await.unwrap();

  let handles: Vec<_> = (0..USERS)
    .map(|user| {
      let s = s.clone();
      tokio::spawn(async move {
        s.record_rating(g, MovieId(1), UserId(user), r((user % 10 + 1) as u8)).await
      })
    })
    .collect();

  let mut errors = Vec::new();
  for handle in handles {
    if let Err(e) = handle.await.unwrap() {
      errors.push(e.to_string());
    }
  }
  assert!(errors.is_empty(), "{errors:?}");

  let m = s.get_movie(g, &by_id(1)).await.unwrap().unwrap();
  assert_eq!(m.total_ratings, USERS);
}

#[tokio::test]
async fn every_connection_gets_connection_pragmas() {
  let db = TempDb::new();
  let s = SqliteStore::open(&db.0).await.unwrap();

  let (journal, synchronous, busy) = s
    .with_conn(|conn| {
      let journal: String = conn.pragma_query_value(None, "journal_mode", |row| row.get(0))?;
      let synchronous: i64 = conn.pragma_query_value(None, "synchronous", |row| row.get(0))?;
      let busy: i64 = conn.pragma_query_value(None, "busy_timeout", |row| row.get(0))?;
      Ok((journal, synchronous, busy))
    })
    .await
    .unwrap();

  assert_eq!(journal, "wal");
  // 1 = NORMAL
  assert_eq!(synchronous, 1);
  assert_eq!(busy, 5000);
}

// ─── Schema ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn initialize_is_idempotent() {
  let s = store().await;
  s.register_movie(GuildId(1), MovieId(1), "Kept", None).await.unwrap();

  s.initialize().await.unwrap();
  s.initialize().await.unwrap();

  assert_eq!(s.schema_version().await.unwrap(), CURRENT_VERSION);
  assert!(s.get_movie(GuildId(1), &by_id(1)).await.unwrap().is_some());
}

#[tokio::test]
async fn reopening_a_file_keeps_data() {
  let db = TempDb::new();
  {
    let s = SqliteStore::open(&db.0).await.unwrap();
    s.register_movie(GuildId(1), MovieId(1), "Persisted", Some(1999)).await.unwrap();
    s.record_rating(GuildId(1), MovieId(1), UserId(1), r(6)).await.unwrap();
  }

  let s = SqliteStore::open(&db.0).await.unwrap();
  let m = s.get_movie(GuildId(1), &by_id(1)).await.unwrap().unwrap();
  assert_eq!(m.record.title, "Persisted");
  assert_eq!(m.avg_rating, Some(6.0));
}

#[tokio::test]
async fn legacy_unversioned_file_is_migrated() {
  let db = TempDb::new();
  {
    let conn = rusqlite::Connection::open(&db.0).unwrap();
    conn
      .execute_batch(
        "CREATE TABLE movies (
           guild_id INTEGER,
           movie_id INTEGER,
           PRIMARY KEY (guild_id, movie_id)
         );
         CREATE TABLE ratings (
           guild_id INTEGER,
           movie_id INTEGER,
           user_id INTEGER,
           rating INTEGER,
           PRIMARY KEY (guild_id, movie_id, user_id)
         );
         INSERT INTO movies VALUES (1, 111161);
         INSERT INTO ratings VALUES (1, 111161, 7, 9);
         INSERT INTO ratings VALUES (1, 111161, 8, 6);",
      )
      .unwrap();
  }

  let s = SqliteStore::open(&db.0).await.unwrap();
  assert_eq!(s.schema_version().await.unwrap(), CURRENT_VERSION);

  let m = s.get_movie(GuildId(1), &by_id(111161)).await.unwrap().unwrap();
  assert_eq!(m.record.title, "");
  assert_eq!(m.record.year, None);
  assert_eq!(m.record.registered_at, None);
  assert_eq!(m.record.display_title(), "Movie tt0111161");
  assert_eq!(m.avg_rating, Some(7.5));
  assert_eq!(m.total_ratings, 2);

  // Untitled legacy rows are reachable by id only.
  assert!(s.get_movie(GuildId(1), &MovieLookup::Title(String::new())).await.unwrap().is_none());
  assert!(s.get_movie(GuildId(1), &MovieLookup::from_input("  ")).await.unwrap().is_none());

  s.record_rating(GuildId(1), MovieId(111161), UserId(7), r(1)).await.unwrap();
  let m = s.get_movie(GuildId(1), &by_id(111161)).await.unwrap().unwrap();
  assert_eq!(m.avg_rating, Some(3.5));
}

#[tokio::test]
async fn legacy_file_with_title_columns_is_migrated() {
  let db = TempDb::new();
  {
    let conn = rusqlite::Connection::open(&db.0).unwrap();
    conn
      .execute_batch(
        "CREATE TABLE movies (
           guild_id INTEGER,
           movie_id INTEGER,
           title TEXT,
           year INTEGER,
           PRIMARY KEY (guild_id, movie_id)
         );
         CREATE TABLE ratings (
           guild_id INTEGER,
           movie_id INTEGER,
           user_id INTEGER,
           rating INTEGER,
           PRIMARY KEY (guild_id, movie_id, user_id)
         );
         INSERT INTO movies VALUES (1, 133093, 'The Matrix', 1999);
         INSERT INTO movies VALUES (1, 211915, 'Amélie', 2001);",
      )
      .unwrap();
  }

  let s = SqliteStore::open(&db.0).await.unwrap();
  let m = s
    .get_movie(GuildId(1), &MovieLookup::Title("the matrix".into()))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(m.record.movie_id, MovieId(133093));
  assert_eq!(m.record.year, Some(1999));

  // Titles carried over from before the folded column are backfilled.
  let m = s
    .get_movie(GuildId(1), &MovieLookup::Title("AMÉLIE".into()))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(m.record.movie_id, MovieId(211915));
}

#[tokio::test]
async fn newer_schema_is_refused() {
  let db = TempDb::new();
  {
    let conn = rusqlite::Connection::open(&db.0).unwrap();
    conn
      .pragma_update(None, "user_version", CURRENT_VERSION + 1)
      .unwrap();
  }

  let err = SqliteStore::open(&db.0).await.err().unwrap();
  assert!(matches!(
    err,
    Error::UnsupportedSchemaVersion { found, supported }
      if found == CURRENT_VERSION + 1 && supported == CURRENT_VERSION
  ));
}
