//! The `RatingsStore` trait.
//!
//! Implemented by storage backends (e.g. `marquee-store-sqlite`). The bot
//! depends on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  movie::{GuildId, MovieId, MovieLookup, MovieSummary, UserId},
  rating::Rating,
};

/// Default number of entries returned by [`RatingsStore::list_top_movies`].
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 25;

/// Guild-scoped movie records and per-user ratings.
///
/// Every operation is a single self-contained unit of work. Nothing here is
/// ever deleted: movie records are write-once, ratings are overwritten in
/// place.
pub trait RatingsStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Bring the backing storage up to the current schema. Safe to call on
  /// every start, whatever state the storage is in.
  fn initialize(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Insert a movie record unless `(guild_id, movie_id)` already exists, in
  /// which case the stored title/year are left untouched.
  ///
  /// Returns `true` when a new record was created.
  fn register_movie<'a>(
    &'a self,
    guild_id: GuildId,
    movie_id: MovieId,
    title: &'a str,
    year: Option<i32>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Record `user_id`'s rating, replacing any earlier rating of theirs for
  /// the same movie in the same guild.
  fn record_rating(
    &self,
    guild_id: GuildId,
    movie_id: MovieId,
    user_id: UserId,
    rating: Rating,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// A single movie with its aggregate. `None` if the guild has no matching
  /// record.
  fn get_movie<'a>(
    &'a self,
    guild_id: GuildId,
    lookup: &'a MovieLookup,
  ) -> impl Future<Output = Result<Option<MovieSummary>, Self::Error>> + Send + 'a;

  /// The guild's movies ordered by average rating (highest first), at most
  /// `limit` of them. Unrated movies rank below every rated one; ties are
  /// broken by rating count (descending) and then catalog id (ascending).
  fn list_top_movies(
    &self,
    guild_id: GuildId,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<MovieSummary>, Self::Error>> + Send + '_;
}
