//! Command logic, independent of Discord.
//!
//! Each handler takes the already-extracted inputs of one interaction and
//! returns the [`Reply`] to show. Store and catalog failures surface as
//! [`Error`]; "not found" outcomes are ordinary replies.

use marquee_core::{
  catalog::{self, Catalog},
  movie::{GuildId, MovieId, MovieLookup, UserId},
  store::RatingsStore,
};

use crate::{
  controls,
  error::{Error, Result},
  format,
};

/// What to send back for one interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
  pub content:   String,
  /// Attach rating buttons for this movie.
  pub controls:  Option<MovieId>,
  /// Visible only to the invoking user.
  pub ephemeral: bool,
}

impl Reply {
  pub fn text(content: impl Into<String>) -> Self {
    Self { content: content.into(), controls: None, ephemeral: false }
  }

  pub fn private(content: impl Into<String>) -> Self {
    Self { ephemeral: true, ..Self::text(content) }
  }
}

/// `/start`: resolve `name` in the catalog, register the movie in the guild
/// and offer rating buttons.
pub async fn start<S, C>(store: &S, catalog: &C, guild_id: GuildId, name: &str) -> Result<Reply>
where
  S: RatingsStore,
  C: Catalog,
{
  let Some(info) = catalog::lookup(catalog, name).await.map_err(Error::catalog)? else {
    tracing::info!(%guild_id, name, "no catalog match");
    return Ok(Reply::text(format::CATALOG_MISS));
  };

  // Register before the buttons go out so a press always finds the movie.
  let created = store
    .register_movie(guild_id, info.movie_id, &info.title, info.year)
    .await
    .map_err(Error::store)?;
  tracing::info!(%guild_id, movie_id = %info.movie_id, title = %info.title, created, "movie started");

  Ok(Reply {
    content:   format::announcement(&info),
    controls:  Some(info.movie_id),
    ephemeral: false,
  })
}

/// `/movie`: one movie's aggregate, looked up by link/id or exact title.
pub async fn show_movie<S: RatingsStore>(store: &S, guild_id: GuildId, query: &str) -> Result<Reply> {
  let lookup = MovieLookup::from_input(query);
  let summary = store
    .get_movie(guild_id, &lookup)
    .await
    .map_err(Error::store)?;

  Ok(match summary {
    Some(summary) => Reply::text(format::movie_summary(&summary)),
    None => Reply::text(format::STORE_MISS),
  })
}

/// `/top`: the guild leaderboard.
pub async fn top<S: RatingsStore>(store: &S, guild_id: GuildId, limit: usize) -> Result<Reply> {
  let entries = store
    .list_top_movies(guild_id, limit)
    .await
    .map_err(Error::store)?;
  Ok(Reply::text(format::leaderboard(&entries)))
}

/// A rating button press. `Ok(None)` when the component isn't ours or its
/// id is malformed; only an out-of-range value gets a reply. Presses outside
/// a guild are answered with [`format::GUILD_ONLY`].
pub async fn rate<S: RatingsStore>(
  store: &S,
  guild_id: Option<GuildId>,
  user_id: UserId,
  custom_id: &str,
) -> Result<Option<Reply>> {
  let Some(guild_id) = guild_id else {
    return Ok(Some(Reply::private(format::GUILD_ONLY)));
  };
  let press = match controls::parse_custom_id(custom_id) {
    Ok(Some(press)) => press,
    Ok(None) => return Ok(None),
    Err(Error::Core(e @ marquee_core::Error::RatingOutOfRange(_))) => {
      tracing::warn!(custom_id, error = %e, "rejected rating control");
      return Ok(Some(Reply::private(format!("That rating isn't valid: {e}"))));
    }
    Err(e) => {
      tracing::warn!(custom_id, error = %e, "ignored malformed rating control");
      return Ok(None);
    }
  };

  store
    .record_rating(guild_id, press.movie_id, user_id, press.rating)
    .await
    .map_err(Error::store)?;

  Ok(Some(Reply::private(format::rated(press.rating.get()))))
}
