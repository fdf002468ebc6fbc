//! The external movie catalog and the rules for turning user input into a
//! catalog query.

use std::future::Future;

use crate::movie::{MovieId, MovieInfo};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// An external movie catalog. Implementations never cache or retry.
pub trait Catalog: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch a movie by its catalog id. `None` if the catalog has no such id.
  fn resolve_by_id(
    &self,
    id: MovieId,
  ) -> impl Future<Output = Result<Option<MovieInfo>, Self::Error>> + Send + '_;

  /// Free-text search, best match first.
  fn search_by_text<'a>(
    &'a self,
    query: &'a str,
  ) -> impl Future<Output = Result<Vec<MovieInfo>, Self::Error>> + Send + 'a;
}

// ─── Input handling ──────────────────────────────────────────────────────────

/// Find an IMDb title id in `input`.
///
/// Matches `tt<digits>` as a standalone token, which covers full links such
/// as `https://www.imdb.com/title/tt0111161/?ref_=nv` as well as bare ids.
pub fn parse_catalog_link(input: &str) -> Option<MovieId> {
  let bytes = input.as_bytes();
  let mut from = 0;
  while let Some(pos) = input[from..].find("tt") {
    let start = from + pos;
    from = start + 2;

    if start > 0 && bytes[start - 1].is_ascii_alphanumeric() {
      continue;
    }
    let digits_end = bytes[from..]
      .iter()
      .position(|b| !b.is_ascii_digit())
      .map_or(bytes.len(), |n| from + n);
    if digits_end == from {
      continue;
    }
    if digits_end < bytes.len() && bytes[digits_end].is_ascii_alphanumeric() {
      continue;
    }
    if let Ok(id) = input[from..digits_end].parse() {
      return Some(MovieId(id));
    }
  }
  None
}

/// Resolve free-text input to a single movie: links and ids are resolved
/// directly, anything else is searched and the first hit taken.
pub async fn lookup<C: Catalog>(
  catalog: &C,
  input: &str,
) -> Result<Option<MovieInfo>, C::Error> {
  let input = input.trim();
  if input.is_empty() {
    return Ok(None);
  }
  if let Some(id) = parse_catalog_link(input) {
    return catalog.resolve_by_id(id).await;
  }
  Ok(catalog.search_by_text(input).await?.into_iter().next())
}
