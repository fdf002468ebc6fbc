//! Error types for `marquee-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("rating must be between 1 and 10, got {0}")]
  RatingOutOfRange(i64),

  #[error("invalid catalog identifier: {0:?}")]
  InvalidMovieId(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
