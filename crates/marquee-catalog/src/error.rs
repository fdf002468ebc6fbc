//! Error type for `marquee-catalog`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("catalog responded with status {0}")]
  Status(u16),

  /// The catalog answered, but with an error other than "not found".
  #[error("catalog error: {0}")]
  Api(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
