//! Error type for the bot's command layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0}")]
  Core(#[from] marquee_core::Error),
  #[error("malformed rating control id: {0:?}")]
  MalformedControl(String),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
  #[error("catalog error: {0}")]
  Catalog(#[source] Box<dyn std::error::Error + Send + Sync>),
  #[error("discord error: {0}")]
  Discord(#[from] serenity::Error),
}

impl Error {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  pub fn catalog(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Catalog(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
