//! Movie catalog client for Marquee.
//!
//! Implements [`marquee_core::catalog::Catalog`] on top of the OMDb HTTP API,
//! which keys movies by their IMDb id.

mod omdb;

pub mod error;

pub use error::{Error, Result};
pub use omdb::{CatalogConfig, OmdbClient};
