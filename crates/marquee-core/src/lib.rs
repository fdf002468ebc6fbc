//! Core types and trait definitions for the Marquee movie-rating bot.
//!
//! This crate is deliberately free of HTTP, chat-platform and database
//! dependencies. The store, catalog and bot crates all depend on it.

// We intentionally use native `async fn` in traits.
#![allow(async_fn_in_trait)]

pub mod catalog;
pub mod error;
pub mod movie;
pub mod rating;
pub mod store;

pub use error::{Error, Result};
