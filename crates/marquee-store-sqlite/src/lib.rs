//! SQLite backend for the Marquee ratings store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Connections are opened per operation
//! and closed when it completes.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use schema::CURRENT_VERSION;
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
