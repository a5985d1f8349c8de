//! SQLite backend for the College Connect voting service.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Implements both
//! [`VoteStore`](campus_core::store::VoteStore) and
//! [`ContentStore`](campus_core::store::ContentStore).

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
