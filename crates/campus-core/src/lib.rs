//! Voting domain for College Connect: votable content, vote records, keyword
//! search, the storage traits a backend implements, and the
//! [`VoteAggregator`] that turns a cast into record and counter changes.
//!
//! No HTTP or database code lives here.

// Store traits spell out `Send` futures by hand; the lint does not apply.
#![allow(async_fn_in_trait)]

pub mod aggregator;
pub mod content;
pub mod error;
pub mod search;
pub mod store;
pub mod vote;

pub use aggregator::{VoteAggregator, VoteOutcome};
pub use error::{Error, Result};
