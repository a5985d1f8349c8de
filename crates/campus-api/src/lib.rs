//! JSON REST API for College Connect.
//!
//! Exposes an axum [`Router`] backed by any store implementing both
//! [`VoteStore`] and [`ContentStore`]. Authentication, TLS, and transport
//! concerns are the caller's responsibility; see [`identity`].
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", campus_api::api_router(store.clone(), ApiOptions::default()))
//! ```

pub mod answers;
pub mod error;
pub mod identity;
pub mod questions;
pub mod search;
pub mod topics;
pub mod view;
pub mod votes;

use std::sync::Arc;

use axum::{
  Router,
  http::HeaderName,
  routing::{get, post},
};
use campus_core::{
  VoteAggregator,
  aggregator::DEFAULT_RETRY_LIMIT,
  store::{ContentStore, VoteStore},
};

pub use error::ApiError;

/// Everything a handler needs from its backing store.
pub trait CampusStore: VoteStore + ContentStore + Send + Sync + 'static {}

impl<T> CampusStore for T where T: VoteStore + ContentStore + Send + Sync + 'static {}

// ─── State ────────────────────────────────────────────────────────────────────

/// Router tuning knobs.
#[derive(Debug, Clone)]
pub struct ApiOptions {
  /// Header carrying the verified caller's user id.
  pub identity_header:  HeaderName,
  /// How often a vote is re-read after losing a race.
  pub vote_retry_limit: u32,
}

impl Default for ApiOptions {
  fn default() -> Self {
    Self {
      identity_header:  HeaderName::from_static(identity::DEFAULT_IDENTITY_HEADER),
      vote_retry_limit: DEFAULT_RETRY_LIMIT,
    }
  }
}

/// Shared state threaded through all API handlers.
pub struct ApiState<S> {
  pub store:           Arc<S>,
  pub votes:           VoteAggregator<S>,
  pub identity_header: HeaderName,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:           Arc::clone(&self.store),
      votes:           self.votes.clone(),
      identity_header: self.identity_header.clone(),
    }
  }
}

impl<S: CampusStore> ApiState<S> {
  pub fn new(store: Arc<S>, options: ApiOptions) -> Self {
    let votes = VoteAggregator::new(Arc::clone(&store))
      .with_retry_limit(options.vote_retry_limit);
    Self { store, votes, identity_header: options.identity_header }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S: CampusStore>(store: Arc<S>, options: ApiOptions) -> Router<()> {
  Router::new()
    // Votes
    .route("/votes", post(votes::cast::<S>))
    // Topics
    .route("/topics", get(topics::list::<S>).post(topics::create::<S>))
    .route("/topics/{id}", get(topics::get_one::<S>))
    // Questions
    .route("/questions", post(questions::create::<S>))
    .route("/questions/topic/{topic_id}", get(questions::list_by_topic::<S>))
    .route("/questions/{id}", get(questions::get_one::<S>))
    // Answers
    .route("/answers", post(answers::create::<S>))
    .route("/answers/question/{question_id}", get(answers::list_by_question::<S>))
    // Search
    .route("/search", get(search::search::<S>))
    .route("/search/suggestions", get(search::suggestions::<S>))
    .route("/search/top-comments/{topic_id}", get(search::top_comments::<S>))
    .with_state(ApiState::new(store, options))
}

#[cfg(test)]
mod tests;
