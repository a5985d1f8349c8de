//! Storage traits consumed by the vote aggregator and the API layer.
//!
//! [`VoteStore`] is the narrow contract the aggregator needs: find a target's
//! counters, manage vote records, and apply atomic counter deltas.
//! [`ContentStore`] is the collaborator that owns topics, questions and
//! answers. Backends (e.g. `campus-store-sqlite`) usually implement both.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use uuid::Uuid;

use crate::{
  content::{Answer, NewAnswer, NewQuestion, NewTopic, Question, Topic},
  search::{SearchMatches, Suggestion},
  vote::{CounterDelta, Direction, TargetRef, TargetType, VoteCounts, VoteKey, VoteRecord},
};

/// Result of attempting to insert a vote record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
  Inserted,
  /// A record already exists for the same key; nothing was written.
  Conflict,
}

// ─── Votes ───────────────────────────────────────────────────────────────────

pub trait VoteStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Current counters of `target`, or `None` if the entity does not exist.
  fn find_counts(
    &self,
    target: TargetRef,
  ) -> impl Future<Output = Result<Option<VoteCounts>, Self::Error>> + Send + '_;

  fn find_vote(
    &self,
    key: VoteKey,
  ) -> impl Future<Output = Result<Option<VoteRecord>, Self::Error>> + Send + '_;

  /// All of `user_id`'s records on `target_ids` of one type, in one query.
  fn find_votes<'a>(
    &'a self,
    user_id: Uuid,
    target_type: TargetType,
    target_ids: &'a [Uuid],
  ) -> impl Future<Output = Result<Vec<VoteRecord>, Self::Error>> + Send + 'a;

  /// Insert `record`, relying on the per-key uniqueness constraint.
  ///
  /// A violated constraint is reported as [`InsertOutcome::Conflict`], not
  /// as an error.
  fn insert_vote<'a>(
    &'a self,
    record: &'a VoteRecord,
  ) -> impl Future<Output = Result<InsertOutcome, Self::Error>> + Send + 'a;

  /// Flip the record for `key` from `from` to `to`. Returns `false` if there
  /// is no record, or if it no longer points `from`.
  fn update_vote_direction(
    &self,
    key: VoteKey,
    from: Direction,
    to: Direction,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete the record for `key` if it still points `direction`. Returns
  /// `false` if nothing was deleted.
  fn delete_vote(
    &self,
    key: VoteKey,
    direction: Direction,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Atomically add `delta` to the target's counters, flooring each at zero,
  /// and return the new values. `None` if the target does not exist.
  ///
  /// Implementations must apply the delta in the storage layer, never as a
  /// read followed by a write.
  fn apply_delta(
    &self,
    target: TargetRef,
    delta: CounterDelta,
  ) -> impl Future<Output = Result<Option<VoteCounts>, Self::Error>> + Send + '_;
}

// ─── Content ─────────────────────────────────────────────────────────────────

pub trait ContentStore: Send + Sync {
  /// Must be convertible to [`crate::Error`] so not-found and duplicate-name
  /// failures keep their meaning across the boundary.
  type Error: std::error::Error + Send + Sync + Into<crate::Error> + 'static;

  /// Topic names are unique.
  fn create_topic(
    &self,
    input: NewTopic,
  ) -> impl Future<Output = Result<Topic, Self::Error>> + Send + '_;

  fn get_topic(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Topic>, Self::Error>> + Send + '_;

  fn list_topics(
    &self,
  ) -> impl Future<Output = Result<Vec<Topic>, Self::Error>> + Send + '_;

  /// Fails with a not-found error if the parent topic does not exist.
  fn create_question(
    &self,
    input: NewQuestion,
  ) -> impl Future<Output = Result<Question, Self::Error>> + Send + '_;

  fn get_question(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Question>, Self::Error>> + Send + '_;

  fn list_questions(
    &self,
    topic_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Question>, Self::Error>> + Send + '_;

  /// Fails with a not-found error if the parent question does not exist.
  fn create_answer(
    &self,
    input: NewAnswer,
  ) -> impl Future<Output = Result<Answer, Self::Error>> + Send + '_;

  fn get_answer(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Answer>, Self::Error>> + Send + '_;

  fn list_answers(
    &self,
    question_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Answer>, Self::Error>> + Send + '_;

  /// Every answer under any question of `topic_id`, newest first.
  fn list_topic_answers(
    &self,
    topic_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Answer>, Self::Error>> + Send + '_;

  // ── Search ──────────────────────────────────────────────────────────────

  /// Content containing `query`, ignoring case. `query` is matched
  /// literally; it is never a pattern.
  fn search(
    &self,
    query: String,
  ) -> impl Future<Output = Result<SearchMatches, Self::Error>> + Send + '_;

  /// Up to `per_kind` topic names, then up to `per_kind` question titles,
  /// starting with `prefix` (ignoring case).
  fn suggest(
    &self,
    prefix: String,
    per_kind: usize,
  ) -> impl Future<Output = Result<Vec<Suggestion>, Self::Error>> + Send + '_;
}
