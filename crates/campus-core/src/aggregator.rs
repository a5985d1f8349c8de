//! [`VoteAggregator`]: the only path through which vote records and entity
//! counters change.
//!
//! Every cast is one lookup, classified into a [`Transition`], followed by a
//! record write and an atomic counter delta. The two writes are not wrapped in
//! a transaction; the store's per-key uniqueness constraint and conditional
//! record updates are what keep concurrent casts from the same user honest.
//! When one of those guards trips, the cast is re-read and re-classified, up
//! to a bounded number of attempts.

use std::{collections::HashMap, sync::Arc};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  store::{InsertOutcome, VoteStore},
  vote::{
    CounterDelta, Direction, TargetRef, TargetType, VoteCounts, VoteKey, VoteRecord,
  },
};

/// How many times a cast is re-read after losing a race before giving up.
pub const DEFAULT_RETRY_LIMIT: u32 = 3;

// ─── Transition ──────────────────────────────────────────────────────────────

/// What a cast does, decided once from the existing record (if any).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
  /// No record yet: create one.
  Create,
  /// Same direction as the existing record: remove it.
  ToggleOff(VoteRecord),
  /// Opposite direction: flip the existing record.
  Switch(VoteRecord),
}

impl Transition {
  pub fn classify(existing: Option<VoteRecord>, direction: Direction) -> Self {
    match existing {
      None => Transition::Create,
      Some(record) if record.direction == direction => Transition::ToggleOff(record),
      Some(record) => Transition::Switch(record),
    }
  }

  fn name(&self) -> &'static str {
    match self {
      Transition::Create => "create",
      Transition::ToggleOff(_) => "toggle-off",
      Transition::Switch(_) => "switch",
    }
  }
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// The target's fresh counters and the caller's vote after a cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
  pub target:    TargetRef,
  pub counts:    VoteCounts,
  pub user_vote: Option<Direction>,
}

impl VoteOutcome {
  pub fn score(&self) -> i64 { self.counts.score() }
}

enum Step {
  Done(VoteOutcome),
  Retry,
}

// ─── Aggregator ──────────────────────────────────────────────────────────────

/// Applies vote casts against a [`VoteStore`].
///
/// Cloning is cheap; the store is reference-counted.
pub struct VoteAggregator<S> {
  store:       Arc<S>,
  retry_limit: u32,
}

impl<S> Clone for VoteAggregator<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), retry_limit: self.retry_limit }
  }
}

impl<S: VoteStore> VoteAggregator<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store, retry_limit: DEFAULT_RETRY_LIMIT }
  }

  pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
    self.retry_limit = retry_limit;
    self
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  /// Cast `direction` on `target` as `user_id`.
  ///
  /// - no existing vote: record it and count it;
  /// - same direction again: remove the vote and uncount it;
  /// - other direction: flip the vote and move the count across.
  ///
  /// Decrements never take a counter below zero.
  pub async fn cast_vote(
    &self,
    user_id: Uuid,
    target: TargetRef,
    direction: Direction,
  ) -> Result<VoteOutcome> {
    if self.counts(target).await?.is_none() {
      return Err(Error::NotFound(target));
    }

    let key = VoteKey::new(user_id, target);

    for attempt in 0..=self.retry_limit {
      let existing = self.find_vote(key).await?;
      let transition = Transition::classify(existing, direction);
      debug!(
        %user_id,
        %target,
        ?direction,
        transition = transition.name(),
        attempt,
        "casting vote"
      );

      let step = match transition {
        Transition::Create => self.create(key, direction).await?,
        Transition::ToggleOff(existing) => self.toggle_off(existing).await?,
        Transition::Switch(existing) => self.switch(existing, direction).await?,
      };

      match step {
        Step::Done(outcome) => return Ok(outcome),
        Step::Retry => {
          warn!(%user_id, %target, attempt, "vote raced a concurrent cast, re-reading");
        }
      }
    }

    Err(Error::Contention(target))
  }

  /// The direction of `user_id`'s vote on `target`, if any.
  pub async fn get_user_vote(
    &self,
    user_id: Uuid,
    target: TargetRef,
  ) -> Result<Option<Direction>> {
    Ok(
      self
        .find_vote(VoteKey::new(user_id, target))
        .await?
        .map(|record| record.direction),
    )
  }

  /// `user_id`'s votes across many targets of one type, fetched with a single
  /// store query. Targets without a vote are absent from the map.
  pub async fn get_user_votes(
    &self,
    user_id: Uuid,
    target_type: TargetType,
    target_ids: &[Uuid],
  ) -> Result<HashMap<Uuid, Direction>> {
    if target_ids.is_empty() {
      return Ok(HashMap::new());
    }

    let records = self
      .store
      .find_votes(user_id, target_type, target_ids)
      .await
      .map_err(Error::storage)?;

    Ok(
      records
        .into_iter()
        .filter(|r| r.target.target_type == target_type)
        .map(|r| (r.target.target_id, r.direction))
        .collect(),
    )
  }

  // ── Transitions ───────────────────────────────────────────────────────────

  async fn create(&self, key: VoteKey, direction: Direction) -> Result<Step> {
    let record = VoteRecord::new(key, direction);

    match self.store.insert_vote(&record).await.map_err(Error::storage)? {
      InsertOutcome::Inserted => {
        let counts = self.apply(key.target, CounterDelta::cast(direction)).await?;
        Ok(Step::Done(self.outcome(key.target, counts, Some(direction))))
      }
      InsertOutcome::Conflict => {
        // A concurrent cast for the same key got in first. If it recorded the
        // same direction it already expressed this cast; anything else is
        // re-read and handled as a switch.
        match self.find_vote(key).await? {
          Some(current) if current.direction == direction => {
            let counts = self.current_counts(key.target).await?;
            Ok(Step::Done(self.outcome(key.target, counts, Some(direction))))
          }
          _ => Ok(Step::Retry),
        }
      }
    }
  }

  async fn toggle_off(&self, existing: VoteRecord) -> Result<Step> {
    let key = existing.key();

    let deleted = self
      .store
      .delete_vote(key, existing.direction)
      .await
      .map_err(Error::storage)?;
    if deleted {
      let counts = self
        .apply(key.target, CounterDelta::withdraw(existing.direction))
        .await?;
      return Ok(Step::Done(self.outcome(key.target, counts, None)));
    }

    // Someone else removed it first; the vote is gone either way.
    if self.find_vote(key).await?.is_none() {
      let counts = self.current_counts(key.target).await?;
      return Ok(Step::Done(self.outcome(key.target, counts, None)));
    }
    Ok(Step::Retry)
  }

  async fn switch(&self, existing: VoteRecord, direction: Direction) -> Result<Step> {
    let key = existing.key();

    let updated = self
      .store
      .update_vote_direction(key, existing.direction, direction)
      .await
      .map_err(Error::storage)?;
    if !updated {
      return Ok(Step::Retry);
    }

    let counts = self
      .apply(key.target, CounterDelta::switch(existing.direction, direction))
      .await?;
    Ok(Step::Done(self.outcome(key.target, counts, Some(direction))))
  }

  // ── Store helpers ─────────────────────────────────────────────────────────

  fn outcome(
    &self,
    target: TargetRef,
    counts: VoteCounts,
    user_vote: Option<Direction>,
  ) -> VoteOutcome {
    VoteOutcome { target, counts, user_vote }
  }

  async fn find_vote(&self, key: VoteKey) -> Result<Option<VoteRecord>> {
    self.store.find_vote(key).await.map_err(Error::storage)
  }

  async fn counts(&self, target: TargetRef) -> Result<Option<VoteCounts>> {
    self.store.find_counts(target).await.map_err(Error::storage)
  }

  async fn current_counts(&self, target: TargetRef) -> Result<VoteCounts> {
    self.counts(target).await?.ok_or(Error::NotFound(target))
  }

  async fn apply(&self, target: TargetRef, delta: CounterDelta) -> Result<VoteCounts> {
    self
      .store
      .apply_delta(target, delta)
      .await
      .map_err(Error::storage)?
      .ok_or(Error::NotFound(target))
  }
}
