//! Vote targets, directions, records and counter arithmetic.
//!
//! A vote record ties one user to one target. The target's two counters are
//! never recomputed from records; they are adjusted by signed deltas, each
//! floored at zero.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Target ──────────────────────────────────────────────────────────────────

/// The kind of content a vote is cast on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetType {
  Topic,
  Question,
  Answer,
}

impl TargetType {
  pub const ALL: [TargetType; 3] =
    [TargetType::Topic, TargetType::Question, TargetType::Answer];

  pub fn as_str(self) -> &'static str {
    match self {
      TargetType::Topic => "Topic",
      TargetType::Question => "Question",
      TargetType::Answer => "Answer",
    }
  }
}

impl fmt::Display for TargetType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for TargetType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    TargetType::ALL
      .into_iter()
      .find(|t| t.as_str() == s)
      .ok_or_else(|| Error::InvalidInput(format!("invalid target type: {s:?}")))
  }
}

/// Identifies a single votable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetRef {
  pub target_type: TargetType,
  pub target_id:   Uuid,
}

impl TargetRef {
  pub fn new(target_type: TargetType, target_id: Uuid) -> Self {
    Self { target_type, target_id }
  }

  pub fn topic(id: Uuid) -> Self { Self::new(TargetType::Topic, id) }

  pub fn question(id: Uuid) -> Self { Self::new(TargetType::Question, id) }

  pub fn answer(id: Uuid) -> Self { Self::new(TargetType::Answer, id) }
}

impl fmt::Display for TargetRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.target_type, self.target_id)
  }
}

// ─── Direction ───────────────────────────────────────────────────────────────

/// Which way a vote points. On the wire, `1` is up and `-1` is down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i64")]
pub enum Direction {
  Up,
  Down,
}

impl From<Direction> for i8 {
  fn from(d: Direction) -> i8 {
    match d {
      Direction::Up => 1,
      Direction::Down => -1,
    }
  }
}

impl TryFrom<i64> for Direction {
  type Error = Error;

  fn try_from(v: i64) -> Result<Self> {
    match v {
      1 => Ok(Direction::Up),
      -1 => Ok(Direction::Down),
      other => Err(Error::InvalidInput(format!("invalid vote type: {other}"))),
    }
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// The unique key of a vote record: one active vote per user per target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoteKey {
  pub user_id: Uuid,
  pub target:  TargetRef,
}

impl VoteKey {
  pub fn new(user_id: Uuid, target: TargetRef) -> Self {
    Self { user_id, target }
  }
}

/// A user's currently active vote on a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRecord {
  pub vote_id:    Uuid,
  pub user_id:    Uuid,
  #[serde(flatten)]
  pub target:     TargetRef,
  pub direction:  Direction,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl VoteRecord {
  /// A fresh record for `key`, stamped now.
  pub fn new(key: VoteKey, direction: Direction) -> Self {
    let now = Utc::now();
    Self {
      vote_id: Uuid::new_v4(),
      user_id: key.user_id,
      target: key.target,
      direction,
      created_at: now,
      updated_at: now,
    }
  }

  pub fn key(&self) -> VoteKey { VoteKey::new(self.user_id, self.target) }
}

// ─── Counters ────────────────────────────────────────────────────────────────

/// The aggregate counters carried by every votable entity.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
pub struct VoteCounts {
  pub upvotes:   u64,
  pub downvotes: u64,
}

impl VoteCounts {
  pub fn new(upvotes: u64, downvotes: u64) -> Self {
    Self { upvotes, downvotes }
  }

  /// Net score; derived, never persisted.
  pub fn score(&self) -> i64 {
    self.upvotes as i64 - self.downvotes as i64
  }

  /// Apply `delta`, clamping each counter at zero.
  pub fn apply(self, delta: CounterDelta) -> Self {
    Self {
      upvotes:   floor_add(self.upvotes, delta.up),
      downvotes: floor_add(self.downvotes, delta.down),
    }
  }
}

fn floor_add(value: u64, delta: i64) -> u64 {
  if delta >= 0 {
    value.saturating_add(delta as u64)
  } else {
    value.saturating_sub(delta.unsigned_abs())
  }
}

/// A signed change to both counters, applied atomically by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterDelta {
  pub up:   i64,
  pub down: i64,
}

impl CounterDelta {
  fn on(direction: Direction, amount: i64) -> Self {
    match direction {
      Direction::Up => Self { up: amount, down: 0 },
      Direction::Down => Self { up: 0, down: amount },
    }
  }

  /// A new vote in `direction`.
  pub fn cast(direction: Direction) -> Self { Self::on(direction, 1) }

  /// Withdrawing a vote in `direction`.
  pub fn withdraw(direction: Direction) -> Self { Self::on(direction, -1) }

  /// Moving an existing vote from `from` to `to`.
  pub fn switch(from: Direction, to: Direction) -> Self {
    let w = Self::withdraw(from);
    let c = Self::cast(to);
    Self { up: w.up + c.up, down: w.down + c.down }
  }
}
