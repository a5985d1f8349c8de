//! Response shapes for votable content.
//!
//! Every entity goes out with its derived `score`. When the caller is
//! identified, `userVote` is attached too (`1`, `-1` or `null`); for anonymous
//! callers the field is omitted.

use std::collections::HashMap;

use campus_core::{
  content::{Answer, Question, Topic, Votable, rank_by_score},
  vote::{Direction, TargetRef, VoteCounts},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{ApiState, CampusStore, error::ApiError};

/// An entity plus its score and, optionally, the caller's vote.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scored<T> {
  #[serde(flatten)]
  pub item:      T,
  pub score:     i64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub user_vote: Option<Option<Direction>>,
}

impl<T: Votable> Scored<T> {
  pub fn new(item: T, user_vote: Option<Option<Direction>>) -> Self {
    Self { score: item.score(), item, user_vote }
  }

  pub fn anonymous(item: T) -> Self { Self::new(item, None) }
}

/// Any of the three votable entities.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Content {
  Topic(Topic),
  Question(Question),
  Answer(Answer),
}

impl Votable for Content {
  fn target(&self) -> TargetRef {
    match self {
      Content::Topic(t) => t.target(),
      Content::Question(q) => q.target(),
      Content::Answer(a) => a.target(),
    }
  }

  fn counts(&self) -> VoteCounts {
    match self {
      Content::Topic(t) => t.counts,
      Content::Question(q) => q.counts,
      Content::Answer(a) => a.counts,
    }
  }

  fn created_at(&self) -> DateTime<Utc> {
    match self {
      Content::Topic(t) => t.created_at,
      Content::Question(q) => q.created_at,
      Content::Answer(a) => a.created_at,
    }
  }
}

/// Attach the caller's vote on a single entity.
pub async fn with_user_vote<S, T>(
  state: &ApiState<S>,
  user: Option<Uuid>,
  item: T,
) -> Result<Scored<T>, ApiError>
where
  S: CampusStore,
  T: Votable + Send,
{
  let user_vote = match user {
    Some(user_id) => Some(state.votes.get_user_vote(user_id, item.target()).await?),
    None => None,
  };
  Ok(Scored::new(item, user_vote))
}

/// The caller's votes on `items`, fetched with one batch lookup. `None` for
/// anonymous callers.
pub async fn user_votes<S, T>(
  state: &ApiState<S>,
  user: Option<Uuid>,
  items: &[T],
) -> Result<Option<HashMap<Uuid, Direction>>, ApiError>
where
  S: CampusStore,
  T: Votable + Sync,
{
  let Some(user_id) = user else {
    return Ok(None);
  };
  let Some(target_type) = items.first().map(|i| i.target().target_type) else {
    return Ok(Some(HashMap::new()));
  };
  let ids: Vec<Uuid> = items.iter().map(|i| i.target().target_id).collect();
  Ok(Some(state.votes.get_user_votes(user_id, target_type, &ids).await?))
}

/// Look up `item`'s entry in a [`user_votes`] result.
pub fn vote_of<T: Votable>(
  votes: &Option<HashMap<Uuid, Direction>>,
  item: &T,
) -> Option<Option<Direction>> {
  votes
    .as_ref()
    .map(|v| v.get(&item.target().target_id).copied())
}

/// Rank `items` by score and attach the caller's votes.
pub async fn ranked<S, T>(
  state: &ApiState<S>,
  user: Option<Uuid>,
  mut items: Vec<T>,
) -> Result<Vec<Scored<T>>, ApiError>
where
  S: CampusStore,
  T: Votable + Send + Sync,
{
  rank_by_score(&mut items);
  let votes = user_votes(state, user, &items).await?;

  Ok(
    items
      .into_iter()
      .map(|item| {
        let vote = vote_of(&votes, &item);
        Scored::new(item, vote)
      })
      .collect(),
  )
}
