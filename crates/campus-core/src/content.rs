//! Votable content: topics, the questions asked under them, and answers.
//!
//! Each entity owns its own [`VoteCounts`], but only the vote aggregator may
//! change them.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  vote::{TargetRef, VoteCounts},
};

// ─── Votable ─────────────────────────────────────────────────────────────────

/// Anything that carries vote counters.
pub trait Votable {
  fn target(&self) -> TargetRef;
  fn counts(&self) -> VoteCounts;
  fn created_at(&self) -> DateTime<Utc>;

  fn score(&self) -> i64 { self.counts().score() }
}

/// Sort by score, highest first; equal scores put the newest first.
pub fn rank_by_score<T: Votable>(items: &mut [T]) {
  items.sort_by_key(|item| (Reverse(item.score()), Reverse(item.created_at())));
}

// ─── Entities ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
  pub topic_id:    Uuid,
  pub name:        String,
  pub description: String,
  pub created_by:  Uuid,
  #[serde(flatten)]
  pub counts:      VoteCounts,
  pub created_at:  DateTime<Utc>,
}

/// A structured question: what is wrong, what was tried, where it broke, and
/// what kind of help is wanted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
  pub question_id:         Uuid,
  pub topic_id:            Uuid,
  pub title:               String,
  pub problem_description: String,
  pub attempted_solutions: String,
  pub failure_point:       String,
  pub solution_needed:     String,
  pub additional_details:  String,
  pub author_id:           Uuid,
  #[serde(flatten)]
  pub counts:              VoteCounts,
  pub created_at:          DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
  pub answer_id:   Uuid,
  pub question_id: Uuid,
  pub content:     String,
  pub author_id:   Uuid,
  #[serde(flatten)]
  pub counts:      VoteCounts,
  pub created_at:  DateTime<Utc>,
}

impl Votable for Topic {
  fn target(&self) -> TargetRef { TargetRef::topic(self.topic_id) }
  fn counts(&self) -> VoteCounts { self.counts }
  fn created_at(&self) -> DateTime<Utc> { self.created_at }
}

impl Votable for Question {
  fn target(&self) -> TargetRef { TargetRef::question(self.question_id) }
  fn counts(&self) -> VoteCounts { self.counts }
  fn created_at(&self) -> DateTime<Utc> { self.created_at }
}

impl Votable for Answer {
  fn target(&self) -> TargetRef { TargetRef::answer(self.answer_id) }
  fn counts(&self) -> VoteCounts { self.counts }
  fn created_at(&self) -> DateTime<Utc> { self.created_at }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

fn required(field: &str, value: &str) -> Result<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(Error::InvalidInput(format!("{field} is required")));
  }
  Ok(trimmed.to_owned())
}

#[derive(Debug, Clone)]
pub struct NewTopic {
  pub name:        String,
  pub description: String,
  pub created_by:  Uuid,
}

impl NewTopic {
  /// Trim every text field and reject blanks.
  pub fn normalize(self) -> Result<Self> {
    Ok(Self {
      name:        required("name", &self.name)?,
      description: required("description", &self.description)?,
      created_by:  self.created_by,
    })
  }
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
  pub topic_id:            Uuid,
  pub title:               String,
  pub problem_description: String,
  pub attempted_solutions: String,
  pub failure_point:       String,
  pub solution_needed:     String,
  pub additional_details:  Option<String>,
  pub author_id:           Uuid,
}

impl NewQuestion {
  pub fn normalize(self) -> Result<Self> {
    Ok(Self {
      topic_id:            self.topic_id,
      title:               required("title", &self.title)?,
      problem_description: required(
        "problem description",
        &self.problem_description,
      )?,
      attempted_solutions: required(
        "attempted solutions",
        &self.attempted_solutions,
      )?,
      failure_point:       required("failure point", &self.failure_point)?,
      solution_needed:     required("solution needed", &self.solution_needed)?,
      additional_details:  self
        .additional_details
        .map(|d| d.trim().to_owned()),
      author_id:           self.author_id,
    })
  }
}

#[derive(Debug, Clone)]
pub struct NewAnswer {
  pub question_id: Uuid,
  pub content:     String,
  pub author_id:   Uuid,
}

impl NewAnswer {
  pub fn normalize(self) -> Result<Self> {
    Ok(Self {
      question_id: self.question_id,
      content:     required("content", &self.content)?,
      author_id:   self.author_id,
    })
  }
}
