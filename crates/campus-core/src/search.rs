//! Keyword search over votable content.
//!
//! Matching is a case-insensitive substring test done by the store; ordering
//! uses the vote score first and the [`relevance`] heuristic after it.

use serde::Serialize;

use crate::{
  Error, Result,
  content::{Answer, Question, Topic, Votable},
};

/// Prefixes shorter than this yield no suggestions.
pub const MIN_SUGGESTION_LEN: usize = 2;
/// Suggestions fetched per content kind.
pub const SUGGESTIONS_PER_KIND: usize = 5;
pub const MAX_SUGGESTIONS: usize = 8;
/// Top comments returned when no usable `limit` is given.
pub const DEFAULT_TOP_COMMENTS: usize = 3;

/// Everything a keyword matched, unranked.
#[derive(Debug, Clone, Default)]
pub struct SearchMatches {
  /// Matched on name or description.
  pub topics:    Vec<Topic>,
  /// Matched on title or problem description.
  pub questions: Vec<Question>,
  /// Matched on content.
  pub answers:   Vec<Answer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
  Topic,
  Question,
}

/// An autocomplete entry: a topic name or a question title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
  pub text: String,
  #[serde(rename = "type")]
  pub kind: SuggestionKind,
}

/// The trimmed search keyword, or an error if there is none.
pub fn search_query(raw: Option<&str>) -> Result<&str> {
  match raw.map(str::trim) {
    Some(q) if !q.is_empty() => Ok(q),
    _ => Err(Error::InvalidInput("search query is required".into())),
  }
}

/// The trimmed prefix if it is long enough to suggest from.
pub fn suggestion_prefix(raw: Option<&str>) -> Option<&str> {
  raw
    .map(str::trim)
    .filter(|p| p.chars().count() >= MIN_SUGGESTION_LEN)
}

/// How well `query` matches a title and description.
///
/// An exact title match scores 100. A title containing the query scores 50,
/// plus 25 if the title starts with it. A description containing the query
/// adds 20. Comparison ignores case.
pub fn relevance(title: &str, description: &str, query: &str) -> u32 {
  let query = query.to_lowercase();
  let title = title.to_lowercase();
  let description = description.to_lowercase();

  let mut score = 0;
  if title == query {
    score += 100;
  } else if title.contains(&query) {
    score += 50;
    if title.starts_with(&query) {
      score += 25;
    }
  }
  if description.contains(&query) {
    score += 20;
  }
  score
}

/// Answer count and mean answer score under a topic or question.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentStats {
  pub comment_count: usize,
  /// Mean score, rounded half up to one decimal place; 0 with no answers.
  pub avg_rating:    f64,
}

impl CommentStats {
  pub fn from_answers(answers: &[Answer]) -> Self {
    if answers.is_empty() {
      return Self::default();
    }
    let total: i64 = answers.iter().map(Votable::score).sum();
    let mean = total as f64 / answers.len() as f64;
    Self {
      comment_count: answers.len(),
      avg_rating:    (mean * 10.0 + 0.5).floor() / 10.0,
    }
  }
}
