//! Handlers for `/search` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/search?q=...` | 400 on a blank `q` |
//! | `GET`  | `/search/top-comments/:topic_id[?limit=N]` | Answers under a topic, best first |
//! | `GET`  | `/search/suggestions?q=...` | Autocomplete; empty below two characters |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use campus_core::{
  content::{Answer, Question, Topic, rank_by_score},
  search::{
    CommentStats, DEFAULT_TOP_COMMENTS, MAX_SUGGESTIONS, SUGGESTIONS_PER_KIND, Suggestion,
    relevance, search_query, suggestion_prefix,
  },
  store::ContentStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  ApiState, CampusStore,
  error::ApiError,
  identity::MaybeUser,
  view::{Scored, ranked, user_votes, vote_of},
};

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  pub q: Option<String>,
}

// ─── Search ───────────────────────────────────────────────────────────────────

/// A search hit with its comment statistics and keyword relevance.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hit<T> {
  #[serde(flatten)]
  pub item:            Scored<T>,
  #[serde(flatten)]
  pub stats:           CommentStats,
  pub relevance_score: u32,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
  pub topics:    Vec<Hit<Topic>>,
  pub questions: Vec<Hit<Question>>,
  pub answers:   Vec<Scored<Answer>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
  pub query:         String,
  pub results:       SearchResults,
  pub total_results: usize,
}

/// `GET /search?q=...`
///
/// Topics rank by score, then relevance, then average answer rating, and
/// carry the caller's vote. Questions rank by relevance, then rating.
/// Answers rank by score.
pub async fn search<S: CampusStore>(
  State(state): State<ApiState<S>>,
  MaybeUser(user): MaybeUser,
  Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
  let query = search_query(params.q.as_deref())?.to_owned();
  let found = state
    .store
    .search(query.clone())
    .await
    .map_err(ApiError::content)?;

  let votes = user_votes(&state, user, &found.topics).await?;
  let mut topics = Vec::with_capacity(found.topics.len());
  for topic in found.topics {
    let answers = state
      .store
      .list_topic_answers(topic.topic_id)
      .await
      .map_err(ApiError::content)?;
    let vote = vote_of(&votes, &topic);
    topics.push(Hit {
      stats:           CommentStats::from_answers(&answers),
      relevance_score: relevance(&topic.name, &topic.description, &query),
      item:            Scored::new(topic, vote),
    });
  }
  topics.sort_by(|a, b| {
    b.item
      .score
      .cmp(&a.item.score)
      .then(b.relevance_score.cmp(&a.relevance_score))
      .then(b.stats.avg_rating.total_cmp(&a.stats.avg_rating))
  });

  let mut questions = Vec::with_capacity(found.questions.len());
  for question in found.questions {
    let answers = state
      .store
      .list_answers(question.question_id)
      .await
      .map_err(ApiError::content)?;
    questions.push(Hit {
      stats:           CommentStats::from_answers(&answers),
      relevance_score: relevance(&question.title, &question.problem_description, &query),
      item:            Scored::anonymous(question),
    });
  }
  questions.sort_by(|a, b| {
    b.relevance_score
      .cmp(&a.relevance_score)
      .then(b.stats.avg_rating.total_cmp(&a.stats.avg_rating))
  });

  let mut answers = found.answers;
  rank_by_score(&mut answers);
  let answers: Vec<Scored<Answer>> = answers.into_iter().map(Scored::anonymous).collect();

  let total_results = topics.len() + questions.len() + answers.len();
  tracing::debug!(%query, total_results, "search");

  Ok(Json(SearchResponse {
    query,
    results: SearchResults { topics, questions, answers },
    total_results,
  }))
}

// ─── Top comments ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct TopCommentsParams {
  /// Anything that is not a positive integer falls back to the default.
  pub limit: Option<String>,
}

impl TopCommentsParams {
  fn limit(&self) -> usize {
    self
      .limit
      .as_deref()
      .and_then(|l| l.trim().parse::<usize>().ok())
      .filter(|&n| n > 0)
      .unwrap_or(DEFAULT_TOP_COMMENTS)
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopComments {
  pub top_comments:   Vec<Scored<Answer>>,
  pub total_comments: usize,
  pub all_comments:   Vec<Scored<Answer>>,
}

/// `GET /search/top-comments/:topic_id`
///
/// An unknown topic simply has no comments.
pub async fn top_comments<S: CampusStore>(
  State(state): State<ApiState<S>>,
  MaybeUser(user): MaybeUser,
  Path(topic_id): Path<Uuid>,
  Query(params): Query<TopCommentsParams>,
) -> Result<Json<TopComments>, ApiError> {
  let answers = state
    .store
    .list_topic_answers(topic_id)
    .await
    .map_err(ApiError::content)?;
  let all_comments = ranked(&state, user, answers).await?;

  Ok(Json(TopComments {
    top_comments:   all_comments.iter().take(params.limit()).cloned().collect(),
    total_comments: all_comments.len(),
    all_comments,
  }))
}

// ─── Suggestions ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Suggestions {
  pub suggestions: Vec<Suggestion>,
}

/// `GET /search/suggestions?q=...`
pub async fn suggestions<S: CampusStore>(
  State(state): State<ApiState<S>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Suggestions>, ApiError> {
  let Some(prefix) = suggestion_prefix(params.q.as_deref()) else {
    return Ok(Json(Suggestions { suggestions: Vec::new() }));
  };

  let mut suggestions = state
    .store
    .suggest(prefix.to_owned(), SUGGESTIONS_PER_KIND)
    .await
    .map_err(ApiError::content)?;
  suggestions.truncate(MAX_SUGGESTIONS);
  Ok(Json(Suggestions { suggestions }))
}
