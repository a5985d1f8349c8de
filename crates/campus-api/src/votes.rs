//! Handler for `POST /votes`.
//!
//! Body: `{"targetId": "<uuid>", "targetType": "Topic|Question|Answer",
//! "voteType": 1|-1}`. Fields arrive as raw JSON values and are checked by
//! hand, so every malformed body is a 400 with a reason, rejected before the
//! store is touched.

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use campus_core::{
  store::ContentStore,
  vote::{Direction, TargetRef, TargetType},
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{
  ApiState, CampusStore,
  error::ApiError,
  identity::CurrentUser,
  view::{Content, Scored},
};

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VoteBody {
  pub target_id:   Option<Value>,
  pub target_type: Option<Value>,
  pub vote_type:   Option<Value>,
}

/// `null` counts as absent.
fn present(field: Option<Value>) -> Option<Value> {
  field.filter(|v| !v.is_null())
}

fn parse_direction(value: &Value) -> Result<Direction, ApiError> {
  // `1.0` is as good as `1`.
  let whole = value
    .as_i64()
    .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64));
  match whole {
    Some(n) => Ok(Direction::try_from(n)?),
    None => Err(ApiError::BadRequest(format!("invalid vote type: {value}"))),
  }
}

impl VoteBody {
  /// Validate into a target and direction.
  pub fn parse(self) -> Result<(TargetRef, Direction), ApiError> {
    let (Some(id), Some(kind), Some(vote)) = (
      present(self.target_id),
      present(self.target_type),
      present(self.vote_type),
    ) else {
      return Err(ApiError::BadRequest("missing required fields".into()));
    };

    let target_type: TargetType = kind
      .as_str()
      .ok_or_else(|| ApiError::BadRequest(format!("invalid target type: {kind}")))?
      .parse()?;
    let direction = parse_direction(&vote)?;
    let target_id = id
      .as_str()
      .and_then(|s| Uuid::parse_str(s).ok())
      .ok_or_else(|| ApiError::BadRequest(format!("invalid target id: {id}")))?;

    Ok((TargetRef::new(target_type, target_id), direction))
  }
}

/// Re-read the voted entity so the response carries every field the listing
/// endpoints do.
async fn load<S: CampusStore>(
  state: &ApiState<S>,
  target: TargetRef,
) -> Result<Content, ApiError> {
  let store = &state.store;
  let found = match target.target_type {
    TargetType::Topic => store
      .get_topic(target.target_id)
      .await
      .map_err(ApiError::content)?
      .map(Content::Topic),
    TargetType::Question => store
      .get_question(target.target_id)
      .await
      .map_err(ApiError::content)?
      .map(Content::Question),
    TargetType::Answer => store
      .get_answer(target.target_id)
      .await
      .map_err(ApiError::content)?
      .map(Content::Answer),
  };
  found.ok_or_else(|| ApiError::NotFound(format!("{target} not found")))
}

/// `POST /votes`: create, toggle off or switch the caller's vote.
pub async fn cast<S: CampusStore>(
  State(state): State<ApiState<S>>,
  CurrentUser(user_id): CurrentUser,
  body: Result<Json<VoteBody>, JsonRejection>,
) -> Result<Json<Scored<Content>>, ApiError> {
  let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  let (target, direction) = body.parse()?;

  let outcome = state.votes.cast_vote(user_id, target, direction).await?;
  tracing::info!(
    %user_id,
    %target,
    user_vote = ?outcome.user_vote,
    upvotes = outcome.counts.upvotes,
    downvotes = outcome.counts.downvotes,
    "vote cast"
  );

  let content = load(&state, target).await?;
  Ok(Json(Scored::new(content, Some(outcome.user_vote))))
}
