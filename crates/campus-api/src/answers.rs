//! Handlers for `/answers` endpoints.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use campus_core::{
  content::{Answer, NewAnswer},
  store::ContentStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  ApiState, CampusStore,
  error::ApiError,
  identity::{CurrentUser, MaybeUser},
  view::{Scored, ranked},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  pub question_id: Uuid,
  #[serde(default)]
  pub content:     String,
}

/// `POST /answers`: 201, or 404 if the question is missing.
pub async fn create<S: CampusStore>(
  State(state): State<ApiState<S>>,
  CurrentUser(user_id): CurrentUser,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let answer = state
    .store
    .create_answer(NewAnswer {
      question_id: body.question_id,
      content:     body.content,
      author_id:   user_id,
    })
    .await
    .map_err(ApiError::content)?;
  Ok((StatusCode::CREATED, Json(Scored::anonymous(answer))))
}

/// `GET /answers/question/:question_id`, ranked by score.
pub async fn list_by_question<S: CampusStore>(
  State(state): State<ApiState<S>>,
  MaybeUser(user): MaybeUser,
  Path(question_id): Path<Uuid>,
) -> Result<Json<Vec<Scored<Answer>>>, ApiError> {
  let answers = state
    .store
    .list_answers(question_id)
    .await
    .map_err(ApiError::content)?;
  Ok(Json(ranked(&state, user, answers).await?))
}
