//! Handlers for `/questions` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/questions` | Body: [`CreateBody`]; 404 if the topic is missing |
//! | `GET`  | `/questions/topic/:topic_id` | Ranked by score |
//! | `GET`  | `/questions/:id` | 404 if not found |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use campus_core::{
  Error,
  content::{NewQuestion, Question},
  store::ContentStore,
  vote::TargetRef,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  ApiState, CampusStore,
  error::ApiError,
  identity::{CurrentUser, MaybeUser},
  view::{Scored, ranked, with_user_vote},
};

/// JSON body accepted by `POST /questions`. Missing text fields are treated
/// as blank and rejected with 400.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  pub topic_id:            Uuid,
  #[serde(default)]
  pub title:               String,
  #[serde(default)]
  pub problem_description: String,
  #[serde(default)]
  pub attempted_solutions: String,
  #[serde(default)]
  pub failure_point:       String,
  #[serde(default)]
  pub solution_needed:     String,
  pub additional_details:  Option<String>,
}

/// `POST /questions`: returns 201 + the stored question.
pub async fn create<S: CampusStore>(
  State(state): State<ApiState<S>>,
  CurrentUser(user_id): CurrentUser,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let question = state
    .store
    .create_question(NewQuestion {
      topic_id:            body.topic_id,
      title:               body.title,
      problem_description: body.problem_description,
      attempted_solutions: body.attempted_solutions,
      failure_point:       body.failure_point,
      solution_needed:     body.solution_needed,
      additional_details:  body.additional_details,
      author_id:           user_id,
    })
    .await
    .map_err(ApiError::content)?;
  Ok((StatusCode::CREATED, Json(Scored::anonymous(question))))
}

/// `GET /questions/topic/:topic_id`
pub async fn list_by_topic<S: CampusStore>(
  State(state): State<ApiState<S>>,
  MaybeUser(user): MaybeUser,
  Path(topic_id): Path<Uuid>,
) -> Result<Json<Vec<Scored<Question>>>, ApiError> {
  let questions = state
    .store
    .list_questions(topic_id)
    .await
    .map_err(ApiError::content)?;
  Ok(Json(ranked(&state, user, questions).await?))
}

/// `GET /questions/:id`
pub async fn get_one<S: CampusStore>(
  State(state): State<ApiState<S>>,
  MaybeUser(user): MaybeUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Scored<Question>>, ApiError> {
  let question = state
    .store
    .get_question(id)
    .await
    .map_err(ApiError::content)?
    .ok_or_else(|| ApiError::from(Error::NotFound(TargetRef::question(id))))?;
  Ok(Json(with_user_vote(&state, user, question).await?))
}
