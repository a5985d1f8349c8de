//! Handlers for `/topics` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/topics` | Ranked by score, newest first on ties |
//! | `POST` | `/topics` | Body: `{"name":"...","description":"..."}`; 409 on duplicate name |
//! | `GET`  | `/topics/:id` | 404 if not found |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use campus_core::{
  Error,
  content::{NewTopic, Topic},
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

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /topics`
pub async fn list<S: CampusStore>(
  State(state): State<ApiState<S>>,
  MaybeUser(user): MaybeUser,
) -> Result<Json<Vec<Scored<Topic>>>, ApiError> {
  let topics = state.store.list_topics().await.map_err(ApiError::content)?;
  Ok(Json(ranked(&state, user, topics).await?))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  #[serde(default)]
  pub name:        String,
  #[serde(default)]
  pub description: String,
}

/// `POST /topics`: returns 201 + the stored topic.
pub async fn create<S: CampusStore>(
  State(state): State<ApiState<S>>,
  CurrentUser(user_id): CurrentUser,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let topic = state
    .store
    .create_topic(NewTopic {
      name:        body.name,
      description: body.description,
      created_by:  user_id,
    })
    .await
    .map_err(ApiError::content)?;
  Ok((StatusCode::CREATED, Json(Scored::anonymous(topic))))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /topics/:id`
pub async fn get_one<S: CampusStore>(
  State(state): State<ApiState<S>>,
  MaybeUser(user): MaybeUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Scored<Topic>>, ApiError> {
  let topic = state
    .store
    .get_topic(id)
    .await
    .map_err(ApiError::content)?
    .ok_or_else(|| ApiError::from(Error::NotFound(TargetRef::topic(id))))?;
  Ok(Json(with_user_vote(&state, user, topic).await?))
}
