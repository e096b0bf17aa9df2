//! Post-it REST routes.
//!
//! The durable write path for the canvas: the client persists here first,
//! then notifies peers over the websocket channel.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::routes::auth::AuthUser;
use crate::services::postit::{self, NewPostit, PostitError, PostitRow, PostitUpdate};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostitResponse {
    pub id: Uuid,
    pub board_id: Uuid,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: String,
    pub z_index: i32,
    pub created_by: Uuid,
    pub last_modified_by: Option<Uuid>,
    pub is_active: bool,
}

fn to_response(row: PostitRow) -> PostitResponse {
    PostitResponse {
        id: row.id,
        board_id: row.board_id,
        text: row.text,
        x: row.x,
        y: row.y,
        width: row.width,
        height: row.height,
        color: row.color,
        z_index: row.z_index,
        created_by: row.created_by,
        last_modified_by: row.last_modified_by,
        is_active: row.is_active,
    }
}

pub(crate) fn postit_error_to_status(err: PostitError) -> StatusCode {
    match err {
        PostitError::NotFound(_) | PostitError::BoardNotFound(_) => StatusCode::NOT_FOUND,
        PostitError::Forbidden(_) => StatusCode::FORBIDDEN,
        PostitError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostitBody {
    pub board_id: Uuid,
    #[serde(default)]
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub color: Option<String>,
    pub z_index: Option<i32>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostitBody {
    pub text: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub color: Option<String>,
    pub z_index: Option<i32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPostitsQuery {
    pub board_id: Uuid,
}

/// `POST /api/postits` — create a post-it on an accessible board.
pub async fn create_postit(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreatePostitBody>,
) -> Result<(StatusCode, Json<PostitResponse>), StatusCode> {
    let input = NewPostit {
        board_id: body.board_id,
        text: body.text,
        x: body.x,
        y: body.y,
        width: body.width,
        height: body.height,
        color: body.color,
        z_index: body.z_index,
    };
    let row = postit::create_postit(&state.pool, input, auth.identity.user_id)
        .await
        .map_err(postit_error_to_status)?;
    Ok((StatusCode::CREATED, Json(to_response(row))))
}

/// `GET /api/postits?boardId=…` — list active post-its of a board.
pub async fn list_postits(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListPostitsQuery>,
) -> Result<Json<Vec<PostitResponse>>, StatusCode> {
    let rows = postit::list_postits(&state.pool, query.board_id, auth.identity.user_id)
        .await
        .map_err(postit_error_to_status)?;
    Ok(Json(rows.into_iter().map(to_response).collect()))
}

/// `GET /api/postits/:id` — fetch one post-it.
pub async fn get_postit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(postit_id): Path<Uuid>,
) -> Result<Json<PostitResponse>, StatusCode> {
    let row = postit::get_postit(&state.pool, postit_id, auth.identity.user_id)
        .await
        .map_err(postit_error_to_status)?;
    Ok(Json(to_response(row)))
}

/// `PUT /api/postits/:id` — partial update; stamps the caller as last
/// modifier.
pub async fn update_postit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(postit_id): Path<Uuid>,
    Json(body): Json<UpdatePostitBody>,
) -> Result<Json<PostitResponse>, StatusCode> {
    let update = PostitUpdate {
        text: body.text,
        x: body.x,
        y: body.y,
        width: body.width,
        height: body.height,
        color: body.color,
        z_index: body.z_index,
    };
    let row = postit::update_postit(&state.pool, postit_id, update, auth.identity.user_id)
        .await
        .map_err(postit_error_to_status)?;
    Ok(Json(to_response(row)))
}

/// `DELETE /api/postits/:id` — soft-delete.
pub async fn delete_postit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(postit_id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    postit::delete_postit(&state.pool, postit_id, auth.identity.user_id)
        .await
        .map_err(postit_error_to_status)?;
    Ok(StatusCode::NO_CONTENT)
}
