//! Board REST routes.
//!
//! Every mutating handler runs the access gate before the write: plain
//! membership for reads, ownership for update/share/delete. Access-denied
//! (403) and not-found (404) are distinct outcomes at this layer.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::routes::auth::AuthUser;
use crate::services::board::{self, BoardRow, BoardUpdate};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner: Uuid,
    pub shared_with: Vec<Uuid>,
    pub is_active: bool,
    pub background_color: String,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub show_grid: bool,
    pub grid_size: f64,
}

fn to_response(row: BoardRow) -> BoardResponse {
    BoardResponse {
        id: row.id,
        name: row.name,
        description: row.description,
        owner: row.owner_id,
        shared_with: row.shared_with,
        is_active: row.is_active,
        background_color: row.background_color,
        canvas_width: row.canvas_width,
        canvas_height: row.canvas_height,
        show_grid: row.show_grid,
        grid_size: row.grid_size,
    }
}

pub(crate) fn board_error_to_status(err: board::BoardError) -> StatusCode {
    match err {
        board::BoardError::NotFound(_) => StatusCode::NOT_FOUND,
        board::BoardError::Forbidden(_) => StatusCode::FORBIDDEN,
        board::BoardError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBoardBody {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBoardBody {
    pub name: Option<String>,
    pub description: Option<String>,
    pub background_color: Option<String>,
    pub canvas_width: Option<f64>,
    pub canvas_height: Option<f64>,
    pub show_grid: Option<bool>,
    pub grid_size: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareBoardBody {
    pub user_ids: Vec<Uuid>,
}

/// `POST /api/boards` — create a board owned by the caller.
pub async fn create_board(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateBoardBody>,
) -> Result<(StatusCode, Json<BoardResponse>), StatusCode> {
    let row = board::create_board(&state.pool, &body.name, body.description.as_deref(), auth.identity.user_id)
        .await
        .map_err(board_error_to_status)?;
    Ok((StatusCode::CREATED, Json(to_response(row))))
}

/// `GET /api/boards` — list boards the caller owns or is shared on.
pub async fn list_boards(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<BoardResponse>>, StatusCode> {
    let rows = board::list_boards(&state.pool, auth.identity.user_id)
        .await
        .map_err(board_error_to_status)?;
    Ok(Json(rows.into_iter().map(to_response).collect()))
}

/// `GET /api/boards/:id` — fetch one board.
pub async fn get_board(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(board_id): Path<Uuid>,
) -> Result<Json<BoardResponse>, StatusCode> {
    let row = board::get_board(&state.pool, board_id, auth.identity.user_id)
        .await
        .map_err(board_error_to_status)?;
    Ok(Json(to_response(row)))
}

/// `PUT /api/boards/:id` — update board metadata and canvas settings.
/// Owner only.
pub async fn update_board(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(board_id): Path<Uuid>,
    Json(body): Json<UpdateBoardBody>,
) -> Result<Json<BoardResponse>, StatusCode> {
    let update = BoardUpdate {
        name: body.name,
        description: body.description,
        background_color: body.background_color,
        canvas_width: body.canvas_width,
        canvas_height: body.canvas_height,
        show_grid: body.show_grid,
        grid_size: body.grid_size,
    };
    let row = board::update_board(&state.pool, board_id, auth.identity.user_id, update)
        .await
        .map_err(board_error_to_status)?;
    Ok(Json(to_response(row)))
}

/// `POST /api/boards/:id/share` — replace the shared-user set. Owner only.
pub async fn share_board(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(board_id): Path<Uuid>,
    Json(body): Json<ShareBoardBody>,
) -> Result<Json<BoardResponse>, StatusCode> {
    let row = board::share_board(&state.pool, board_id, auth.identity.user_id, &body.user_ids)
        .await
        .map_err(board_error_to_status)?;
    Ok(Json(to_response(row)))
}

/// `DELETE /api/boards/:id` — soft-delete. Owner only.
pub async fn delete_board(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(board_id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    board::delete_board(&state.pool, board_id, auth.identity.user_id)
        .await
        .map_err(board_error_to_status)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "boards_test.rs"]
mod tests;
