//! User routes — active-user directory and own profile.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::routes::auth::AuthUser;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub is_active: bool,
}

type UserTuple = (Uuid, String, String, Option<String>, bool);

fn to_response(t: UserTuple) -> UserResponse {
    UserResponse { id: t.0, email: t.1, name: t.2, picture: t.3, is_active: t.4 }
}

/// `GET /api/users` — list active users, for the share dialog.
pub async fn list_users(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<UserResponse>>, StatusCode> {
    let rows = sqlx::query_as::<_, UserTuple>(
        "SELECT id, email, name, picture, is_active FROM users WHERE is_active ORDER BY name ASC",
    )
    .fetch_all(&state.pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(rows.into_iter().map(to_response).collect()))
}

/// `GET /api/users/me` — the caller's stored profile.
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> Result<Json<UserResponse>, StatusCode> {
    let row = sqlx::query_as::<_, UserTuple>("SELECT id, email, name, picture, is_active FROM users WHERE id = $1")
        .bind(auth.identity.user_id)
        .fetch_optional(&state.pool)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(to_response(row)))
}
