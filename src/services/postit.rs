//! Post-it service — CRUD guarded by the board access gate.
//!
//! Every mutating operation runs `board::ensure_access` before touching the
//! row, and every mutation stamps `last_modified_by`. A post-it belongs to
//! exactly one board, fixed at creation; deletion is a soft `is_active`
//! flip, matching boards.

use sqlx::PgPool;
use uuid::Uuid;

use crate::services::board::{self, BoardError};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PostitError {
    #[error("post-it not found: {0}")]
    NotFound(Uuid),
    #[error("no access to board: {0}")]
    Forbidden(Uuid),
    #[error("board not found: {0}")]
    BoardNotFound(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<BoardError> for PostitError {
    fn from(err: BoardError) -> Self {
        match err {
            BoardError::NotFound(id) => Self::BoardNotFound(id),
            BoardError::Forbidden(id) => Self::Forbidden(id),
            BoardError::Database(e) => Self::Database(e),
        }
    }
}

/// Full post-it row as stored in Postgres.
#[derive(Debug, Clone)]
pub struct PostitRow {
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

/// Creation input. Width/height/color/z-index fall back to canvas defaults.
#[derive(Debug)]
pub struct NewPostit {
    pub board_id: Uuid,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub color: Option<String>,
    pub z_index: Option<i32>,
}

/// Partial update. Board membership is immutable, so there is no board field.
#[derive(Debug, Default)]
pub struct PostitUpdate {
    pub text: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub color: Option<String>,
    pub z_index: Option<i32>,
}

const POSTIT_COLUMNS: &str =
    "id, board_id, text, x, y, width, height, color, z_index, created_by, last_modified_by, is_active";

type PostitTuple = (
    Uuid,
    Uuid,
    String,
    f64,
    f64,
    f64,
    f64,
    String,
    i32,
    Uuid,
    Option<Uuid>,
    bool,
);

fn to_row(t: PostitTuple) -> PostitRow {
    PostitRow {
        id: t.0,
        board_id: t.1,
        text: t.2,
        x: t.3,
        y: t.4,
        width: t.5,
        height: t.6,
        color: t.7,
        z_index: t.8,
        created_by: t.9,
        last_modified_by: t.10,
        is_active: t.11,
    }
}

// =============================================================================
// CRUD
// =============================================================================

/// Create a post-it on a board the user can access.
///
/// # Errors
///
/// Returns `BoardNotFound`, `Forbidden`, or a database error.
pub async fn create_postit(pool: &PgPool, input: NewPostit, user_id: Uuid) -> Result<PostitRow, PostitError> {
    board::ensure_access(pool, input.board_id, user_id).await?;

    let row = sqlx::query_as::<_, PostitTuple>(&format!(
        "INSERT INTO postits
             (id, board_id, text, x, y, width, height, color, z_index, created_by, last_modified_by)
         VALUES
             ($1, $2, $3, $4, $5,
              COALESCE($6, 200), COALESCE($7, 200), COALESCE($8, '#FFE66D'), COALESCE($9, 0),
              $10, $10)
         RETURNING {POSTIT_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(input.board_id)
    .bind(&input.text)
    .bind(input.x)
    .bind(input.y)
    .bind(input.width)
    .bind(input.height)
    .bind(input.color.as_deref())
    .bind(input.z_index)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(to_row(row))
}

/// List the active post-its of an accessible board, bottom of the stack first.
///
/// # Errors
///
/// Returns `BoardNotFound`, `Forbidden`, or a database error.
pub async fn list_postits(pool: &PgPool, board_id: Uuid, user_id: Uuid) -> Result<Vec<PostitRow>, PostitError> {
    board::ensure_access(pool, board_id, user_id).await?;

    let rows = sqlx::query_as::<_, PostitTuple>(&format!(
        "SELECT {POSTIT_COLUMNS} FROM postits WHERE board_id = $1 AND is_active ORDER BY z_index ASC"
    ))
    .bind(board_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(to_row).collect())
}

/// Fetch one post-it the user can read.
///
/// # Errors
///
/// Returns `NotFound`, `Forbidden`, or a database error.
pub async fn get_postit(pool: &PgPool, postit_id: Uuid, user_id: Uuid) -> Result<PostitRow, PostitError> {
    let row = fetch_active(pool, postit_id).await?;
    board::ensure_access(pool, row.board_id, user_id).await?;
    Ok(row)
}

/// Apply a partial update and stamp `last_modified_by`.
///
/// # Errors
///
/// Returns `NotFound`, `Forbidden`, or a database error.
pub async fn update_postit(
    pool: &PgPool,
    postit_id: Uuid,
    update: PostitUpdate,
    user_id: Uuid,
) -> Result<PostitRow, PostitError> {
    let row = fetch_active(pool, postit_id).await?;
    board::ensure_access(pool, row.board_id, user_id).await?;

    let row = sqlx::query_as::<_, PostitTuple>(&format!(
        "UPDATE postits SET
             text = COALESCE($2, text),
             x = COALESCE($3, x),
             y = COALESCE($4, y),
             width = COALESCE($5, width),
             height = COALESCE($6, height),
             color = COALESCE($7, color),
             z_index = COALESCE($8, z_index),
             last_modified_by = $9,
             updated_at = now()
         WHERE id = $1
         RETURNING {POSTIT_COLUMNS}"
    ))
    .bind(postit_id)
    .bind(update.text)
    .bind(update.x)
    .bind(update.y)
    .bind(update.width)
    .bind(update.height)
    .bind(update.color)
    .bind(update.z_index)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(to_row(row))
}

/// Soft-delete a post-it on an accessible board.
///
/// # Errors
///
/// Returns `NotFound`, `Forbidden`, or a database error.
pub async fn delete_postit(pool: &PgPool, postit_id: Uuid, user_id: Uuid) -> Result<(), PostitError> {
    let row = fetch_active(pool, postit_id).await?;
    board::ensure_access(pool, row.board_id, user_id).await?;

    sqlx::query("UPDATE postits SET is_active = false, last_modified_by = $2, updated_at = now() WHERE id = $1")
        .bind(postit_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

async fn fetch_active(pool: &PgPool, postit_id: Uuid) -> Result<PostitRow, PostitError> {
    sqlx::query_as::<_, PostitTuple>(&format!("SELECT {POSTIT_COLUMNS} FROM postits WHERE id = $1"))
        .bind(postit_id)
        .fetch_optional(pool)
        .await?
        .map(to_row)
        .filter(|p| p.is_active)
        .ok_or(PostitError::NotFound(postit_id))
}

#[cfg(test)]
#[path = "postit_test.rs"]
mod tests;
