//! Board service — CRUD, sharing, and the board access gate.
//!
//! DESIGN
//! ======
//! Boards are soft-deleted: `is_active = false`, rows are never removed.
//! The owner is fixed at creation. `shared_with` is a whole-set replacement
//! and only the owner may change it; shared users get read and post-it
//! creation rights, never update/share/delete.
//!
//! The access gate is split in two: `fetch_access` pulls the minimal
//! {owner, shared, active} row, and `BoardAccess` answers the actual
//! questions as pure functions so the policy is testable without a database.

use sqlx::PgPool;
use uuid::Uuid;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("board not found: {0}")]
    NotFound(Uuid),
    #[error("no access to board: {0}")]
    Forbidden(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Full board row as stored in Postgres.
#[derive(Debug, Clone)]
pub struct BoardRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub shared_with: Vec<Uuid>,
    pub is_active: bool,
    pub background_color: String,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub show_grid: bool,
    pub grid_size: f64,
}

/// Minimal access-relevant projection of a board.
#[derive(Debug, Clone)]
pub struct BoardAccess {
    pub owner_id: Uuid,
    pub shared_with: Vec<Uuid>,
    pub is_active: bool,
}

impl BoardAccess {
    /// True iff the board is active and the user is owner or shared.
    #[must_use]
    pub fn grants(&self, user_id: Uuid) -> bool {
        self.is_active && (self.owner_id == user_id || self.shared_with.contains(&user_id))
    }

    /// True iff the board is active and the user is its owner. Sharing does
    /// not grant update/share/delete rights.
    #[must_use]
    pub fn owned_by(&self, user_id: Uuid) -> bool {
        self.is_active && self.owner_id == user_id
    }
}

/// Fields a board owner may change after creation.
#[derive(Debug, Default)]
pub struct BoardUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub background_color: Option<String>,
    pub canvas_width: Option<f64>,
    pub canvas_height: Option<f64>,
    pub show_grid: Option<bool>,
    pub grid_size: Option<f64>,
}

// =============================================================================
// ACCESS GATE
// =============================================================================

/// Fetch the access projection for a board. `None` if the row is absent.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn fetch_access(pool: &PgPool, board_id: Uuid) -> Result<Option<BoardAccess>, sqlx::Error> {
    let row = sqlx::query_as::<_, (Uuid, Vec<Uuid>, bool)>(
        "SELECT owner_id, shared_with, is_active FROM boards WHERE id = $1",
    )
    .bind(board_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(owner_id, shared_with, is_active)| BoardAccess { owner_id, shared_with, is_active }))
}

/// Existence-hiding access check: an absent or soft-deleted board answers
/// `false`, never an error.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn has_access(pool: &PgPool, board_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
    Ok(fetch_access(pool, board_id)
        .await?
        .is_some_and(|access| access.grants(user_id)))
}

/// Require read/create access, distinguishing not-found from forbidden for
/// the REST layer. A soft-deleted board counts as not found.
///
/// # Errors
///
/// Returns `NotFound`, `Forbidden`, or a database error.
pub async fn ensure_access(pool: &PgPool, board_id: Uuid, user_id: Uuid) -> Result<(), BoardError> {
    let access = fetch_access(pool, board_id)
        .await?
        .filter(|a| a.is_active)
        .ok_or(BoardError::NotFound(board_id))?;
    if !access.grants(user_id) {
        return Err(BoardError::Forbidden(board_id));
    }
    Ok(())
}

/// Require ownership (update/share/delete rights).
///
/// # Errors
///
/// Returns `NotFound`, `Forbidden`, or a database error.
pub async fn ensure_owner(pool: &PgPool, board_id: Uuid, user_id: Uuid) -> Result<(), BoardError> {
    let access = fetch_access(pool, board_id)
        .await?
        .filter(|a| a.is_active)
        .ok_or(BoardError::NotFound(board_id))?;
    if !access.owned_by(user_id) {
        return Err(BoardError::Forbidden(board_id));
    }
    Ok(())
}

// =============================================================================
// CRUD
// =============================================================================

const BOARD_COLUMNS: &str = "id, name, description, owner_id, shared_with, is_active, \
     background_color, canvas_width, canvas_height, show_grid, grid_size";

type BoardTuple = (
    Uuid,
    String,
    Option<String>,
    Uuid,
    Vec<Uuid>,
    bool,
    String,
    f64,
    f64,
    bool,
    f64,
);

fn to_row(t: BoardTuple) -> BoardRow {
    BoardRow {
        id: t.0,
        name: t.1,
        description: t.2,
        owner_id: t.3,
        shared_with: t.4,
        is_active: t.5,
        background_color: t.6,
        canvas_width: t.7,
        canvas_height: t.8,
        show_grid: t.9,
        grid_size: t.10,
    }
}

/// Create a board owned by the given user.
///
/// # Errors
///
/// Returns a database error if the insert fails.
pub async fn create_board(
    pool: &PgPool,
    name: &str,
    description: Option<&str>,
    owner_id: Uuid,
) -> Result<BoardRow, BoardError> {
    let row = sqlx::query_as::<_, BoardTuple>(&format!(
        "INSERT INTO boards (id, name, description, owner_id) VALUES ($1, $2, $3, $4) RETURNING {BOARD_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(description)
    .bind(owner_id)
    .fetch_one(pool)
    .await?;

    Ok(to_row(row))
}

/// List active boards the user owns or is shared on.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_boards(pool: &PgPool, user_id: Uuid) -> Result<Vec<BoardRow>, BoardError> {
    let rows = sqlx::query_as::<_, BoardTuple>(&format!(
        "SELECT {BOARD_COLUMNS} FROM boards
         WHERE (owner_id = $1 OR $1 = ANY(shared_with)) AND is_active
         ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(to_row).collect())
}

/// Fetch a single board the user can read.
///
/// # Errors
///
/// Returns `NotFound` (absent or soft-deleted), `Forbidden`, or a database
/// error.
pub async fn get_board(pool: &PgPool, board_id: Uuid, user_id: Uuid) -> Result<BoardRow, BoardError> {
    let row = sqlx::query_as::<_, BoardTuple>(&format!("SELECT {BOARD_COLUMNS} FROM boards WHERE id = $1"))
        .bind(board_id)
        .fetch_optional(pool)
        .await?
        .map(to_row)
        .filter(|b| b.is_active)
        .ok_or(BoardError::NotFound(board_id))?;

    if !(row.owner_id == user_id || row.shared_with.contains(&user_id)) {
        return Err(BoardError::Forbidden(board_id));
    }
    Ok(row)
}

/// Update board metadata and canvas settings. Owner only.
///
/// # Errors
///
/// Returns `NotFound`, `Forbidden`, or a database error.
pub async fn update_board(
    pool: &PgPool,
    board_id: Uuid,
    user_id: Uuid,
    update: BoardUpdate,
) -> Result<BoardRow, BoardError> {
    ensure_owner(pool, board_id, user_id).await?;

    let row = sqlx::query_as::<_, BoardTuple>(&format!(
        "UPDATE boards SET
             name = COALESCE($2, name),
             description = COALESCE($3, description),
             background_color = COALESCE($4, background_color),
             canvas_width = COALESCE($5, canvas_width),
             canvas_height = COALESCE($6, canvas_height),
             show_grid = COALESCE($7, show_grid),
             grid_size = COALESCE($8, grid_size),
             updated_at = now()
         WHERE id = $1
         RETURNING {BOARD_COLUMNS}"
    ))
    .bind(board_id)
    .bind(update.name)
    .bind(update.description)
    .bind(update.background_color)
    .bind(update.canvas_width)
    .bind(update.canvas_height)
    .bind(update.show_grid)
    .bind(update.grid_size)
    .fetch_one(pool)
    .await?;

    Ok(to_row(row))
}

/// Replace the shared-user set. Owner only.
///
/// # Errors
///
/// Returns `NotFound`, `Forbidden`, or a database error.
pub async fn share_board(
    pool: &PgPool,
    board_id: Uuid,
    user_id: Uuid,
    shared_with: &[Uuid],
) -> Result<BoardRow, BoardError> {
    ensure_owner(pool, board_id, user_id).await?;

    let row = sqlx::query_as::<_, BoardTuple>(&format!(
        "UPDATE boards SET shared_with = $2, updated_at = now() WHERE id = $1 RETURNING {BOARD_COLUMNS}"
    ))
    .bind(board_id)
    .bind(shared_with)
    .fetch_one(pool)
    .await?;

    Ok(to_row(row))
}

/// Soft-delete a board. Owner only.
///
/// # Errors
///
/// Returns `NotFound`, `Forbidden`, or a database error.
pub async fn delete_board(pool: &PgPool, board_id: Uuid, user_id: Uuid) -> Result<(), BoardError> {
    ensure_owner(pool, board_id, user_id).await?;

    sqlx::query("UPDATE boards SET is_active = false, updated_at = now() WHERE id = $1")
        .bind(board_id)
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
#[path = "board_test.rs"]
mod tests;
