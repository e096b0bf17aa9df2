use super::*;
use crate::services::board::BoardError;

fn dummy_row() -> BoardRow {
    BoardRow {
        id: Uuid::new_v4(),
        name: "Sprint Retro".into(),
        description: Some("what went well".into()),
        owner_id: Uuid::new_v4(),
        shared_with: vec![Uuid::new_v4()],
        is_active: true,
        background_color: "#FFFFFF".into(),
        canvas_width: 1920.0,
        canvas_height: 1080.0,
        show_grid: false,
        grid_size: 20.0,
    }
}

// =============================================================================
// Error mapping
// =============================================================================

#[test]
fn not_found_maps_to_404() {
    assert_eq!(board_error_to_status(BoardError::NotFound(Uuid::new_v4())), StatusCode::NOT_FOUND);
}

#[test]
fn forbidden_maps_to_403() {
    assert_eq!(
        board_error_to_status(BoardError::Forbidden(Uuid::new_v4())),
        StatusCode::FORBIDDEN
    );
}

#[test]
fn database_error_maps_to_500() {
    assert_eq!(
        board_error_to_status(BoardError::Database(sqlx::Error::PoolClosed)),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

// =============================================================================
// DTO shapes
// =============================================================================

#[test]
fn board_response_uses_camel_case() {
    let row = dummy_row();
    let wire = serde_json::to_value(to_response(row.clone())).unwrap();
    assert_eq!(wire["name"], "Sprint Retro");
    assert_eq!(wire["owner"], row.owner_id.to_string());
    assert!(wire.get("sharedWith").is_some());
    assert!(wire.get("backgroundColor").is_some());
    assert!(wire.get("canvasWidth").is_some());
    assert!(wire.get("shared_with").is_none());
}

#[test]
fn create_body_accepts_minimal_payload() {
    let body: CreateBoardBody = serde_json::from_str(r#"{"name": "Ideas"}"#).unwrap();
    assert_eq!(body.name, "Ideas");
    assert!(body.description.is_none());
}

#[test]
fn update_body_fields_all_optional() {
    let body: UpdateBoardBody = serde_json::from_str("{}").unwrap();
    assert!(body.name.is_none());
    assert!(body.show_grid.is_none());

    let body: UpdateBoardBody =
        serde_json::from_str(r##"{"backgroundColor": "#000000", "showGrid": true, "gridSize": 32}"##).unwrap();
    assert_eq!(body.background_color.as_deref(), Some("#000000"));
    assert_eq!(body.show_grid, Some(true));
}

#[test]
fn share_body_parses_user_id_list() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let raw = format!(r#"{{"userIds": ["{a}", "{b}"]}}"#);
    let body: ShareBoardBody = serde_json::from_str(&raw).unwrap();
    assert_eq!(body.user_ids, vec![a, b]);
}
