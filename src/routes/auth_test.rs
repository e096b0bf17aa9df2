use super::*;
use crate::state::test_helpers;
use axum::extract::FromRequestParts;
use axum::http::Request;
use uuid::Uuid;

// =============================================================================
// env_bool — uses unique env var names to avoid races with parallel tests.
// =============================================================================

#[test]
fn env_bool_true_variants() {
    for (i, val) in ["1", "true", "yes", "on"].iter().enumerate() {
        let key = format!("__TEST_EB_TRUE_{i}__");
        unsafe { std::env::set_var(&key, val) };
        assert_eq!(env_bool(&key), Some(true), "expected true for {val:?}");
        unsafe { std::env::remove_var(&key) };
    }
}

#[test]
fn env_bool_false_variants() {
    for (i, val) in ["0", "false", "no", "off"].iter().enumerate() {
        let key = format!("__TEST_EB_FALSE_{i}__");
        unsafe { std::env::set_var(&key, val) };
        assert_eq!(env_bool(&key), Some(false), "expected false for {val:?}");
        unsafe { std::env::remove_var(&key) };
    }
}

#[test]
fn env_bool_invalid_returns_none() {
    let key = "__TEST_EB_INVALID_311__";
    unsafe { std::env::set_var(key, "maybe") };
    assert_eq!(env_bool(key), None);
    unsafe { std::env::remove_var(key) };
}

#[test]
fn env_bool_unset_returns_none() {
    assert_eq!(env_bool("__TEST_EB_SURELY_UNSET_XYZ_17__"), None);
}

// =============================================================================
// AuthUser extractor
// =============================================================================

async fn extract(header_value: Option<&str>) -> Result<AuthUser, StatusCode> {
    let state = test_helpers::test_app_state();
    let mut builder = Request::builder().uri("/api/auth/me");
    if let Some(value) = header_value {
        builder = builder.header("Authorization", value);
    }
    let request = builder.body(()).expect("request should build");
    let (mut parts, ()) = request.into_parts();
    AuthUser::from_request_parts(&mut parts, &state).await
}

#[tokio::test]
async fn extractor_rejects_missing_header() {
    assert!(matches!(extract(None).await, Err(StatusCode::UNAUTHORIZED)));
}

#[tokio::test]
async fn extractor_rejects_bare_bearer_prefix() {
    assert!(matches!(extract(Some("Bearer ")).await, Err(StatusCode::UNAUTHORIZED)));
}

#[tokio::test]
async fn extractor_rejects_garbage_token() {
    assert!(matches!(
        extract(Some("Bearer not.a.token")).await,
        Err(StatusCode::UNAUTHORIZED)
    ));
}

#[tokio::test]
async fn extractor_accepts_valid_bearer_token() {
    let state = test_helpers::test_app_state();
    let user_id = Uuid::new_v4();
    let token = state.tokens.sign(user_id, "rest@example.com", "Rest").unwrap();

    let request = Request::builder()
        .uri("/api/auth/me")
        .header("Authorization", format!("Bearer {token}"))
        .body(())
        .expect("request should build");
    let (mut parts, ()) = request.into_parts();

    let auth = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .expect("extraction should succeed");
    assert_eq!(auth.identity.user_id, user_id);
    assert_eq!(auth.identity.email, "rest@example.com");
}

#[tokio::test]
async fn extractor_accepts_token_without_bearer_prefix() {
    let state = test_helpers::test_app_state();
    let token = state.tokens.sign(Uuid::new_v4(), "raw@example.com", "Raw").unwrap();

    let request = Request::builder()
        .uri("/api/auth/me")
        .header("Authorization", token)
        .body(())
        .expect("request should build");
    let (mut parts, ()) = request.into_parts();

    assert!(AuthUser::from_request_parts(&mut parts, &state).await.is_ok());
}
