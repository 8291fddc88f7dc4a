//! Resource handlers with a signed-in user, for the branches that answer
//! before any row is read or written.

use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use people_integration_tests::{AUTH_HEADER, current_user, signed_in_app};
use people_server::models::CurrentUser;

fn member() -> CurrentUser {
    current_user(7, "dev@people.test", false)
}

fn admin() -> CurrentUser {
    current_user(1, "boss@people.test", true)
}

async fn send_json(
    user: CurrentUser,
    method: Method,
    path: &str,
    body: &Value,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(path)
        .header(AUTH_HEADER, user.email.as_str())
        .header(header::ACCEPT, "application/json")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = signed_in_app(user).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_member_cannot_create_team() {
    let (status, _) = send_json(
        member(),
        Method::POST,
        "/teams",
        &json!({"name": "Platform", "user_ids": ["7"]}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_member_cannot_change_projects_or_roles() {
    let (status, _) = send_json(
        member(),
        Method::PATCH,
        "/projects/1",
        &json!({"kickoff": "2026-05-01"}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send_json(member(), Method::POST, "/roles", &json!({"name": "qa"})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_member_cannot_create_position_for_someone_else() {
    let (status, _) = send_json(
        member(),
        Method::POST,
        "/positions",
        &json!({"user_id": "9", "role_id": "2", "starts_at": "2026-04-01"}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_blank_team_name_returns_json_errors() {
    let (status, body) = send_json(admin(), Method::POST, "/teams", &json!({"name": ""})).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, json!({"errors": {"name": ["can't be blank"]}}));
}

#[tokio::test]
async fn test_project_ending_before_start_returns_json_errors() {
    let (status, body) = send_json(
        admin(),
        Method::POST,
        "/projects",
        &json!({"name": "Atlas", "starts_at": "2026-06-01", "end_at": "2026-05-01"}),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["end_at"].as_array().map(Vec::len), Some(1));
    assert!(body["errors"].get("name").is_none());
}

#[tokio::test]
async fn test_malformed_header_ignores_cached_user() {
    let request = Request::get("/teams")
        .header(AUTH_HEADER, "not an email")
        .body(Body::empty())
        .unwrap();

    let response = signed_in_app(admin()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
