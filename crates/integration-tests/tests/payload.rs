//! Form and JSON bodies decoded through the shared extractors.

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tower::ServiceExt;

use people_server::error::AppError;
use people_server::middleware::{Payload, ResponseFormat};
use people_server::models::TeamInput;

/// Validates a team body and echoes what it understood.
async fn echo_team(
    format: ResponseFormat,
    Payload(input): Payload<TeamInput>,
) -> Result<Response, AppError> {
    let params = input.validate().map_err(AppError::Validation)?;
    let ids: Vec<i32> = params.user_ids.iter().map(|id| id.as_i32()).collect();
    Ok(Json(json!({
        "json": format.is_json(),
        "name": params.name,
        "leader": params.team_leader_id.map(|id| id.as_i32()),
        "user_ids": ids,
    }))
    .into_response())
}

fn app() -> Router {
    Router::new().route("/teams", post(echo_team))
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn form(body: &'static str) -> Request<Body> {
    Request::post("/teams")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

fn json_request(body: &Value) -> Request<Body> {
    Request::post("/teams")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_form_with_repeated_members() {
    let (status, body) = send(form("name=Platform&team_leader_id=4&user_ids[]=4&user_ids[]=9&user_ids[]=4")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["json"], false);
    assert_eq!(body["name"], "Platform");
    assert_eq!(body["leader"], 4);
    assert_eq!(body["user_ids"], json!([4, 9]));
}

#[tokio::test]
async fn test_json_accepts_numbers_and_users_alias() {
    let (status, body) = send(json_request(&json!({
        "name": "Platform",
        "team_leader_id": 4,
        "users": [4, "9"],
    })))
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["json"], true);
    assert_eq!(body["user_ids"], json!([4, 9]));
}

#[tokio::test]
async fn test_blank_leader_means_none() {
    let (status, body) = send(form("name=Platform&team_leader_id=")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["leader"], Value::Null);
    assert_eq!(body["user_ids"], json!([]));
}

#[tokio::test]
async fn test_validation_errors_are_keyed_by_field() {
    let (status, body) = send(json_request(&json!({"name": "  ", "users": ["x"]}))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["name"], json!(["can't be blank"]));
    assert_eq!(body["errors"]["user_ids"], json!(["is not a valid id"]));
}

#[tokio::test]
async fn test_malformed_json_is_a_bad_request() {
    let request = Request::post("/teams")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\":"))
        .unwrap();
    let (status, _) = send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
