//! The assembled application router, exercised without a database.

use std::time::Duration;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use people_integration_tests::{AUTH_HEADER, RecordingDelivery, test_config};
use people_server::build_router;
use people_server::services::MailQueue;
use people_server::state::AppState;

fn app() -> axum::Router {
    let config = test_config(None);
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy(config.database_url.expose_secret())
        .unwrap();
    let (mail, _worker) = MailQueue::spawn_with_delay(RecordingDelivery::default(), Duration::ZERO);
    build_router(AppState::new(config, pool, mail)).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let response = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_root_redirects_to_users() {
    let response = app()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/users");
}

#[tokio::test]
async fn test_resources_require_forwarded_email() {
    for path in ["/users", "/teams", "/projects", "/roles", "/users/1"] {
        let response = app()
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{path}");
    }
}

#[tokio::test]
async fn test_malformed_forwarded_email_is_unauthorized() {
    let response = app()
        .oneshot(
            Request::get("/users")
                .header(AUTH_HEADER, "not an email")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let response = app()
        .oneshot(Request::get("/payroll").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
