//! Success and failure responses shared by the resource controllers.

use axum::{
    Json,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use tracing::warn;

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::middleware::ResponseFormat;
use crate::models::ValidationErrors;

pub const DOES_NOT_EXIST: &str = "does not exist";

/// HTML: redirect to `location`. JSON: `status` with `body`.
pub fn on_success<B: Serialize>(
    format: ResponseFormat,
    location: &str,
    status: StatusCode,
    body: &B,
) -> Response {
    match format {
        ResponseFormat::Html => Redirect::to(location).into_response(),
        ResponseFormat::Json => (status, Json(body)).into_response(),
    }
}

/// HTML: re-render the form with 422. JSON: 422 `{"errors": {...}}`.
///
/// The form is only built for HTML requests.
///
/// # Errors
///
/// Returns `AppError::Validation` for JSON requests, or whatever building
/// the form failed with.
pub async fn on_failure<F, Fut, T>(
    format: ResponseFormat,
    errors: ValidationErrors,
    form: F,
) -> Result<Response, AppError>
where
    F: FnOnce(ValidationErrors) -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
    T: IntoResponse,
{
    match format {
        ResponseFormat::Html => {
            let form = form(errors).await?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, form).into_response())
        }
        ResponseFormat::Json => Err(AppError::Validation(errors)),
    }
}

/// Turn a constraint violation from a save into field errors.
///
/// # Errors
///
/// Returns the original error, wrapped, when it is not a constraint violation.
pub fn save_errors(
    error: RepositoryError,
    taken: fn() -> ValidationErrors,
) -> Result<ValidationErrors, AppError> {
    match error {
        RepositoryError::Conflict(_) => Ok(taken()),
        RepositoryError::InvalidReference(constraint) => {
            warn!(constraint = %constraint, "Save referenced a missing row");
            Ok(ValidationErrors::single(
                reference_field(&constraint),
                DOES_NOT_EXIST,
            ))
        }
        other => Err(AppError::Database(other)),
    }
}

/// `positions_user_id_fkey` → `user_id`.
fn reference_field(constraint: &str) -> &str {
    constraint
        .strip_suffix("_fkey")
        .and_then(|c| c.split_once('_'))
        .map_or(constraint, |(_, field)| field)
}

/// Where to send the user back to: the `Referer`, if it is a local path.
#[must_use]
pub fn back_or(headers: &HeaderMap, fallback: &str) -> String {
    headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|referer| {
            if referer.starts_with('/') && !referer.starts_with("//") {
                return Some(referer.to_owned());
            }
            let url = url::Url::parse(referer).ok()?;
            let mut path = url.path().to_owned();
            if let Some(query) = url.query() {
                path.push('?');
                path.push_str(query);
            }
            Some(path)
        })
        .unwrap_or_else(|| fallback.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_reference_field() {
        assert_eq!(reference_field("positions_user_id_fkey"), "user_id");
        assert_eq!(reference_field("teams_team_leader_id_fkey"), "team_leader_id");
        assert_eq!(reference_field("user_ids"), "user_ids");
    }

    #[test]
    fn test_save_errors_maps_constraints() {
        let errors = save_errors(
            RepositoryError::Conflict("team name already exists".into()),
            crate::models::team::name_taken,
        )
        .unwrap();
        assert_eq!(errors.get("name"), ["has already been taken"]);

        let errors = save_errors(
            RepositoryError::InvalidReference("positions_role_id_fkey".into()),
            crate::models::team::name_taken,
        )
        .unwrap();
        assert_eq!(errors.get("role_id"), [DOES_NOT_EXIST]);

        assert!(save_errors(RepositoryError::NotFound, crate::models::team::name_taken).is_err());
    }

    #[test]
    fn test_back_or_uses_local_referer() {
        let mut headers = HeaderMap::new();
        assert_eq!(back_or(&headers, "/users/1"), "/users/1");

        headers.insert(
            header::REFERER,
            HeaderValue::from_static("https://people.test/users/4?tab=positions"),
        );
        assert_eq!(back_or(&headers, "/users/1"), "/users/4?tab=positions");
    }

    #[tokio::test]
    async fn test_success_and_failure_by_format() {
        let response = on_success(
            ResponseFormat::Json,
            "/teams",
            StatusCode::CREATED,
            &serde_json::json!({}),
        );
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = on_success(ResponseFormat::Html, "/teams", StatusCode::CREATED, &());
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let errors = ValidationErrors::single("name", "can't be blank");
        let error = on_failure(ResponseFormat::Json, errors.clone(), |_| async {
            Ok::<_, AppError>("form")
        })
        .await
        .unwrap_err();
        assert_eq!(error.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = on_failure(ResponseFormat::Html, errors, |e| async move {
            Ok::<_, AppError>(e.full_messages().join(", "))
        })
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
