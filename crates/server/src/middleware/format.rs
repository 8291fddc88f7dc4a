//! Content negotiation and request body extraction.
//!
//! Every resource answers in HTML or JSON depending on `Accept`, and accepts
//! either a urlencoded form or a JSON body.

use std::convert::Infallible;

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::{HeaderMap, header, request::Parts},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::AppError;

/// How the client wants the response rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Html,
    Json,
}

impl ResponseFormat {
    /// JSON when `Accept` lists `application/json` before any HTML type.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let Some(accept) = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()) else {
            return Self::Html;
        };

        for media in accept.split(',') {
            let media = media.split(';').next().unwrap_or_default().trim();
            if media.eq_ignore_ascii_case("application/json") || media.ends_with("+json") {
                return Self::Json;
            }
            if media.eq_ignore_ascii_case("text/html")
                || media.eq_ignore_ascii_case("application/xhtml+xml")
            {
                return Self::Html;
            }
        }
        Self::Html
    }

    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ResponseFormat {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

/// Request body decoded from JSON or from a urlencoded form.
///
/// Repeated form keys, and keys ending in `[]`, become arrays.
#[derive(Debug, Clone)]
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| {
                let ct = ct.split(';').next().unwrap_or_default().trim();
                ct.eq_ignore_ascii_case("application/json") || ct.ends_with("+json")
            });

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let value = if is_json {
            serde_json::from_slice(&body)
                .map_err(|e| AppError::BadRequest(format!("invalid JSON body: {e}")))?
        } else {
            form_to_json(&body)
        };

        serde_json::from_value(value)
            .map(Self)
            .map_err(|e| AppError::BadRequest(format!("invalid request body: {e}")))
    }
}

/// Decode a urlencoded body into a JSON object.
#[must_use]
pub fn form_to_json(body: &[u8]) -> Value {
    let mut map = Map::new();

    for (key, value) in url::form_urlencoded::parse(body) {
        let (key, forced_list) = key
            .strip_suffix("[]")
            .map_or((&*key, false), |k| (k, true));
        let value = Value::String(value.into_owned());

        match map.get_mut(key) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None if forced_list => {
                map.insert(key.to_owned(), Value::Array(vec![value]));
            }
            None => {
                map.insert(key.to_owned(), value);
            }
        }
    }

    Value::Object(map)
}
