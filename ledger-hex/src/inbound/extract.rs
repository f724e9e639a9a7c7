//! Request guards and extractors shared by the ledger endpoints.

use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Request},
    http::{HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

use ledger_types::AppError;

use super::handlers::ApiError;

/// Largest request body accepted by the ledger endpoints.
pub const MAX_BODY_BYTES: usize = 1 << 20;

const APPLICATION_JSON: &str = "application/json";

/// Endpoints that only speak JSON. Anything else (health, unknown paths)
/// bypasses [`json_only`].
const JSON_PATHS: [&str; 3] = ["/invoice", "/transaction", "/users"];

/// Returns true if the Accept header lists `application/json`.
fn accepts_json(accept: Option<&HeaderValue>) -> bool {
    let Some(value) = accept.and_then(|v| v.to_str().ok()) else {
        return false;
    };
    value.split(',').any(|range| {
        let essence = range.split(';').next().unwrap_or_default().trim();
        essence.eq_ignore_ascii_case(APPLICATION_JSON)
    })
}

/// Rejects requests to the ledger endpoints that do not accept JSON with 415,
/// before method routing, and marks their responses as JSON.
pub async fn json_only(request: Request<Body>, next: Next) -> Response {
    if !JSON_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }
    if !accepts_json(request.headers().get(header::ACCEPT)) {
        return axum::http::StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response();
    }

    let mut response = next.run(request).await;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(APPLICATION_JSON),
    );
    response
}

/// Decodes exactly one JSON object; unknown fields are refused by the target
/// type and trailing values by `Deserializer::end`.
pub fn decode_single_object<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, AppError> {
    let starts_with_object = bytes
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'{');
    if !starts_with_object {
        return Err(AppError::Validation(
            "request body must be a JSON object".into(),
        ));
    }

    let mut de = serde_json::Deserializer::from_slice(bytes);
    let value = T::deserialize(&mut de)
        .map_err(|e| AppError::Validation(format!("invalid JSON body: {}", e)))?;
    de.end().map_err(|_| {
        AppError::Validation("request body must only contain a single JSON object".into())
    })?;

    Ok(value)
}

/// JSON body extractor with the strict decoding rules of [`decode_single_object`].
///
/// Unlike `axum::Json` it ignores Content-Type and reports every decoding
/// failure as 400.
pub struct StrictJson<T>(pub T);

impl<T, S> FromRequest<S> for StrictJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        Ok(StrictJson(decode_single_object(&bytes)?))
    }
}

/// Extractor for endpoints that take no body; anything but whitespace is 400.
pub struct EmptyBody;

impl<S> FromRequest<S> for EmptyBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            Ok(EmptyBody)
        } else {
            Err(AppError::Validation("request body must be empty".into()).into())
        }
    }
}
