//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    BoxError, Json,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use ledger_types::{
    AppError, CreateInvoiceRequest, ErrorKind, LedgerRepository, ListUsersQuery,
    SettleInvoiceRequest, UserResponse,
};

use super::extract::{EmptyBody, StrictJson};
use crate::LedgerService;

/// Application state shared across handlers.
pub struct AppState<R: LedgerRepository> {
    pub service: LedgerService<R>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0.kind() {
            ErrorKind::Validation => (StatusCode::BAD_REQUEST, self.0.to_string()),
            // Storage details stay in the logs
            ErrorKind::Transient | ErrorKind::Internal | ErrorKind::Fatal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        error_response(status, message)
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    let body = serde_json::json!({
        "error": message,
        "code": status.as_u16()
    });

    (status, Json(body)).into_response()
}

/// Turns failures raised by the middleware stack (the request deadline)
/// into the same JSON error shape the handlers use.
pub async fn middleware_error(err: BoxError) -> Response {
    if err.is::<tower::timeout::error::Elapsed>() {
        return error_response(StatusCode::REQUEST_TIMEOUT, "Request timed out".to_string());
    }

    tracing::error!(error = %err, "middleware failure");
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Create a pending invoice.
#[tracing::instrument(skip_all, fields(user_id = req.user_id, amount = req.amount))]
pub async fn create_invoice<R: LedgerRepository>(
    State(state): State<Arc<AppState<R>>>,
    StrictJson(req): StrictJson<CreateInvoiceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.service.create_invoice(req).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Settle a pending invoice.
#[tracing::instrument(skip_all, fields(invoice_id = req.invoice_id, amount = req.amount))]
pub async fn settle_invoice<R: LedgerRepository>(
    State(state): State<Arc<AppState<R>>>,
    StrictJson(req): StrictJson<SettleInvoiceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.service.settle_invoice(req).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List one page of users.
#[tracing::instrument(skip_all)]
pub async fn list_users<R: LedgerRepository>(
    State(state): State<Arc<AppState<R>>>,
    query: Result<Query<ListUsersQuery>, QueryRejection>,
    _body: EmptyBody,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query.map_err(|e| AppError::Validation(e.body_text()))?;

    let users = state.service.list_users(query).await?;
    let users: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(users))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_errors_are_masked() {
        let response =
            ApiError(AppError::Internal("pool timed out on 10.0.0.3".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = ApiError(AppError::Transient("40001".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_errors_are_bad_request() {
        let response = ApiError(AppError::Validation("bad label \"\"".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
