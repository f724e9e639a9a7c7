//! # Ledger Client SDK
//!
//! A typed Rust client for the invoice ledger API.

use ledger_types::{CreateInvoiceRequest, SettleInvoiceRequest, UserResponse};
use reqwest::{Client, RequestBuilder, StatusCode, header};
use serde::de::DeserializeOwned;

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Ledger API client.
pub struct LedgerClient {
    base_url: String,
    http: Client,
}

impl LedgerClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// Checks if the API is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let resp = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        Ok(resp.status().is_success())
    }

    /// Creates a pending invoice. `amount` is in major units.
    pub async fn create_invoice(
        &self,
        user_id: i64,
        amount: f64,
        label: &str,
    ) -> Result<(), ClientError> {
        let req = CreateInvoiceRequest {
            user_id,
            amount,
            label: label.to_string(),
        };
        let resp = self.request(self.http.post(self.url("/invoice")).json(&req)).await?;
        Self::expect_no_content(resp).await
    }

    /// Settles a pending invoice. `amount` must equal the invoice amount.
    pub async fn settle_invoice(
        &self,
        invoice_id: i64,
        amount: f64,
        reference: &str,
    ) -> Result<(), ClientError> {
        let req = SettleInvoiceRequest {
            invoice_id,
            amount,
            reference: reference.to_string(),
        };
        let resp = self
            .request(self.http.post(self.url("/transaction")).json(&req))
            .await?;
        Self::expect_no_content(resp).await
    }

    /// Lists users with ids above `from_id`, at most `count` of them.
    pub async fn list_users(
        &self,
        from_id: Option<i64>,
        count: Option<i64>,
    ) -> Result<Vec<UserResponse>, ClientError> {
        let mut query = Vec::new();
        if let Some(from_id) = from_id {
            query.push(("from_id", from_id));
        }
        if let Some(count) = count {
            query.push(("count", count));
        }
        let resp = self
            .request(self.http.get(self.url("/users")).query(&query))
            .await?;
        Self::handle_response(resp).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn request(&self, req: RequestBuilder) -> Result<reqwest::Response, ClientError> {
        Ok(req
            .header(header::ACCEPT, "application/json")
            .send()
            .await?)
    }

    async fn expect_no_content(resp: reqwest::Response) -> Result<(), ClientError> {
        if resp.status() == StatusCode::NO_CONTENT {
            return Ok(());
        }
        Err(Self::api_error(resp).await)
    }

    async fn handle_response<T: DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        if resp.status().is_success() {
            let body = resp.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            Err(Self::api_error(resp).await)
        }
    }

    async fn api_error(resp: reqwest::Response) -> ClientError {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
            .unwrap_or(body);
        ClientError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = LedgerClient::new("http://localhost:3000");
        assert_eq!(client.base_url, "http://localhost:3000");
    }

    #[test]
    fn test_client_with_trailing_slash() {
        let client = LedgerClient::new("http://localhost:3000/");
        assert_eq!(client.url("/users"), "http://localhost:3000/users");
    }
}
