//! Data Transfer Objects (DTOs) for requests and responses.
//!
//! Request types reject unknown fields; amounts are major-unit floats on the
//! wire and are converted to [`Money`] by the validation layer.

use serde::{Deserialize, Serialize};

use crate::domain::{InvoiceId, Money, User, UserId};

// ─────────────────────────────────────────────────────────────────────────────
// Invoice DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to create a new invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateInvoiceRequest {
    /// Owning user
    pub user_id: i64,
    /// Amount in major units, e.g. `150.00`
    pub amount: f64,
    pub label: String,
}

/// Request to settle a pending invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettleInvoiceRequest {
    pub invoice_id: i64,
    /// Amount in major units; must equal the invoice amount exactly
    pub amount: f64,
    /// Free-text payment reference
    pub reference: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// User DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Query string for the user listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListUsersQuery {
    /// Only users with an id strictly greater than this are returned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
}

/// A user as rendered by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    /// Balance in major units
    pub balance: f64,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id.get(),
            first_name: user.first_name,
            last_name: user.last_name,
            balance: user.balance.to_major(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Validated commands
// ─────────────────────────────────────────────────────────────────────────────

/// A creation request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvoice {
    pub user_id: UserId,
    pub amount: Money,
    pub label: String,
}

/// A settlement request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub invoice_id: InvoiceId,
    pub amount: Money,
    pub reference: String,
}

/// A validated page of the user listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserPage {
    pub from_id: i64,
    pub count: i64,
}

/// What storage hands back after inserting an invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceReceipt {
    pub id: InvoiceId,
    /// Raw `status` column value as read back by the insert
    pub status: String,
}
