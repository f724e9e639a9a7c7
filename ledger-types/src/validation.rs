//! Request validation.
//!
//! Pure functions, one per request shape. They run before any storage access
//! and turn wire DTOs into validated commands.

use crate::domain::{InvoiceId, Money, UserId};
use crate::dto::{
    CreateInvoiceRequest, ListUsersQuery, NewInvoice, SettleInvoiceRequest, Settlement, UserPage,
};
use crate::error::DomainError;

/// Invoices and settlements must be strictly above this many minor units (99.99).
pub const MIN_AMOUNT_EXCLUSIVE: i64 = 9_999;

/// Default and maximum page size of the user listing.
pub const MAX_USERS_PER_PAGE: i64 = 50;

fn validate_amount(amount: f64) -> Result<Money, DomainError> {
    let money = Money::from_major(amount)?;
    if money.minor_units() <= MIN_AMOUNT_EXCLUSIVE {
        return Err(DomainError::invalid("amount", amount, "must be greater than 99.99"));
    }
    Ok(money)
}

fn validate_non_empty(field: &'static str, value: &str) -> Result<(), DomainError> {
    if value.is_empty() {
        return Err(DomainError::invalid(field, "\"\"", "must not be empty"));
    }
    Ok(())
}

pub fn validate_create_invoice(req: &CreateInvoiceRequest) -> Result<NewInvoice, DomainError> {
    if req.user_id <= 0 {
        return Err(DomainError::invalid("user_id", req.user_id, "must be positive"));
    }
    let amount = validate_amount(req.amount)?;
    validate_non_empty("label", &req.label)?;

    Ok(NewInvoice {
        user_id: UserId::new(req.user_id),
        amount,
        label: req.label.clone(),
    })
}

pub fn validate_settlement(req: &SettleInvoiceRequest) -> Result<Settlement, DomainError> {
    if req.invoice_id <= 0 {
        return Err(DomainError::invalid("invoice_id", req.invoice_id, "must be positive"));
    }
    let amount = validate_amount(req.amount)?;
    validate_non_empty("reference", &req.reference)?;

    Ok(Settlement {
        invoice_id: InvoiceId::new(req.invoice_id),
        amount,
        reference: req.reference.clone(),
    })
}

/// Validates a listing query. Counts above [`MAX_USERS_PER_PAGE`] are capped.
pub fn validate_list_users(query: &ListUsersQuery) -> Result<UserPage, DomainError> {
    let from_id = query.from_id.unwrap_or(0);
    if from_id < 0 {
        return Err(DomainError::invalid("from_id", from_id, "must not be negative"));
    }

    let count = query.count.unwrap_or(MAX_USERS_PER_PAGE);
    if count <= 0 {
        return Err(DomainError::invalid("count", count, "must be positive"));
    }

    Ok(UserPage {
        from_id,
        count: count.min(MAX_USERS_PER_PAGE),
    })
}
