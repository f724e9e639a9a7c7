//! Invoice domain model and its state machine.

use serde::{Deserialize, Serialize};

use super::money::Money;
use super::user::UserId;
use crate::error::DomainError;

/// Unique identifier for an Invoice, assigned by storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(i64);

impl InvoiceId {
    /// Creates an InvoiceId from a raw database id.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of an invoice.
///
/// `Pending` is the only initial state and `Paid` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Paid,
}

impl InvoiceStatus {
    /// The value stored in the `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
        }
    }

    /// Returns true if `self -> next` is a permitted transition.
    pub fn can_transition_to(&self, next: InvoiceStatus) -> bool {
        matches!((self, next), (InvoiceStatus::Pending, InvoiceStatus::Paid))
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvoiceStatus::Pending),
            "paid" => Ok(InvoiceStatus::Paid),
            other => Err(DomainError::Integrity(format!(
                "unknown invoice status {:?}",
                other
            ))),
        }
    }
}

/// An invoice raised against a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub user_id: UserId,
    amount: Money,
    pub label: String,
    status: InvoiceStatus,
}

impl Invoice {
    /// Reconstructs an invoice from stored fields.
    pub fn from_parts(
        id: InvoiceId,
        user_id: UserId,
        amount: Money,
        label: String,
        status: InvoiceStatus,
    ) -> Self {
        Self {
            id,
            user_id,
            amount,
            label,
            status,
        }
    }

    /// Amount fixed at creation.
    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    /// Marks the invoice paid if it is pending and `amount` matches exactly.
    ///
    /// Fails closed: a second call on the same invoice returns
    /// [`DomainError::InvalidTransition`] and leaves the invoice untouched.
    pub fn settle(&mut self, amount: Money) -> Result<(), DomainError> {
        if !self.status.can_transition_to(InvoiceStatus::Paid) {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: InvoiceStatus::Paid,
            });
        }
        if self.amount != amount {
            return Err(DomainError::AmountMismatch {
                expected: self.amount,
                got: amount,
            });
        }
        self.status = InvoiceStatus::Paid;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_invoice() -> Invoice {
        Invoice::from_parts(
            InvoiceId::new(1),
            UserId::new(7),
            Money::from_minor(15000),
            "order1".to_string(),
            InvoiceStatus::Pending,
        )
    }

    #[test]
    fn test_only_pending_to_paid_is_allowed() {
        assert!(InvoiceStatus::Pending.can_transition_to(InvoiceStatus::Paid));
        assert!(!InvoiceStatus::Paid.can_transition_to(InvoiceStatus::Pending));
        assert!(!InvoiceStatus::Paid.can_transition_to(InvoiceStatus::Paid));
        assert!(!InvoiceStatus::Pending.can_transition_to(InvoiceStatus::Pending));
    }

    #[test]
    fn test_settle_marks_paid() {
        let mut invoice = pending_invoice();
        invoice.settle(Money::from_minor(15000)).unwrap();
        assert_eq!(invoice.status(), InvoiceStatus::Paid);
    }

    #[test]
    fn test_settle_twice_fails_closed() {
        let mut invoice = pending_invoice();
        invoice.settle(Money::from_minor(15000)).unwrap();
        let result = invoice.settle(Money::from_minor(15000));
        assert!(matches!(result, Err(DomainError::InvalidTransition { .. })));
        assert_eq!(invoice.status(), InvoiceStatus::Paid);
    }

    #[test]
    fn test_settle_amount_mismatch() {
        let mut invoice = pending_invoice();
        let result = invoice.settle(Money::from_minor(15001));
        assert!(matches!(result, Err(DomainError::AmountMismatch { .. })));
        assert_eq!(invoice.status(), InvoiceStatus::Pending);
    }

    #[test]
    fn test_status_round_trips_through_column_value() {
        assert_eq!("paid".parse::<InvoiceStatus>().unwrap(), InvoiceStatus::Paid);
        assert!("void".parse::<InvoiceStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&InvoiceStatus::Pending).unwrap(),
            "\"pending\""
        );
    }
}
