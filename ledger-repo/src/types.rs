//! Shared database row types for SQLite and PostgreSQL.
//!
//! Both backends store ids and amounts as 64-bit integers, so one set of row
//! structs serves both.

use sqlx::FromRow;

use ledger_types::{
    Invoice, InvoiceId, InvoiceReceipt, InvoiceStatus, Money, RepoError, User, UserId,
};

// ─────────────────────────────────────────────────────────────────────────────
// Database row structs (derive FromRow for automatic mapping)
// ─────────────────────────────────────────────────────────────────────────────

/// User row from database.
#[derive(FromRow)]
pub struct DbUser {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub balance: i64,
}

/// Invoice row from database.
#[derive(FromRow)]
pub struct DbInvoice {
    pub id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub label: String,
    pub status: String,
}

/// `RETURNING id, status` of an invoice insert.
#[derive(FromRow)]
pub struct DbInvoiceReceipt {
    pub id: i64,
    pub status: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Domain conversion
// ─────────────────────────────────────────────────────────────────────────────

impl DbUser {
    /// Convert database row to domain User.
    pub fn into_domain(self) -> User {
        User::from_parts(
            UserId::new(self.id),
            self.first_name,
            self.last_name,
            Money::from_minor(self.balance),
        )
    }
}

impl DbInvoice {
    /// Convert database row to domain Invoice.
    pub fn into_domain(self) -> Result<Invoice, RepoError> {
        let status: InvoiceStatus = self.status.parse()?;
        Ok(Invoice::from_parts(
            InvoiceId::new(self.id),
            UserId::new(self.user_id),
            Money::from_minor(self.amount),
            self.label,
            status,
        ))
    }
}

impl From<DbInvoiceReceipt> for InvoiceReceipt {
    fn from(row: DbInvoiceReceipt) -> Self {
        InvoiceReceipt {
            id: InvoiceId::new(row.id),
            status: row.status,
        }
    }
}
