//! Ledger repository port.
//!
//! This is the primary port in our hexagonal architecture.
//! Adapters (Postgres, SQLite, in-memory) implement it.

use super::UserDirectory;
use crate::domain::{Invoice, InvoiceId};
use crate::dto::{InvoiceReceipt, NewInvoice, Settlement};
use crate::error::RepoError;

/// Invoice storage and the settlement transaction.
#[async_trait::async_trait]
pub trait LedgerRepository: UserDirectory {
    /// Inserts a `pending` invoice and reads back its id and status in the
    /// same round trip.
    ///
    /// A missing owner detected by the store (foreign key) must be reported
    /// as `DomainError::UserNotFound`.
    async fn insert_invoice(&self, invoice: &NewInvoice) -> Result<InvoiceReceipt, RepoError>;

    /// Gets an invoice by ID.
    async fn get_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, RepoError>;

    /// Runs one settlement attempt: credit the owner and mark the invoice
    /// `paid`, both guarded by `status = pending` and the exact amount, in a
    /// single serializable transaction.
    ///
    /// MUST be atomic: either both mutations commit or neither does.
    /// Predicate mismatches are `DomainError::UnusableInvoice`; serialization
    /// conflicts are `RepoError::Transient` so the caller can retry.
    async fn settle_invoice(&self, settlement: &Settlement) -> Result<InvoiceId, RepoError>;
}
