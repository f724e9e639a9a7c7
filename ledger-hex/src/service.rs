//! Ledger Application Service
//!
//! Orchestrates validation, the invoice ledger and the settlement engine
//! through the repository port. Contains NO infrastructure logic.

use std::time::{Duration, Instant};

use backon::Retryable;

use ledger_types::validation::{validate_create_invoice, validate_list_users, validate_settlement};
use ledger_types::{
    AppError, CreateInvoiceRequest, DomainError, InvoiceId, InvoiceStatus, LedgerRepository,
    ListUsersQuery, RepoError, SettleInvoiceRequest, User,
};

use crate::retry::RetryPolicy;

/// Application service for ledger operations.
///
/// Generic over `R: LedgerRepository` - the adapter is injected at compile time.
/// This enables:
/// - Swapping repositories without code changes
/// - Testing with an in-memory repo
/// - Compile-time checks for port implementation
pub struct LedgerService<R: LedgerRepository> {
    repo: R,
    retry: RetryPolicy,
}

/// Logs a failed operation at a level matching its kind and converts it.
fn fail(op: &'static str, err: impl Into<AppError>) -> AppError {
    let err = err.into();
    match &err {
        AppError::Validation(_) => tracing::warn!(op, kind = ?err.kind(), error = %err, "rejected"),
        _ => tracing::error!(op, kind = ?err.kind(), error = %err, "failed"),
    }
    err
}

impl<R: LedgerRepository> LedgerService<R> {
    /// Creates a new ledger service with the given repository.
    pub fn new(repo: R) -> Self {
        Self::with_retry_policy(repo, RetryPolicy::default())
    }

    pub fn with_retry_policy(repo: R, retry: RetryPolicy) -> Self {
        Self { repo, retry }
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Invoice Ledger
    // ─────────────────────────────────────────────────────────────────────────────

    /// Creates a `pending` invoice for an existing user.
    #[tracing::instrument(skip_all, fields(user_id = req.user_id))]
    pub async fn create_invoice(&self, req: CreateInvoiceRequest) -> Result<InvoiceId, AppError> {
        let start = Instant::now();

        let invoice = validate_create_invoice(&req).map_err(|e| fail("create_invoice", e))?;

        let exists = self
            .repo
            .user_exists(invoice.user_id)
            .await
            .map_err(|e| fail("create_invoice", e))?;
        if !exists {
            return Err(fail(
                "create_invoice",
                DomainError::UserNotFound(invoice.user_id),
            ));
        }

        // A concurrent delete of the user is caught by the foreign key and
        // reported as UserNotFound by the adapter.
        let receipt = self
            .repo
            .insert_invoice(&invoice)
            .await
            .map_err(|e| fail("create_invoice", e))?;

        if receipt.id.get() <= 0 || receipt.status != InvoiceStatus::Pending.as_str() {
            return Err(fail(
                "create_invoice",
                DomainError::Integrity(format!(
                    "invoice for user {} read back as id {} with status {:?}",
                    invoice.user_id, receipt.id, receipt.status
                )),
            ));
        }

        tracing::info!(
            invoice_id = %receipt.id,
            invoice_status = %receipt.status,
            elapsed = ?start.elapsed(),
            "handled create_invoice"
        );
        Ok(receipt.id)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Settlement Engine
    // ─────────────────────────────────────────────────────────────────────────────

    /// Settles a pending invoice: credits its owner and marks it `paid`
    /// atomically, retrying the whole transaction on transient conflicts.
    #[tracing::instrument(skip_all, fields(invoice_id = req.invoice_id))]
    pub async fn settle_invoice(&self, req: SettleInvoiceRequest) -> Result<InvoiceId, AppError> {
        let start = Instant::now();

        let settlement = validate_settlement(&req).map_err(|e| fail("settle_invoice", e))?;

        let repo = &self.repo;
        let settlement = &settlement;
        let attempt = || async move { repo.settle_invoice(settlement).await };

        let invoice_id = attempt
            .retry(self.retry.backoff())
            .when(RepoError::is_transient)
            .notify(|err: &RepoError, delay: Duration| {
                tracing::warn!(
                    invoice_id = %settlement.invoice_id,
                    error = %err,
                    ?delay,
                    "settlement conflicted, retrying"
                );
            })
            .await
            .map_err(|e| fail("settle_invoice", e))?;

        tracing::info!(
            invoice_id = %invoice_id,
            amount = %settlement.amount,
            reference = %settlement.reference,
            elapsed = ?start.elapsed(),
            "handled settle_invoice"
        );
        Ok(invoice_id)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // User Directory
    // ─────────────────────────────────────────────────────────────────────────────

    /// Lists one page of users, ascending by id.
    #[tracing::instrument(skip_all)]
    pub async fn list_users(&self, query: ListUsersQuery) -> Result<Vec<User>, AppError> {
        let start = Instant::now();

        let page = validate_list_users(&query).map_err(|e| fail("list_users", e))?;

        // Users change outside this service; not cached.
        let users = self
            .repo
            .list_users(page)
            .await
            .map_err(|e| fail("list_users", e))?;

        tracing::info!(count = users.len(), elapsed = ?start.elapsed(), "handled list_users");
        Ok(users)
    }
}
