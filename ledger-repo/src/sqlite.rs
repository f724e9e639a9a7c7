//! SQLite repository adapter.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool};
use std::str::FromStr;

use ledger_types::{
    DomainError, Invoice, InvoiceId, InvoiceReceipt, LedgerRepository, NewInvoice, RepoError,
    Settlement, User, UserDirectory, UserId, UserPage,
};

use crate::errors;
use crate::finish_transaction;
use crate::types::{DbInvoice, DbInvoiceReceipt, DbUser};

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
///
/// SQLite serializes writers, so every transaction is serializable without
/// extra configuration; lock contention surfaces as a transient error.
pub struct SqliteRepo {
    pool: SqlitePool,
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            // Remove query parameters
            let path = path.split('?').next().unwrap_or(path);
            if !is_in_memory(database_url) {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?;

        // Every connection to `:memory:` opens its own empty database, so an
        // in-memory pool is pinned to one long-lived connection.
        let pool_options = if is_in_memory(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };

        Self::connect(pool_options, options).await
    }

    /// Creates a repository over an on-disk database with explicit connect
    /// options, such as a short busy timeout.
    pub async fn with_options(options: SqliteConnectOptions) -> anyhow::Result<Self> {
        Self::connect(SqlitePoolOptions::new(), options).await
    }

    async fn connect(
        pool_options: SqlitePoolOptions,
        options: SqliteConnectOptions,
    ) -> anyhow::Result<Self> {
        let options = options.create_if_missing(true).foreign_keys(true);
        let pool = pool_options.connect_with(options).await?;

        let repo = Self { pool };
        repo.create_schema().await?;
        Ok(repo)
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the database schema (for testing with existing pool).
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        let ddl = include_str!("../migrations/0001_create_tables.sql");
        sqlx::query(ddl)
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(())
    }
}

/// Both settlement steps, run inside the caller's transaction.
async fn settle_in_tx(
    db_tx: &mut sqlx::Transaction<'static, Sqlite>,
    settlement: &Settlement,
) -> Result<InvoiceId, RepoError> {
    let amount = settlement.amount.minor_units();
    let unusable = || {
        RepoError::Domain(DomainError::UnusableInvoice {
            invoice_id: settlement.invoice_id,
            amount: settlement.amount,
        })
    };

    // Pay the user of the matching pending invoice. SQLite turns an
    // overflowing integer sum into REAL, so the headroom is checked first.
    let credited = sqlx::query(
        r#"UPDATE users
           SET balance = balance + ?
           WHERE id = (SELECT users.id
                       FROM users
                       JOIN invoices ON users.id = invoices.user_id
                       WHERE invoices.id = ?
                       AND invoices.amount = ?
                       AND invoices.status = 'pending')
           AND balance <= 9223372036854775807 - ?"#,
    )
    .bind(amount)
    .bind(settlement.invoice_id.get())
    .bind(amount)
    .bind(amount)
    .execute(&mut **db_tx)
    .await
    .map_err(errors::sqlite)?;

    if credited.rows_affected() != 1 {
        return Err(unusable());
    }

    // Set the matching pending invoice status to paid
    let paid: Vec<i64> = sqlx::query_scalar(
        r#"UPDATE invoices
           SET status = 'paid'
           WHERE id = ?
           AND amount = ?
           AND status = 'pending'
           RETURNING id"#,
    )
    .bind(settlement.invoice_id.get())
    .bind(amount)
    .fetch_all(&mut **db_tx)
    .await
    .map_err(errors::sqlite)?;

    match paid.as_slice() {
        [id] if *id == settlement.invoice_id.get() => Ok(InvoiceId::new(*id)),
        _ => Err(unusable()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl UserDirectory for SqliteRepo {
    async fn user_exists(&self, id: UserId) -> Result<bool, RepoError> {
        let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM users WHERE id = ?"#)
            .bind(id.get())
            .fetch_one(&self.pool)
            .await
            .map_err(errors::sqlite)?;

        Ok(count > 0)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepoError> {
        let row: Option<DbUser> = sqlx::query_as(
            r#"SELECT id, first_name, last_name, balance FROM users WHERE id = ?"#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(errors::sqlite)?;

        Ok(row.map(DbUser::into_domain))
    }

    async fn list_users(&self, page: UserPage) -> Result<Vec<User>, RepoError> {
        let rows: Vec<DbUser> = sqlx::query_as(
            r#"SELECT id, first_name, last_name, balance FROM users
               WHERE id > ?
               ORDER BY id ASC
               LIMIT ?"#,
        )
        .bind(page.from_id)
        .bind(page.count)
        .fetch_all(&self.pool)
        .await
        .map_err(errors::sqlite)?;

        Ok(rows.into_iter().map(DbUser::into_domain).collect())
    }
}

#[async_trait]
impl LedgerRepository for SqliteRepo {
    async fn insert_invoice(&self, invoice: &NewInvoice) -> Result<InvoiceReceipt, RepoError> {
        let row: DbInvoiceReceipt = sqlx::query_as(
            r#"INSERT INTO invoices (user_id, amount, label) VALUES (?, ?, ?)
               RETURNING id, status"#,
        )
        .bind(invoice.user_id.get())
        .bind(invoice.amount.minor_units())
        .bind(&invoice.label)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| errors::insert_invoice(e, invoice, errors::sqlite))?;

        Ok(row.into())
    }

    async fn get_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, RepoError> {
        let row: Option<DbInvoice> = sqlx::query_as(
            r#"SELECT id, user_id, amount, label, status FROM invoices WHERE id = ?"#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(errors::sqlite)?;

        row.map(DbInvoice::into_domain).transpose()
    }

    async fn settle_invoice(&self, settlement: &Settlement) -> Result<InvoiceId, RepoError> {
        let mut db_tx = self.pool.begin().await.map_err(errors::sqlite_tx)?;
        let outcome = settle_in_tx(&mut db_tx, settlement).await;
        finish_transaction(db_tx, outcome, errors::sqlite_tx).await
    }
}
