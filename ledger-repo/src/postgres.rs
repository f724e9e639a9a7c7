//! PostgreSQL repository adapter.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres};

use ledger_types::{
    DomainError, Invoice, InvoiceId, InvoiceReceipt, LedgerRepository, NewInvoice, RepoError,
    Settlement, User, UserDirectory, UserId, UserPage,
};

use crate::errors;
use crate::finish_transaction;
use crate::types::{DbInvoice, DbInvoiceReceipt, DbUser};

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL Repository
// ─────────────────────────────────────────────────────────────────────────────

/// PostgreSQL repository; settlements run at SERIALIZABLE isolation.
pub struct PostgresRepo {
    pool: PgPool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &PgPool, sql: &str, name: &str) -> Result<(), anyhow::Error> {
    for statement in sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
        }
    }
    Ok(())
}

/// Runs all database migrations.
async fn run_migrations(pool: &PgPool) -> Result<(), anyhow::Error> {
    execute_migration(
        pool,
        include_str!("../migrations/0001_create_tables_pg.sql"),
        "0001",
    )
    .await
}

impl PostgresRepo {
    /// Creates a new PostgreSQL repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Both settlement steps, run inside the caller's transaction.
async fn settle_in_tx(
    db_tx: &mut sqlx::Transaction<'static, Postgres>,
    settlement: &Settlement,
) -> Result<InvoiceId, RepoError> {
    let amount = settlement.amount.minor_units();
    let unusable = || {
        RepoError::Domain(DomainError::UnusableInvoice {
            invoice_id: settlement.invoice_id,
            amount: settlement.amount,
        })
    };

    // Pay the user of the matching pending invoice, unless the balance
    // has no headroom left for it
    let credited = sqlx::query(
        r#"UPDATE users
           SET balance = balance + $1
           WHERE id = (SELECT users.id
                       FROM users
                       JOIN invoices ON users.id = invoices.user_id
                       WHERE invoices.id = $2
                       AND invoices.amount = $1
                       AND invoices.status = 'pending')
           AND balance <= 9223372036854775807 - $1"#,
    )
    .bind(amount)
    .bind(settlement.invoice_id.get())
    .execute(&mut **db_tx)
    .await
    .map_err(|e| {
        if errors::is_pg_out_of_range(&e) {
            unusable()
        } else {
            errors::pg(e)
        }
    })?;

    if credited.rows_affected() != 1 {
        return Err(unusable());
    }

    // Set the matching pending invoice status to paid
    let paid: Vec<i64> = sqlx::query_scalar(
        r#"UPDATE invoices
           SET status = 'paid'
           WHERE id = $1
           AND amount = $2
           AND status = 'pending'
           RETURNING id"#,
    )
    .bind(settlement.invoice_id.get())
    .bind(amount)
    .fetch_all(&mut **db_tx)
    .await
    .map_err(errors::pg)?;

    match paid.as_slice() {
        [id] if *id == settlement.invoice_id.get() => Ok(InvoiceId::new(*id)),
        _ => Err(unusable()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl UserDirectory for PostgresRepo {
    async fn user_exists(&self, id: UserId) -> Result<bool, RepoError> {
        let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM users WHERE id = $1"#)
            .bind(id.get())
            .fetch_one(&self.pool)
            .await
            .map_err(errors::pg)?;

        Ok(count > 0)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepoError> {
        let row: Option<DbUser> = sqlx::query_as(
            r#"SELECT id, first_name, last_name, balance FROM users WHERE id = $1"#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(errors::pg)?;

        Ok(row.map(DbUser::into_domain))
    }

    async fn list_users(&self, page: UserPage) -> Result<Vec<User>, RepoError> {
        let rows: Vec<DbUser> = sqlx::query_as(
            r#"SELECT id, first_name, last_name, balance FROM users
               WHERE id > $1
               ORDER BY id ASC
               LIMIT $2"#,
        )
        .bind(page.from_id)
        .bind(page.count)
        .fetch_all(&self.pool)
        .await
        .map_err(errors::pg)?;

        Ok(rows.into_iter().map(DbUser::into_domain).collect())
    }
}

#[async_trait]
impl LedgerRepository for PostgresRepo {
    async fn insert_invoice(&self, invoice: &NewInvoice) -> Result<InvoiceReceipt, RepoError> {
        let row: DbInvoiceReceipt = sqlx::query_as(
            r#"INSERT INTO invoices (user_id, amount, label) VALUES ($1, $2, $3)
               RETURNING id, status"#,
        )
        .bind(invoice.user_id.get())
        .bind(invoice.amount.minor_units())
        .bind(&invoice.label)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| errors::insert_invoice(e, invoice, errors::pg))?;

        Ok(row.into())
    }

    async fn get_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, RepoError> {
        let row: Option<DbInvoice> = sqlx::query_as(
            r#"SELECT id, user_id, amount, label, status FROM invoices WHERE id = $1"#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(errors::pg)?;

        row.map(DbInvoice::into_domain).transpose()
    }

    async fn settle_invoice(&self, settlement: &Settlement) -> Result<InvoiceId, RepoError> {
        let mut db_tx = self.pool.begin().await.map_err(errors::pg_tx)?;

        // Must be the first statement of the transaction
        if let Err(e) = sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *db_tx)
            .await
        {
            return finish_transaction(db_tx, Err(errors::pg_tx(e)), errors::pg_tx).await;
        }

        let outcome = settle_in_tx(&mut db_tx, settlement).await;
        finish_transaction(db_tx, outcome, errors::pg_tx).await
    }
}
