//! Classification of sqlx errors into the ledger error taxonomy.

use ledger_types::{DomainError, NewInvoice, RepoError};

/// Failures that say nothing about the request and may succeed on retry.
fn is_connectivity(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::WorkerCrashed
    )
}

#[cfg(feature = "postgres")]
fn is_pg_conflict(err: &sqlx::Error) -> bool {
    // 40001 serialization_failure, 40P01 deadlock_detected
    match err {
        sqlx::Error::Database(db) => matches!(db.code().as_deref(), Some("40001" | "40P01")),
        _ => false,
    }
}

/// 22003 numeric_value_out_of_range, raised by a bigint overflow.
#[cfg(feature = "postgres")]
pub(crate) fn is_pg_out_of_range(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("22003"),
        _ => false,
    }
}

#[cfg(feature = "sqlite")]
fn is_sqlite_busy(err: &sqlx::Error) -> bool {
    // Extended result codes keep the primary code in the low byte:
    // SQLITE_BUSY (5) and SQLITE_LOCKED (6).
    match err {
        sqlx::Error::Database(db) => db
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .is_some_and(|code| matches!(code & 0xff, 5 | 6)),
        _ => false,
    }
}

fn classify(
    err: sqlx::Error,
    is_conflict: fn(&sqlx::Error) -> bool,
    fallback: fn(String) -> RepoError,
) -> RepoError {
    if is_connectivity(&err) || is_conflict(&err) {
        RepoError::Transient(err.to_string())
    } else {
        fallback(err.to_string())
    }
}

/// Maps a statement error from Postgres.
#[cfg(feature = "postgres")]
pub(crate) fn pg(err: sqlx::Error) -> RepoError {
    classify(err, is_pg_conflict, RepoError::Database)
}

/// Maps a begin/commit/rollback error from Postgres.
#[cfg(feature = "postgres")]
pub(crate) fn pg_tx(err: sqlx::Error) -> RepoError {
    classify(err, is_pg_conflict, RepoError::Transaction)
}

/// Maps a statement error from SQLite.
#[cfg(feature = "sqlite")]
pub(crate) fn sqlite(err: sqlx::Error) -> RepoError {
    classify(err, is_sqlite_busy, RepoError::Database)
}

/// Maps a begin/commit/rollback error from SQLite.
#[cfg(feature = "sqlite")]
pub(crate) fn sqlite_tx(err: sqlx::Error) -> RepoError {
    classify(err, is_sqlite_busy, RepoError::Transaction)
}

/// Maps an invoice insert error, turning a foreign-key violation on
/// `invoices.user_id` into the same validation error the existence check
/// produces. Closes the race between that check and the insert.
pub(crate) fn insert_invoice(
    err: sqlx::Error,
    invoice: &NewInvoice,
    otherwise: fn(sqlx::Error) -> RepoError,
) -> RepoError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            RepoError::Domain(DomainError::UserNotFound(invoice.user_id))
        }
        _ => otherwise(err),
    }
}
