//! User directory port.

use crate::domain::{User, UserId};
use crate::dto::UserPage;
use crate::error::RepoError;

/// Read-only access to users. The ledger never creates or edits users.
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    /// Existence check used before creating an invoice.
    async fn user_exists(&self, id: UserId) -> Result<bool, RepoError>;

    /// Gets a user by ID.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepoError>;

    /// Users with `id > page.from_id`, ascending by id, at most `page.count`.
    async fn list_users(&self, page: UserPage) -> Result<Vec<User>, RepoError>;
}
