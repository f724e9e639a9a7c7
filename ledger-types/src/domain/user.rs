//! User domain model.

use serde::{Deserialize, Serialize};

use super::money::Money;

/// Unique identifier for a User.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Creates a UserId from a raw database id.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A ledger user.
///
/// Users are owned by another system; the ledger only reads them and credits
/// their balance through settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    /// Balance in minor units
    pub balance: Money,
}

impl User {
    /// Reconstructs a user from stored fields.
    pub fn from_parts(id: UserId, first_name: String, last_name: String, balance: Money) -> Self {
        Self {
            id,
            first_name,
            last_name,
            balance,
        }
    }
}
