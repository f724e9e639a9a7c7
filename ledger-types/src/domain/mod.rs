//! Domain models for the invoice ledger.

pub mod invoice;
pub mod money;
pub mod user;

pub use invoice::{Invoice, InvoiceId, InvoiceStatus};
pub use money::Money;
pub use user::{User, UserId};
