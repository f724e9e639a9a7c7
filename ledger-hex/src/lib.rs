//! # Ledger Hex
//!
//! Application service layer and HTTP adapter for the invoice ledger.
//!
//! ## Architecture
//!
//! - `service/` - Application service (validation, ledger, settlement engine)
//! - `retry/` - Backoff policy for retrying conflicted settlements
//! - `inbound/` - HTTP adapter (Axum server)
//!
//! The service is generic over `R: LedgerRepository`, allowing
//! different repository implementations to be injected.

pub mod inbound;
pub mod retry;
pub mod service;

#[cfg(test)]
mod service_tests;

pub use retry::RetryPolicy;
pub use service::LedgerService;
