//! # Ledger Types
//!
//! Domain types, validation rules and port traits for the invoice ledger.
//! This crate has ZERO IO dependencies - only data structures,
//! business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (Money, User, Invoice)
//! - `validation/` - Request checks that run before any storage access
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for API boundaries
//! - `error/` - Error taxonomy shared by every layer

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;
pub mod validation;

// Re-export commonly used types
pub use domain::{Invoice, InvoiceId, InvoiceStatus, Money, User, UserId};
pub use dto::*;
pub use error::{AppError, DomainError, ErrorKind, RepoError};
pub use ports::{LedgerRepository, UserDirectory};
