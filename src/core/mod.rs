//! Core invoice types, validation, and book routing.
//!
//! This module provides the foundational types for SII reporting: issued and
//! received invoice records, the holder/counterparty model, accumulate-all
//! validation (including the legal submission window), and the deterministic
//! routing of invoices into ledger books.

mod books;
mod builder;
mod error;
mod types;
mod validation;

pub use books::*;
pub use builder::*;
pub use error::*;
pub use types::*;
pub use validation::*;
