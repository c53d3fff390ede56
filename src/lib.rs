//! # sii
//!
//! Real-time VAT reporting for the Spanish SII regime ("Suministro Inmediato
//! de Información"): invoice validation, book routing, wire-payload
//! generation, and resilient submission to the tax authority's endpoint
//! under the legal deadline (4 calendar days from issue, 8 for large filers).
//!
//! All monetary values use [`rust_decimal::Decimal`] — never floating point.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use sii::core::*;
//!
//! let invoice = IssuedInvoiceBuilder::new(
//!     "FA-2026-001",
//!     NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
//!     InvoiceType::F1,
//! )
//! .issuer(Party::new("B76365789", "ACME Ibérica SL"))
//! .counterparty(Party::new("87654321K", "Cliente Ejemplo"))
//! .description("Servicios de consultoría")
//! .add_line(VatLineBuilder::new("01", dec!(100.00), dec!(21.00)).build())
//! .total(dec!(121.00))
//! .build();
//!
//! let today = NaiveDate::from_ymd_opt(2026, 7, 3).unwrap();
//! assert!(validate_issued(&invoice, today, &ValidationConfig::default()).is_empty());
//! assert_eq!(route_issued(&invoice), BookCode::A1);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Invoice types, validation, book routing |
//! | `wire` | XML payload generation, fault/response parsing, error-code map |
//! | `transport` | Mutual-TLS client with retry/backoff and rate limiting |
//! | `submit` | Submission orchestrator, status cache, audit trail |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "wire")]
pub mod wire;

#[cfg(feature = "transport")]
pub mod transport;

#[cfg(feature = "submit")]
pub mod submit;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
