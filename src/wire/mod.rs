//! Wire payloads and remote error decoding.
//!
//! Builds the SOAP-style submission envelopes, parses success responses and
//! fault blocks, and maps the authority's error-code catalog onto the crate
//! error taxonomy.
//!
//! # Example
//!
//! ```ignore
//! use sii::core::*;
//! use sii::wire;
//!
//! let payload = wire::build_issued_payload(&holder, 2026, PeriodCode::Month(7),
//!     BookCode::A1, &invoices)?;
//! ```

mod codes;
mod envelope;
mod fault;
mod response;
pub(crate) mod xml;

pub use codes::{
    DUPLICATE_INVOICE_CODE, ErrorCategory, categorize, describe, error_for, error_for_fault,
    fault_is_retryable, is_retryable,
};
pub use envelope::{build_issued_payload, build_received_payload, envelope_tag};
pub use fault::{Fault, parse_fault};
pub use response::{DeliveryStatus, RecordOutcome, SubmissionResponse, parse_response};
pub use xml::{format_amount, format_date};

/// SII wire format version reported in every envelope header.
pub const SII_VERSION: &str = "1.1";

/// Namespace URIs of the submission envelope.
pub mod ns {
    pub const SOAP_ENV: &str = "http://schemas.xmlsoap.org/soap/envelope/";
    pub const SII: &str = "https://www2.agenciatributaria.gob.es/static_files/common/internet/dep/aplicaciones/es/aeat/ssii/fact/ws/SuministroInformacion.xsd";
    pub const SII_LR: &str = "https://www2.agenciatributaria.gob.es/static_files/common/internet/dep/aplicaciones/es/aeat/ssii/fact/ws/SuministroLR.xsd";
}
