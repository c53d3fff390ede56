use thiserror::Error;

use super::types::BookCode;

/// Errors that can occur while preparing or submitting a batch.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SiiError {
    /// One or more invoices failed pre-submission validation. No network
    /// activity happened for this batch.
    #[error("validation failed: {0}")]
    Validation(BatchValidationReport),

    /// The authority rejected the client identity (certificate, signature,
    /// or authorisation). Never retried.
    #[error("authentication rejected [{code}]: {message}")]
    Authentication { code: String, message: String },

    /// The authority rejected the request content or a business rule.
    /// Never retried.
    #[error("request rejected [{code}]: {message}")]
    BadRequest { code: String, message: String },

    /// The submission conflicts with an already-registered record
    /// (duplicate invoice). Never retried.
    #[error("conflicting submission [{code}]: {message}")]
    Conflict { code: String, message: String },

    /// The service is unavailable or overloaded. Retried with backoff
    /// while attempts remain.
    #[error("service unavailable [{code}]: {message}")]
    ServiceUnavailable { code: String, message: String },

    /// A targeted submission selected a book no invoice routed into.
    #[error("no invoices routed to book {0}")]
    EmptyBook(BookCode),

    /// Network-level failure with no structured fault available.
    #[error("transport error: {0}")]
    Transport(String),

    /// Client credential or TLS configuration problem.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Payload generation or response parsing error.
    #[error("XML error: {0}")]
    Xml(String),
}

/// A single field-level validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dot-separated path to the invalid field (e.g. "lines[0].rate").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// All validation errors of one invoice, keyed by its number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceValidationReport {
    pub invoice_number: String,
    pub errors: Vec<ValidationError>,
}

/// The complete validation report of a rejected batch — one entry per
/// failing invoice, each carrying every violation found.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchValidationReport {
    pub invoices: Vec<InvoiceValidationReport>,
}

impl BatchValidationReport {
    pub fn is_empty(&self) -> bool {
        self.invoices.is_empty()
    }

    /// Total number of field-level violations across the batch.
    pub fn error_count(&self) -> usize {
        self.invoices.iter().map(|r| r.errors.len()).sum()
    }
}

impl std::fmt::Display for BatchValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} invoice(s) rejected with {} error(s)",
            self.invoices.len(),
            self.error_count()
        )?;
        for report in &self.invoices {
            for err in &report.errors {
                write!(f, "; [{}] {}", report.invoice_number, err)?;
            }
        }
        Ok(())
    }
}
