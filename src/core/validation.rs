use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::{BatchValidationReport, InvoiceValidationReport, SiiError, ValidationError};
use super::types::*;

/// Absolute tolerance for the total-consistency invariant.
pub const TOTAL_TOLERANCE: Decimal = dec!(0.01);

/// Submission-window configuration.
///
/// The legal deadline is counted in whole calendar days from the issue date,
/// uniformly regardless of currency or locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Days after issue within which a record must be submitted.
    pub window_days: i64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { window_days: 4 }
    }
}

impl ValidationConfig {
    /// The extended window of the large-filer regime.
    pub fn large_filer() -> Self {
        Self { window_days: 8 }
    }
}

/// Validate an issued invoice. Returns all violations found, not just the
/// first — callers get a complete report in one pass.
pub fn validate_issued(
    invoice: &IssuedInvoice,
    today: NaiveDate,
    config: &ValidationConfig,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_tax_id(&invoice.issuer.tax_id, "issuer.tax_id", &mut errors);
    validate_tax_id(
        &invoice.counterparty.tax_id,
        "counterparty.tax_id",
        &mut errors,
    );
    validate_party_name(&invoice.issuer.name, "issuer.name", &mut errors);
    validate_party_name(&invoice.counterparty.name, "counterparty.name", &mut errors);

    validate_common(
        &invoice.identity,
        invoice.total,
        &invoice.lines,
        invoice.rectification.as_ref(),
        today,
        config,
        &mut errors,
    );

    errors
}

/// Validate a received invoice. Same accumulate-all discipline as
/// [`validate_issued`], plus the deduction-percentage rule.
pub fn validate_received(
    invoice: &ReceivedInvoice,
    today: NaiveDate,
    config: &ValidationConfig,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_tax_id(&invoice.supplier.tax_id, "supplier.tax_id", &mut errors);
    validate_tax_id(&invoice.recipient.tax_id, "recipient.tax_id", &mut errors);
    validate_party_name(&invoice.supplier.name, "supplier.name", &mut errors);
    validate_party_name(&invoice.recipient.name, "recipient.name", &mut errors);

    validate_common(
        &invoice.identity,
        invoice.total,
        &invoice.lines,
        invoice.rectification.as_ref(),
        today,
        config,
        &mut errors,
    );

    if let Some(rate) = invoice.deductible_rate {
        if rate < Decimal::ZERO || rate > dec!(100) {
            errors.push(ValidationError::new(
                "deductible_rate",
                format!("deductible percentage must be between 0 and 100, got {rate}"),
            ));
        }
    }

    errors
}

/// Validate a whole batch, including the holder identity. Every invoice is
/// checked to completion; any violation aborts the batch before any network
/// activity, carrying the full per-invoice report.
pub fn validate_batch(
    batch: &SubmissionBatch,
    today: NaiveDate,
    config: &ValidationConfig,
) -> Result<(), SiiError> {
    let mut report = BatchValidationReport::default();

    let mut holder_errors = Vec::new();
    validate_tax_id(&batch.holder.tax_id, "holder.tax_id", &mut holder_errors);
    validate_party_name(&batch.holder.name, "holder.name", &mut holder_errors);
    if !holder_errors.is_empty() {
        report.invoices.push(InvoiceValidationReport {
            invoice_number: format!("holder {}", batch.holder.tax_id),
            errors: holder_errors,
        });
    }

    match &batch.invoices {
        BatchInvoices::Issued(invoices) => {
            for invoice in invoices {
                let errors = validate_issued(invoice, today, config);
                if !errors.is_empty() {
                    report.invoices.push(InvoiceValidationReport {
                        invoice_number: invoice.identity.number.clone(),
                        errors,
                    });
                }
            }
        }
        BatchInvoices::Received(invoices) => {
            for invoice in invoices {
                let errors = validate_received(invoice, today, config);
                if !errors.is_empty() {
                    report.invoices.push(InvoiceValidationReport {
                        invoice_number: invoice.identity.number.clone(),
                        errors,
                    });
                }
            }
        }
    }

    if report.is_empty() {
        Ok(())
    } else {
        Err(SiiError::Validation(report))
    }
}

fn validate_tax_id(tax_id: &str, field: &str, errors: &mut Vec<ValidationError>) {
    if TaxIdKind::detect(tax_id).is_none() {
        errors.push(ValidationError::new(
            field,
            format!("'{tax_id}' is not a valid NIF, NIE, or company NIF"),
        ));
    }
}

fn validate_party_name(name: &str, field: &str, errors: &mut Vec<ValidationError>) {
    if name.trim().is_empty() {
        errors.push(ValidationError::new(field, "name must not be empty"));
    }
}

fn validate_common(
    identity: &InvoiceIdentity,
    total: Decimal,
    lines: &[VatLine],
    rectification: Option<&Rectification>,
    today: NaiveDate,
    config: &ValidationConfig,
    errors: &mut Vec<ValidationError>,
) {
    if identity.number.trim().is_empty() {
        errors.push(ValidationError::new(
            "number",
            "invoice number must not be empty",
        ));
    } else if identity.number.chars().count() > MAX_INVOICE_NUMBER_LEN {
        errors.push(ValidationError::new(
            "number",
            format!(
                "invoice number must not exceed {MAX_INVOICE_NUMBER_LEN} characters, got {}",
                identity.number.chars().count()
            ),
        ));
    }

    // Legal submission window, counted in whole calendar days.
    let age_days = (today - identity.issue_date).num_days();
    if age_days < 0 {
        errors.push(ValidationError::new(
            "issue_date",
            format!("issue date {} is in the future", identity.issue_date),
        ));
    } else if age_days > config.window_days {
        errors.push(ValidationError::new(
            "issue_date",
            format!(
                "invoice issued {age_days} days ago exceeds the {}-day submission window",
                config.window_days
            ),
        ));
    }

    if total < Decimal::ZERO {
        errors.push(ValidationError::new(
            "total",
            format!("total amount must not be negative, got {total}"),
        ));
    }

    if lines.is_empty() {
        errors.push(ValidationError::new(
            "lines",
            "invoice must have at least one VAT line",
        ));
    }

    for (i, line) in lines.iter().enumerate() {
        validate_line(line, i, errors);
    }

    // Total must reconcile with the line breakdown.
    if !lines.is_empty() {
        let line_sum: Decimal = lines.iter().map(|l| l.base + l.amount).sum();
        if (total - line_sum).abs() > TOTAL_TOLERANCE {
            errors.push(ValidationError::new(
                "total",
                format!(
                    "total {total} does not match sum of line base + VAT {line_sum} \
                     (tolerance {TOTAL_TOLERANCE})"
                ),
            ));
        }
    }

    // Rectification type codes and rectification details travel together.
    match (identity.invoice_type.is_rectification(), rectification) {
        (true, None) => errors.push(ValidationError::new(
            "rectification",
            format!(
                "invoice type {} requires a rectification detail referencing the original",
                identity.invoice_type.code()
            ),
        )),
        (false, Some(_)) => errors.push(ValidationError::new(
            "rectification",
            format!(
                "invoice type {} must not carry a rectification detail",
                identity.invoice_type.code()
            ),
        )),
        _ => {}
    }

    if let Some(rect) = rectification {
        if rect.original_number.trim().is_empty() {
            errors.push(ValidationError::new(
                "rectification.original_number",
                "rectified invoice number must not be empty",
            ));
        }
    }
}

fn validate_line(line: &VatLine, index: usize, errors: &mut Vec<ValidationError>) {
    let prefix = format!("lines[{index}]");

    if line.vat_key.trim().is_empty() {
        errors.push(ValidationError::new(
            format!("{prefix}.vat_key"),
            "VAT regime key must not be empty",
        ));
    }

    if line.base < Decimal::ZERO {
        errors.push(ValidationError::new(
            format!("{prefix}.base"),
            format!("taxable base must not be negative, got {}", line.base),
        ));
    }

    if line.rate < Decimal::ZERO {
        errors.push(ValidationError::new(
            format!("{prefix}.rate"),
            format!("VAT rate must not be negative, got {}", line.rate),
        ));
    } else if line.rate > dec!(100) {
        errors.push(ValidationError::new(
            format!("{prefix}.rate"),
            format!("VAT rate must not exceed 100, got {}", line.rate),
        ));
    }

    if line.amount < Decimal::ZERO {
        errors.push(ValidationError::new(
            format!("{prefix}.amount"),
            format!("VAT amount must not be negative, got {}", line.amount),
        ));
    }

    match (line.surcharge_rate, line.surcharge_amount) {
        (Some(rate), Some(amount)) => {
            if rate < Decimal::ZERO || amount < Decimal::ZERO {
                errors.push(ValidationError::new(
                    format!("{prefix}.surcharge"),
                    "equivalence surcharge rate and amount must not be negative",
                ));
            }
        }
        (Some(_), None) | (None, Some(_)) => {
            errors.push(ValidationError::new(
                format!("{prefix}.surcharge"),
                "equivalence surcharge rate and amount must be given together",
            ));
        }
        (None, None) => {}
    }
}
