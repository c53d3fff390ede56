use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Maximum length of an invoice number accepted by the authority.
pub const MAX_INVOICE_NUMBER_LEN: usize = 60;

/// A tax-identified legal entity: the holder, an issuer, or a counterparty.
///
/// Immutable once attached to an invoice — the pipeline never rewrites
/// party data after batch construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    /// Spanish tax identifier (NIF, NIE, or company NIF).
    pub tax_id: String,
    /// Registered display name.
    pub name: String,
    /// ISO 3166-1 alpha-2 country code for foreign counterparties.
    pub country: Option<String>,
}

impl Party {
    pub fn new(tax_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tax_id: tax_id.into(),
            name: name.into(),
            country: None,
        }
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }
}

/// The three accepted tax-identifier shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxIdKind {
    /// Personal NIF: 8 digits + control letter (e.g. `87654321K`).
    Nif,
    /// Foreigner NIE: X/Y/Z + 7 digits + control letter (e.g. `X1234567L`).
    Nie,
    /// Company NIF: organisation letter + 7 digits + control digit/letter
    /// (e.g. `B76365789`, `N8273855I`).
    Company,
}

impl TaxIdKind {
    /// Classify a tax identifier, or `None` if it matches no accepted shape.
    pub fn detect(tax_id: &str) -> Option<Self> {
        let s = tax_id.trim();
        if s.len() != 9 || !s.is_ascii() {
            return None;
        }
        let bytes = s.as_bytes();
        let first = bytes[0];
        let last = bytes[8];
        let mid = &s[1..8];

        if first.is_ascii_digit() {
            // 8 digits + control letter
            if s[..8].bytes().all(|b| b.is_ascii_digit()) && last.is_ascii_uppercase() {
                return Some(Self::Nif);
            }
            return None;
        }

        if matches!(first, b'X' | b'Y' | b'Z') {
            if mid.bytes().all(|b| b.is_ascii_digit()) && last.is_ascii_uppercase() {
                return Some(Self::Nie);
            }
            return None;
        }

        const ORG_LETTERS: &[u8] = b"ABCDEFGHJNPQRSUVW";
        if ORG_LETTERS.contains(&first)
            && mid.bytes().all(|b| b.is_ascii_digit())
            && (last.is_ascii_digit() || last.is_ascii_uppercase())
        {
            return Some(Self::Company);
        }
        None
    }
}

/// Invoice type codes: `F1`–`F6` standard families, `R1`–`R5` rectifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoiceType {
    /// F1 — complete invoice.
    F1,
    /// F2 — simplified invoice (ticket).
    F2,
    /// F3 — invoice replacing simplified invoices.
    F3,
    /// F4 — summary entry for a batch of invoices.
    F4,
    /// F5 — import (DUA-backed).
    F5,
    /// F6 — accounting supporting document.
    F6,
    /// R1 — rectification on legal grounds (art. 80.1/80.2).
    R1,
    /// R2 — rectification: insolvency (art. 80.3).
    R2,
    /// R3 — rectification: bad debt (art. 80.4).
    R3,
    /// R4 — rectification: other grounds.
    R4,
    /// R5 — rectification of a simplified invoice.
    R5,
}

impl InvoiceType {
    /// Wire code, e.g. `"F1"`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::F1 => "F1",
            Self::F2 => "F2",
            Self::F3 => "F3",
            Self::F4 => "F4",
            Self::F5 => "F5",
            Self::F6 => "F6",
            Self::R1 => "R1",
            Self::R2 => "R2",
            Self::R3 => "R3",
            Self::R4 => "R4",
            Self::R5 => "R5",
        }
    }

    /// Parse from the wire code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "F1" => Some(Self::F1),
            "F2" => Some(Self::F2),
            "F3" => Some(Self::F3),
            "F4" => Some(Self::F4),
            "F5" => Some(Self::F5),
            "F6" => Some(Self::F6),
            "R1" => Some(Self::R1),
            "R2" => Some(Self::R2),
            "R3" => Some(Self::R3),
            "R4" => Some(Self::R4),
            "R5" => Some(Self::R5),
            _ => None,
        }
    }

    /// True for the `R1`–`R5` family.
    pub fn is_rectification(&self) -> bool {
        matches!(self, Self::R1 | Self::R2 | Self::R3 | Self::R4 | Self::R5)
    }
}

/// How a rectification amends the original record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RectificationKind {
    /// S — full substitution of the original amounts.
    Substitution,
    /// I — incremental correction by differences.
    Differences,
}

impl RectificationKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Substitution => "S",
            Self::Differences => "I",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "S" => Some(Self::Substitution),
            "I" => Some(Self::Differences),
            _ => None,
        }
    }
}

/// Reference to the original invoice a rectification amends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rectification {
    /// Number of the invoice being rectified.
    pub original_number: String,
    /// Issue date of the invoice being rectified.
    pub original_issue_date: NaiveDate,
    pub kind: RectificationKind,
}

/// Nature of the underlying operation, reported with each invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    /// E — delivery of goods (entrega de bienes).
    Goods,
    /// S — supply of services (prestación de servicios).
    Services,
    /// M — mixed operation.
    Mixed,
}

impl OperationKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Goods => "E",
            Self::Services => "S",
            Self::Mixed => "M",
        }
    }
}

/// One VAT breakdown line of an invoice.
///
/// Lines are immutable and belong to exactly one invoice; the serializer
/// emits them in their original order, exactly once each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatLine {
    /// VAT regime key (clave de régimen, e.g. `"01"` general).
    pub vat_key: String,
    /// Taxable base, ≥ 0.
    pub base: Decimal,
    /// VAT rate percentage, 0–100.
    pub rate: Decimal,
    /// VAT amount, ≥ 0.
    pub amount: Decimal,
    /// Equivalence surcharge rate (recargo de equivalencia), if any.
    pub surcharge_rate: Option<Decimal>,
    /// Equivalence surcharge amount, paired with `surcharge_rate`.
    pub surcharge_amount: Option<Decimal>,
}

/// What identifies an invoice towards the authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceIdentity {
    /// Invoice number, at most [`MAX_INVOICE_NUMBER_LEN`] characters.
    pub number: String,
    pub issue_date: NaiveDate,
    pub invoice_type: InvoiceType,
}

/// An invoice issued by the holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedInvoice {
    pub identity: InvoiceIdentity,
    /// The issuing party (normally the holder).
    pub issuer: Party,
    /// The invoice recipient.
    pub counterparty: Party,
    pub operation: OperationKind,
    /// Free-text operation description.
    pub description: String,
    /// Total invoice amount including VAT.
    pub total: Decimal,
    pub lines: Vec<VatLine>,
    /// Present iff this is a rectification record.
    pub rectification: Option<Rectification>,
    /// Intra-community supply flag.
    pub intracommunity: bool,
}

/// An invoice received by the holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedInvoice {
    pub identity: InvoiceIdentity,
    /// The supplier who issued the invoice.
    pub supplier: Party,
    /// The receiving party (normally the holder).
    pub recipient: Party,
    pub operation: OperationKind,
    pub description: String,
    pub total: Decimal,
    pub lines: Vec<VatLine>,
    /// Present iff this is a correction record.
    pub rectification: Option<Rectification>,
    /// Intra-community acquisition flag.
    pub intracommunity: bool,
    /// Import backed by a customs declaration (DUA).
    pub import: bool,
    /// Deductible percentage of input VAT, 0–100, if not fully deductible.
    pub deductible_rate: Option<Decimal>,
    /// Date the invoice was entered in the accounting records.
    pub accounting_date: Option<NaiveDate>,
}

/// Settlement period within a fiscal year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodCode {
    /// Monthly period, 1–12.
    Month(u8),
    /// Annual summary period (`0A`).
    Annual,
}

impl PeriodCode {
    /// Wire code: `"01"`–`"12"` or `"0A"`.
    pub fn code(&self) -> String {
        match self {
            Self::Month(m) => format!("{m:02}"),
            Self::Annual => "0A".to_string(),
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        if code == "0A" {
            return Some(Self::Annual);
        }
        match code.parse::<u8>() {
            Ok(m) if (1..=12).contains(&m) => Some(Self::Month(m)),
            _ => None,
        }
    }
}

/// Invoices of one direction — the direction is the variant, never a flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchInvoices {
    Issued(Vec<IssuedInvoice>),
    Received(Vec<ReceivedInvoice>),
}

impl BatchInvoices {
    pub fn len(&self) -> usize {
        match self {
            Self::Issued(v) => v.len(),
            Self::Received(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One submission unit: holder identity, settlement period, and an ordered
/// list of invoices of a single direction. Created by the caller, consumed
/// once per submission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionBatch {
    pub holder: Party,
    pub fiscal_year: i32,
    pub period: PeriodCode,
    pub invoices: BatchInvoices,
}

impl SubmissionBatch {
    pub fn issued(
        holder: Party,
        fiscal_year: i32,
        period: PeriodCode,
        invoices: Vec<IssuedInvoice>,
    ) -> Self {
        Self {
            holder,
            fiscal_year,
            period,
            invoices: BatchInvoices::Issued(invoices),
        }
    }

    pub fn received(
        holder: Party,
        fiscal_year: i32,
        period: PeriodCode,
        invoices: Vec<ReceivedInvoice>,
    ) -> Self {
        Self {
            holder,
            fiscal_year,
            period,
            invoices: BatchInvoices::Received(invoices),
        }
    }
}

/// Ledger book categories. `A*` books hold issued records, `B*` received.
///
/// `Ord` keeps partition iteration and merged outcome order deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BookCode {
    /// Standard issued invoices.
    A1,
    /// Rectified issued invoices.
    A2,
    /// Collections on issued invoices (cash-basis ledger). Routed records
    /// never land here — collections are a separate record family served by
    /// its own endpoint.
    A3,
    /// Standard received invoices.
    B1,
    /// Corrected received invoices.
    B2,
    /// Intra-community acquisitions.
    B3,
    /// Imports and customs duty documents.
    B4,
}

impl BookCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::A3 => "A3",
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::B3 => "B3",
            Self::B4 => "B4",
        }
    }

    /// True for the issued-side books.
    pub fn is_issued(&self) -> bool {
        matches!(self, Self::A1 | Self::A2 | Self::A3)
    }
}

impl std::fmt::Display for BookCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Terminal (or polled) state of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionStatus {
    Pending,
    Processing,
    Accepted,
    AcceptedWithErrors,
    Rejected,
}

impl SubmissionStatus {
    /// True once the authority will not change this status on its own.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Accepted | Self::AcceptedWithErrors | Self::Rejected
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Accepted => "ACCEPTED",
            Self::AcceptedWithErrors => "ACCEPTED_WITH_ERRORS",
            Self::Rejected => "REJECTED",
        }
    }
}

/// Outcome of one invoice within a merged submission result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceOutcome {
    pub invoice_number: String,
    pub book: BookCode,
    pub accepted: bool,
    /// Authority-side rejection detail, if any.
    pub error: Option<String>,
}

/// Merged result of one submission attempt across all book partitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    /// True only if every partition was fully accepted.
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    pub submission_id: Option<String>,
    pub accepted: u32,
    pub rejected: u32,
    /// Per-invoice outcomes, concatenated in book order.
    pub outcomes: Vec<InvoiceOutcome>,
    /// Opaque verification reference (CSV stamp) when issued.
    pub verification: Option<String>,
}

impl SubmissionResult {
    pub fn status(&self) -> SubmissionStatus {
        if self.rejected == 0 {
            SubmissionStatus::Accepted
        } else if self.accepted > 0 {
            SubmissionStatus::AcceptedWithErrors
        } else {
            SubmissionStatus::Rejected
        }
    }
}

/// Cached status of a past submission, kept until `expires_at` for polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedSubmission {
    pub submission_id: String,
    pub status: SubmissionStatus,
    pub submitted_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub verification: Option<String>,
    pub invoice_count: u32,
    pub accepted: u32,
    pub rejected: u32,
    pub expires_at: DateTime<Utc>,
}
