use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::types::*;

/// Builder for issued invoice records.
///
/// Assembly is unchecked — run [`validate_issued`](super::validate_issued)
/// (or submit through the pipeline, which validates batches as a whole)
/// before sending anything to the authority.
///
/// ```
/// use chrono::NaiveDate;
/// use rust_decimal_macros::dec;
/// use sii::core::*;
///
/// let invoice = IssuedInvoiceBuilder::new(
///     "FA-2026-001",
///     NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
///     InvoiceType::F1,
/// )
/// .issuer(Party::new("B76365789", "ACME Ibérica SL"))
/// .counterparty(Party::new("87654321K", "Cliente Ejemplo"))
/// .description("Servicios de consultoría")
/// .add_line(VatLineBuilder::new("01", dec!(100.00), dec!(21.00)).build())
/// .total(dec!(121.00))
/// .build();
/// assert_eq!(invoice.lines.len(), 1);
/// ```
pub struct IssuedInvoiceBuilder {
    identity: InvoiceIdentity,
    issuer: Party,
    counterparty: Party,
    operation: OperationKind,
    description: String,
    total: Decimal,
    lines: Vec<VatLine>,
    rectification: Option<Rectification>,
    intracommunity: bool,
}

impl IssuedInvoiceBuilder {
    pub fn new(number: impl Into<String>, issue_date: NaiveDate, invoice_type: InvoiceType) -> Self {
        Self {
            identity: InvoiceIdentity {
                number: number.into(),
                issue_date,
                invoice_type,
            },
            issuer: Party::new("", ""),
            counterparty: Party::new("", ""),
            operation: OperationKind::Services,
            description: String::new(),
            total: Decimal::ZERO,
            lines: Vec::new(),
            rectification: None,
            intracommunity: false,
        }
    }

    pub fn issuer(mut self, party: Party) -> Self {
        self.issuer = party;
        self
    }

    pub fn counterparty(mut self, party: Party) -> Self {
        self.counterparty = party;
        self
    }

    pub fn operation(mut self, operation: OperationKind) -> Self {
        self.operation = operation;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn total(mut self, total: Decimal) -> Self {
        self.total = total;
        self
    }

    pub fn add_line(mut self, line: VatLine) -> Self {
        self.lines.push(line);
        self
    }

    pub fn rectifies(
        mut self,
        original_number: impl Into<String>,
        original_issue_date: NaiveDate,
        kind: RectificationKind,
    ) -> Self {
        self.rectification = Some(Rectification {
            original_number: original_number.into(),
            original_issue_date,
            kind,
        });
        self
    }

    pub fn intracommunity(mut self, flag: bool) -> Self {
        self.intracommunity = flag;
        self
    }

    pub fn build(self) -> IssuedInvoice {
        IssuedInvoice {
            identity: self.identity,
            issuer: self.issuer,
            counterparty: self.counterparty,
            operation: self.operation,
            description: self.description,
            total: self.total,
            lines: self.lines,
            rectification: self.rectification,
            intracommunity: self.intracommunity,
        }
    }
}

/// Builder for received invoice records.
pub struct ReceivedInvoiceBuilder {
    identity: InvoiceIdentity,
    supplier: Party,
    recipient: Party,
    operation: OperationKind,
    description: String,
    total: Decimal,
    lines: Vec<VatLine>,
    rectification: Option<Rectification>,
    intracommunity: bool,
    import: bool,
    deductible_rate: Option<Decimal>,
    accounting_date: Option<NaiveDate>,
}

impl ReceivedInvoiceBuilder {
    pub fn new(number: impl Into<String>, issue_date: NaiveDate, invoice_type: InvoiceType) -> Self {
        Self {
            identity: InvoiceIdentity {
                number: number.into(),
                issue_date,
                invoice_type,
            },
            supplier: Party::new("", ""),
            recipient: Party::new("", ""),
            operation: OperationKind::Goods,
            description: String::new(),
            total: Decimal::ZERO,
            lines: Vec::new(),
            rectification: None,
            intracommunity: false,
            import: false,
            deductible_rate: None,
            accounting_date: None,
        }
    }

    pub fn supplier(mut self, party: Party) -> Self {
        self.supplier = party;
        self
    }

    pub fn recipient(mut self, party: Party) -> Self {
        self.recipient = party;
        self
    }

    pub fn operation(mut self, operation: OperationKind) -> Self {
        self.operation = operation;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn total(mut self, total: Decimal) -> Self {
        self.total = total;
        self
    }

    pub fn add_line(mut self, line: VatLine) -> Self {
        self.lines.push(line);
        self
    }

    pub fn rectifies(
        mut self,
        original_number: impl Into<String>,
        original_issue_date: NaiveDate,
        kind: RectificationKind,
    ) -> Self {
        self.rectification = Some(Rectification {
            original_number: original_number.into(),
            original_issue_date,
            kind,
        });
        self
    }

    pub fn intracommunity(mut self, flag: bool) -> Self {
        self.intracommunity = flag;
        self
    }

    pub fn import(mut self, flag: bool) -> Self {
        self.import = flag;
        self
    }

    pub fn deductible_rate(mut self, rate: Decimal) -> Self {
        self.deductible_rate = Some(rate);
        self
    }

    pub fn accounting_date(mut self, date: NaiveDate) -> Self {
        self.accounting_date = Some(date);
        self
    }

    pub fn build(self) -> ReceivedInvoice {
        ReceivedInvoice {
            identity: self.identity,
            supplier: self.supplier,
            recipient: self.recipient,
            operation: self.operation,
            description: self.description,
            total: self.total,
            lines: self.lines,
            rectification: self.rectification,
            intracommunity: self.intracommunity,
            import: self.import,
            deductible_rate: self.deductible_rate,
            accounting_date: self.accounting_date,
        }
    }
}

/// Builder for a single VAT breakdown line.
pub struct VatLineBuilder {
    vat_key: String,
    base: Decimal,
    rate: Decimal,
    amount: Decimal,
    surcharge_rate: Option<Decimal>,
    surcharge_amount: Option<Decimal>,
}

impl VatLineBuilder {
    /// The VAT amount defaults to `base × rate / 100` rounded half-up to two
    /// decimals; override with [`amount`](Self::amount) when the source
    /// document says otherwise.
    pub fn new(vat_key: impl Into<String>, base: Decimal, rate: Decimal) -> Self {
        let amount = (base * rate / Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero);
        Self {
            vat_key: vat_key.into(),
            base,
            rate,
            amount,
            surcharge_rate: None,
            surcharge_amount: None,
        }
    }

    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = amount;
        self
    }

    pub fn surcharge(mut self, rate: Decimal, amount: Decimal) -> Self {
        self.surcharge_rate = Some(rate);
        self.surcharge_amount = Some(amount);
        self
    }

    pub fn build(self) -> VatLine {
        VatLine {
            vat_key: self.vat_key,
            base: self.base,
            rate: self.rate,
            amount: self.amount,
            surcharge_rate: self.surcharge_rate,
            surcharge_amount: self.surcharge_amount,
        }
    }
}
