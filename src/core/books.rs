use std::collections::BTreeMap;

use super::error::SiiError;
use super::types::*;

/// Book for an issued invoice: rectifications go to A2, everything else A1.
pub fn route_issued(invoice: &IssuedInvoice) -> BookCode {
    if invoice.rectification.is_some() {
        BookCode::A2
    } else {
        BookCode::A1
    }
}

/// Book for a received invoice. Correction takes priority over the
/// intra-community and import flags; import only applies when the record is
/// neither a correction nor intra-community.
pub fn route_received(invoice: &ReceivedInvoice) -> BookCode {
    if invoice.rectification.is_some() {
        BookCode::B2
    } else if invoice.intracommunity {
        BookCode::B3
    } else if invoice.import {
        BookCode::B4
    } else {
        BookCode::B1
    }
}

/// A batch's invoices grouped by book, preserving the original relative
/// order within each book. Derived per submission and never persisted.
#[derive(Debug)]
pub enum BookPartition<'a> {
    Issued(BTreeMap<BookCode, Vec<&'a IssuedInvoice>>),
    Received(BTreeMap<BookCode, Vec<&'a ReceivedInvoice>>),
}

impl<'a> BookPartition<'a> {
    /// Partition a batch. Validated invoices only — routing itself never
    /// fails.
    pub fn of(batch: &'a SubmissionBatch) -> Self {
        match &batch.invoices {
            BatchInvoices::Issued(invoices) => {
                let mut groups: BTreeMap<BookCode, Vec<&IssuedInvoice>> = BTreeMap::new();
                for invoice in invoices {
                    groups.entry(route_issued(invoice)).or_default().push(invoice);
                }
                Self::Issued(groups)
            }
            BatchInvoices::Received(invoices) => {
                let mut groups: BTreeMap<BookCode, Vec<&ReceivedInvoice>> = BTreeMap::new();
                for invoice in invoices {
                    groups
                        .entry(route_received(invoice))
                        .or_default()
                        .push(invoice);
                }
                Self::Received(groups)
            }
        }
    }

    /// Restrict to a single requested book. An empty selection is a business
    /// error — submitting nothing silently is never correct.
    pub fn only(self, book: BookCode) -> Result<Self, SiiError> {
        match self {
            Self::Issued(mut groups) => {
                let kept = groups.remove(&book).filter(|v| !v.is_empty());
                match kept {
                    Some(invoices) => Ok(Self::Issued(BTreeMap::from([(book, invoices)]))),
                    None => Err(SiiError::EmptyBook(book)),
                }
            }
            Self::Received(mut groups) => {
                let kept = groups.remove(&book).filter(|v| !v.is_empty());
                match kept {
                    Some(invoices) => Ok(Self::Received(BTreeMap::from([(book, invoices)]))),
                    None => Err(SiiError::EmptyBook(book)),
                }
            }
        }
    }

    /// Non-empty books, in deterministic order.
    pub fn books(&self) -> Vec<BookCode> {
        match self {
            Self::Issued(groups) => groups.keys().copied().collect(),
            Self::Received(groups) => groups.keys().copied().collect(),
        }
    }

    /// Number of invoices routed to `book`.
    pub fn count(&self, book: BookCode) -> usize {
        match self {
            Self::Issued(groups) => groups.get(&book).map_or(0, Vec::len),
            Self::Received(groups) => groups.get(&book).map_or(0, Vec::len),
        }
    }

    /// Total invoices across all books.
    pub fn total(&self) -> usize {
        match self {
            Self::Issued(groups) => groups.values().map(Vec::len).sum(),
            Self::Received(groups) => groups.values().map(Vec::len).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builder::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, 1).unwrap()
    }

    fn issued(number: &str) -> IssuedInvoiceBuilder {
        IssuedInvoiceBuilder::new(number, date(), InvoiceType::F1)
            .issuer(Party::new("B76365789", "ACME Ibérica SL"))
            .counterparty(Party::new("87654321K", "Cliente"))
            .add_line(VatLineBuilder::new("01", dec!(100), dec!(21)).build())
            .total(dec!(121.00))
    }

    fn received(number: &str) -> ReceivedInvoiceBuilder {
        ReceivedInvoiceBuilder::new(number, date(), InvoiceType::F1)
            .supplier(Party::new("A58818501", "Proveedor SA"))
            .recipient(Party::new("B76365789", "ACME Ibérica SL"))
            .add_line(VatLineBuilder::new("01", dec!(50), dec!(10.5)).build())
            .total(dec!(60.50))
    }

    #[test]
    fn issued_routing() {
        assert_eq!(route_issued(&issued("A").build()), BookCode::A1);

        let rectified = issued("B")
            .rectifies("A", date(), RectificationKind::Substitution)
            .build();
        assert_eq!(route_issued(&rectified), BookCode::A2);
    }

    #[test]
    fn rectification_beats_intracommunity_on_issued() {
        let inv = issued("C")
            .intracommunity(true)
            .rectifies("A", date(), RectificationKind::Differences)
            .build();
        assert_eq!(route_issued(&inv), BookCode::A2);
    }

    #[test]
    fn received_routing() {
        assert_eq!(route_received(&received("A").build()), BookCode::B1);
        assert_eq!(
            route_received(&received("B").intracommunity(true).build()),
            BookCode::B3
        );
        assert_eq!(
            route_received(&received("C").import(true).build()),
            BookCode::B4
        );
        let corrected = received("D")
            .rectifies("A", date(), RectificationKind::Substitution)
            .build();
        assert_eq!(route_received(&corrected), BookCode::B2);
    }

    #[test]
    fn rectification_beats_flags_on_received() {
        let inv = received("E")
            .intracommunity(true)
            .import(true)
            .rectifies("A", date(), RectificationKind::Substitution)
            .build();
        assert_eq!(route_received(&inv), BookCode::B2);
    }

    #[test]
    fn intracommunity_beats_import() {
        let inv = received("F").intracommunity(true).import(true).build();
        assert_eq!(route_received(&inv), BookCode::B3);
    }

    #[test]
    fn partition_preserves_relative_order() {
        let batch = SubmissionBatch::issued(
            Party::new("B76365789", "ACME"),
            2026,
            PeriodCode::Month(7),
            vec![
                issued("FA-1").build(),
                issued("FA-R-1")
                    .rectifies("FA-0", date(), RectificationKind::Substitution)
                    .build(),
                issued("FA-2").build(),
                issued("FA-3").build(),
            ],
        );
        let partition = BookPartition::of(&batch);
        assert_eq!(partition.books(), vec![BookCode::A1, BookCode::A2]);
        assert_eq!(partition.count(BookCode::A1), 3);
        assert_eq!(partition.count(BookCode::A2), 1);

        match &partition {
            BookPartition::Issued(groups) => {
                let numbers: Vec<&str> = groups[&BookCode::A1]
                    .iter()
                    .map(|i| i.identity.number.as_str())
                    .collect();
                assert_eq!(numbers, vec!["FA-1", "FA-2", "FA-3"]);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn only_rejects_empty_selection() {
        let batch = SubmissionBatch::issued(
            Party::new("B76365789", "ACME"),
            2026,
            PeriodCode::Month(7),
            vec![issued("FA-1").build()],
        );
        let err = BookPartition::of(&batch).only(BookCode::A2).unwrap_err();
        assert!(matches!(err, SiiError::EmptyBook(BookCode::A2)));

        let kept = BookPartition::of(&batch).only(BookCode::A1).unwrap();
        assert_eq!(kept.total(), 1);
    }
}
