use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use sii::core::*;

fn main() {
    let today = Utc::now().date_naive();

    // A standard issued invoice, two days old — well inside the 4-day window
    let invoice = IssuedInvoiceBuilder::new("FA-2026-0042", today - Duration::days(2), InvoiceType::F1)
        .issuer(Party::new("B76365789", "ACME Ibérica SL"))
        .counterparty(Party::new("87654321K", "Cliente Ejemplo"))
        .description("Desarrollo de software")
        .add_line(
            VatLineBuilder::new("01", dec!(1200.00), dec!(21.00)).build(),
        )
        .add_line(
            VatLineBuilder::new("01", dec!(300.00), dec!(10.00)).build(),
        )
        .total(dec!(1782.00))
        .build();

    let errors = validate_issued(&invoice, today, &ValidationConfig::default());
    if errors.is_empty() {
        println!("invoice {} is valid", invoice.identity.number);
    } else {
        for error in &errors {
            println!("  {error}");
        }
        return;
    }

    println!("routes to book {}", route_issued(&invoice));

    // A stale invoice trips the submission-window rule before any network use
    let stale = IssuedInvoiceBuilder::new("FA-2026-0007", today - Duration::days(9), InvoiceType::F1)
        .issuer(Party::new("B76365789", "ACME Ibérica SL"))
        .counterparty(Party::new("87654321K", "Cliente Ejemplo"))
        .description("Entrega antigua")
        .add_line(VatLineBuilder::new("01", dec!(50.00), dec!(21.00)).build())
        .total(dec!(60.50))
        .build();

    for error in validate_issued(&stale, today, &ValidationConfig::default()) {
        println!("stale invoice: {error}");
    }
}
