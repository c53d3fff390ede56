use chrono::NaiveDate;
use rust_decimal_macros::dec;
use sii::core::*;
use sii::wire;

fn main() {
    let holder = Party::new("B76365789", "ACME Ibérica SL");

    let invoice = IssuedInvoiceBuilder::new(
        "FA-2026-0042",
        NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
        InvoiceType::F1,
    )
    .issuer(holder.clone())
    .counterparty(Party::new("87654321K", "Cliente Ejemplo"))
    .operation(OperationKind::Services)
    .description("Desarrollo & mantenimiento <2026>")
    .add_line(
        VatLineBuilder::new("01", dec!(1200.00), dec!(21.00))
            .surcharge(dec!(5.2), dec!(62.40))
            .build(),
    )
    .total(dec!(1452.00))
    .build();

    let xml = wire::build_issued_payload(
        &holder,
        2026,
        PeriodCode::Month(7),
        BookCode::A1,
        &[&invoice],
    )
    .expect("payload generation should succeed");

    println!("{xml}");
}
