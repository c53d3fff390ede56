#![cfg(feature = "wire")]

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use sii::core::*;
use sii::wire;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn holder() -> Party {
    Party::new("B76365789", "ACME Ibérica SL")
}

// --- Payload generation ---

#[test]
fn issued_envelope_structure() {
    let invoice = IssuedInvoiceBuilder::new("FA-2026-001", date(2026, 7, 1), InvoiceType::F1)
        .issuer(holder())
        .counterparty(Party::new("87654321K", "Cliente Ejemplo"))
        .operation(OperationKind::Services)
        .description("Servicios de consultoría")
        .add_line(
            VatLineBuilder::new("01", dec!(100.00), dec!(21.00))
                .surcharge(dec!(5.2), dec!(5.20))
                .build(),
        )
        .total(dec!(121.00))
        .build();

    let xml = wire::build_issued_payload(
        &holder(),
        2026,
        PeriodCode::Month(7),
        BookCode::A1,
        &[&invoice],
    )
    .unwrap();

    // Envelope and header.
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains("<soapenv:Envelope"));
    assert!(xml.contains("<sii:IDVersionSii>1.1</sii:IDVersionSii>"));
    assert!(xml.contains("<sii:NombreRazon>ACME Ibérica SL</sii:NombreRazon>"));
    assert!(xml.contains("<sii:NIF>B76365789</sii:NIF>"));
    assert!(xml.contains("<sii:Ejercicio>2026</sii:Ejercicio>"));
    assert!(xml.contains("<sii:Periodo>07</sii:Periodo>"));

    // Record body.
    assert!(xml.contains("<sii:TipoFactura>F1</sii:TipoFactura>"));
    assert!(xml.contains("<sii:TipoOperacion>S</sii:TipoOperacion>"));
    assert!(xml.contains("<sii:ImporteTotal>121.00</sii:ImporteTotal>"));
    assert!(xml.contains("<sii:TipoRecargoEquivalencia>5.20</sii:TipoRecargoEquivalencia>"));

    // Dates are day-first.
    assert!(xml.contains("<sii:FechaExpedicionFacturaEmisor>01-07-2026</sii:FechaExpedicionFacturaEmisor>"));
}

#[test]
fn annual_period_code_on_the_wire() {
    let invoice = IssuedInvoiceBuilder::new("FA-1", date(2026, 1, 10), InvoiceType::F1)
        .issuer(holder())
        .counterparty(Party::new("87654321K", "Cliente"))
        .description("Resumen anual")
        .add_line(VatLineBuilder::new("01", dec!(10.00), dec!(21.00)).build())
        .total(dec!(12.10))
        .build();
    let xml = wire::build_issued_payload(
        &holder(),
        2025,
        PeriodCode::Annual,
        BookCode::A1,
        &[&invoice],
    )
    .unwrap();
    assert!(xml.contains("<sii:Periodo>0A</sii:Periodo>"));
}

#[test]
fn received_import_book_payload() {
    let invoice = ReceivedInvoiceBuilder::new("DUA-55", date(2026, 7, 1), InvoiceType::F5)
        .supplier(Party::new("A58818501", "Importadora SA"))
        .recipient(holder())
        .operation(OperationKind::Goods)
        .description("Importación maquinaria")
        .import(true)
        .deductible_rate(dec!(100))
        .accounting_date(date(2026, 7, 2))
        .add_line(VatLineBuilder::new("02", dec!(10000.00), dec!(21.00)).build())
        .total(dec!(12100.00))
        .build();

    let xml = wire::build_received_payload(
        &holder(),
        2026,
        PeriodCode::Month(7),
        BookCode::B4,
        &[&invoice],
    )
    .unwrap();

    assert!(xml.contains("<siiLR:SuministroLRImportaciones>"));
    assert!(xml.contains("<sii:OperacionImportacion>S</sii:OperacionImportacion>"));
    assert!(xml.contains("<sii:FechaRegContable>02-07-2026</sii:FechaRegContable>"));
    assert!(xml.contains("<sii:PorcentajeDeduccion>100.00</sii:PorcentajeDeduccion>"));
    assert!(xml.contains("<sii:CuotaSoportada>2100.00</sii:CuotaSoportada>"));
}

#[test]
fn envelope_tags_differ_per_book() {
    let tags: Vec<&str> = [
        BookCode::A1,
        BookCode::A2,
        BookCode::A3,
        BookCode::B1,
        BookCode::B2,
        BookCode::B3,
        BookCode::B4,
    ]
    .iter()
    .map(|b| wire::envelope_tag(*b))
    .collect();
    let mut deduped = tags.clone();
    deduped.sort_unstable();
    deduped.dedup();
    assert_eq!(deduped.len(), tags.len(), "envelope tags must be distinct");
}

// --- Error-code catalog ---

#[test]
fn catalog_mapping_matches_contract() {
    use sii::wire::ErrorCategory::*;
    assert_eq!(wire::categorize("1001"), Authentication);
    assert_eq!(wire::categorize("2001"), BadRequest);
    assert_eq!(wire::categorize("2005"), Conflict);
    assert_eq!(wire::categorize("3001"), BadRequest);
    assert_eq!(wire::categorize("5001"), ServiceUnavailable);
}

#[test]
fn catalog_is_complete() {
    for code in 1..=5 {
        assert!(wire::describe(&format!("100{code}")).is_some());
    }
    for code in 1..=12 {
        assert!(wire::describe(&format!("20{code:02}")).is_some());
    }
    for code in 1..=6 {
        assert!(wire::describe(&format!("300{code}")).is_some());
    }
    for code in 1..=5 {
        assert!(wire::describe(&format!("500{code}")).is_some());
    }
    assert!(wire::describe("4001").is_none());
}

#[test]
fn window_violation_code_maps_to_bad_request() {
    match wire::error_for("3001", None) {
        SiiError::BadRequest { code, message } => {
            assert_eq!(code, "3001");
            assert!(message.contains("submission window"));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

// --- Fault round trip through the mapper ---

#[test]
fn fault_body_classifies_end_to_end() {
    let body = r#"<?xml version="1.0"?>
<env:Envelope xmlns:env="http://schemas.xmlsoap.org/soap/envelope/">
  <env:Body>
    <env:Fault>
      <faultcode>env:Client</faultcode>
      <faultstring>Registro duplicado</faultstring>
      <detail><Codigo>2005</Codigo><Descripcion>Factura ya registrada</Descripcion></detail>
    </env:Fault>
  </env:Body>
</env:Envelope>"#;

    let fault = wire::parse_fault(body).unwrap();
    assert!(!wire::fault_is_retryable(&fault));
    match wire::error_for_fault(&fault) {
        SiiError::Conflict { code, message } => {
            assert_eq!(code, "2005");
            assert_eq!(message, "Factura ya registrada");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn busy_fault_is_retryable() {
    let body = "<Fault><faultcode>env:Server</faultcode>\
                <faultstring>Sistema ocupado, error 5002</faultstring></Fault>";
    let fault = wire::parse_fault(body).unwrap();
    assert!(wire::fault_is_retryable(&fault));
    assert!(matches!(
        wire::error_for_fault(&fault),
        SiiError::ServiceUnavailable { .. }
    ));
}
