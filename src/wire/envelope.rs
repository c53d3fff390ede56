use crate::core::*;

use super::xml::{PayloadWriter, XmlResult};
use super::{SII_VERSION, ns};

/// Book-specific envelope tag wrapping the record list.
pub fn envelope_tag(book: BookCode) -> &'static str {
    match book {
        BookCode::A1 => "siiLR:SuministroLRFacturasEmitidas",
        BookCode::A2 => "siiLR:SuministroLRFacturasEmitidasRectificadas",
        BookCode::A3 => "siiLR:SuministroLRCobrosEmitidas",
        BookCode::B1 => "siiLR:SuministroLRFacturasRecibidas",
        BookCode::B2 => "siiLR:SuministroLRFacturasRecibidasRectificadas",
        BookCode::B3 => "siiLR:SuministroLROperacionesIntracomunitarias",
        BookCode::B4 => "siiLR:SuministroLRImportaciones",
    }
}

/// Build the submission payload for one book of issued invoices.
///
/// Invoices serialize in input order and every VAT line appears exactly
/// once, in its original order — the output is stable for golden tests.
/// Rate-specific aggregation is the authority's job, never done here.
pub fn build_issued_payload(
    holder: &Party,
    fiscal_year: i32,
    period: PeriodCode,
    book: BookCode,
    invoices: &[&IssuedInvoice],
) -> XmlResult {
    let mut w = open_envelope(holder, fiscal_year, period, book)?;

    for invoice in invoices {
        w.start_element("siiLR:RegistroLRFacturasEmitidas")?;

        write_invoice_id(&mut w, &invoice.issuer, &invoice.identity)?;

        w.start_element("siiLR:FacturaExpedida")?;
        w.text_element("sii:TipoFactura", invoice.identity.invoice_type.code())?;
        w.text_element("sii:TipoOperacion", invoice.operation.code())?;
        w.text_element("sii:DescripcionOperacion", &invoice.description)?;
        w.amount_element("sii:ImporteTotal", invoice.total)?;
        if invoice.intracommunity {
            w.text_element("sii:OperacionIntracomunitaria", "S")?;
        }
        if let Some(rect) = &invoice.rectification {
            write_rectification(&mut w, rect)?;
        }
        write_counterparty(&mut w, &invoice.counterparty)?;

        w.start_element("sii:DesgloseFactura")?;
        for line in &invoice.lines {
            w.start_element("sii:DetalleIVA")?;
            w.text_element("sii:ClaveRegimen", &line.vat_key)?;
            w.amount_element("sii:TipoImpositivo", line.rate)?;
            w.amount_element("sii:BaseImponible", line.base)?;
            w.amount_element("sii:CuotaRepercutida", line.amount)?;
            if let (Some(rate), Some(amount)) = (line.surcharge_rate, line.surcharge_amount) {
                w.amount_element("sii:TipoRecargoEquivalencia", rate)?;
                w.amount_element("sii:CuotaRecargoEquivalencia", amount)?;
            }
            w.end_element("sii:DetalleIVA")?;
        }
        w.end_element("sii:DesgloseFactura")?;

        w.end_element("siiLR:FacturaExpedida")?;
        w.end_element("siiLR:RegistroLRFacturasEmitidas")?;
    }

    close_envelope(w, book)
}

/// Build the submission payload for one book of received invoices.
pub fn build_received_payload(
    holder: &Party,
    fiscal_year: i32,
    period: PeriodCode,
    book: BookCode,
    invoices: &[&ReceivedInvoice],
) -> XmlResult {
    let mut w = open_envelope(holder, fiscal_year, period, book)?;

    for invoice in invoices {
        w.start_element("siiLR:RegistroLRFacturasRecibidas")?;

        write_invoice_id(&mut w, &invoice.supplier, &invoice.identity)?;

        w.start_element("siiLR:FacturaRecibida")?;
        w.text_element("sii:TipoFactura", invoice.identity.invoice_type.code())?;
        w.text_element("sii:TipoOperacion", invoice.operation.code())?;
        w.text_element("sii:DescripcionOperacion", &invoice.description)?;
        w.amount_element("sii:ImporteTotal", invoice.total)?;
        if invoice.intracommunity {
            w.text_element("sii:OperacionIntracomunitaria", "S")?;
        }
        if invoice.import {
            w.text_element("sii:OperacionImportacion", "S")?;
        }
        if let Some(rect) = &invoice.rectification {
            write_rectification(&mut w, rect)?;
        }
        if let Some(date) = invoice.accounting_date {
            w.date_element("sii:FechaRegContable", date)?;
        }
        if let Some(rate) = invoice.deductible_rate {
            w.amount_element("sii:PorcentajeDeduccion", rate)?;
        }
        write_counterparty(&mut w, &invoice.supplier)?;

        w.start_element("sii:DesgloseFactura")?;
        for line in &invoice.lines {
            w.start_element("sii:DetalleIVA")?;
            w.text_element("sii:ClaveRegimen", &line.vat_key)?;
            w.amount_element("sii:TipoImpositivo", line.rate)?;
            w.amount_element("sii:BaseImponible", line.base)?;
            w.amount_element("sii:CuotaSoportada", line.amount)?;
            if let (Some(rate), Some(amount)) = (line.surcharge_rate, line.surcharge_amount) {
                w.amount_element("sii:TipoRecargoEquivalencia", rate)?;
                w.amount_element("sii:CuotaRecargoEquivalencia", amount)?;
            }
            w.end_element("sii:DetalleIVA")?;
        }
        w.end_element("sii:DesgloseFactura")?;

        w.end_element("siiLR:FacturaRecibida")?;
        w.end_element("siiLR:RegistroLRFacturasRecibidas")?;
    }

    close_envelope(w, book)
}

fn open_envelope(
    holder: &Party,
    fiscal_year: i32,
    period: PeriodCode,
    book: BookCode,
) -> Result<PayloadWriter, SiiError> {
    let mut w = PayloadWriter::new()?;
    w.start_element_with_attrs(
        "soapenv:Envelope",
        &[
            ("xmlns:soapenv", ns::SOAP_ENV),
            ("xmlns:sii", ns::SII),
            ("xmlns:siiLR", ns::SII_LR),
        ],
    )?;
    w.empty_element("soapenv:Header")?;
    w.start_element("soapenv:Body")?;
    w.start_element(envelope_tag(book))?;

    w.start_element("sii:Cabecera")?;
    w.text_element("sii:IDVersionSii", SII_VERSION)?;
    w.start_element("sii:Titular")?;
    w.text_element("sii:NombreRazon", &holder.name)?;
    w.text_element("sii:NIF", &holder.tax_id)?;
    w.end_element("sii:Titular")?;
    w.text_element("sii:Ejercicio", &fiscal_year.to_string())?;
    w.text_element("sii:Periodo", &period.code())?;
    w.end_element("sii:Cabecera")?;

    Ok(w)
}

fn close_envelope(mut w: PayloadWriter, book: BookCode) -> XmlResult {
    w.end_element(envelope_tag(book))?;
    w.end_element("soapenv:Body")?;
    w.end_element("soapenv:Envelope")?;
    w.into_string()
}

fn write_invoice_id(
    w: &mut PayloadWriter,
    issuer: &Party,
    identity: &InvoiceIdentity,
) -> Result<(), SiiError> {
    w.start_element("siiLR:IDFactura")?;
    w.start_element("sii:IDEmisorFactura")?;
    w.text_element("sii:NIF", &issuer.tax_id)?;
    w.end_element("sii:IDEmisorFactura")?;
    w.text_element("sii:NumSerieFacturaEmisor", &identity.number)?;
    w.date_element("sii:FechaExpedicionFacturaEmisor", identity.issue_date)?;
    w.end_element("siiLR:IDFactura")?;
    Ok(())
}

fn write_rectification(w: &mut PayloadWriter, rect: &Rectification) -> Result<(), SiiError> {
    w.text_element("sii:TipoRectificativa", rect.kind.code())?;
    w.start_element("sii:FacturasRectificadas")?;
    w.start_element("sii:IDFacturaRectificada")?;
    w.text_element("sii:NumSerieFacturaEmisor", &rect.original_number)?;
    w.date_element("sii:FechaExpedicionFacturaEmisor", rect.original_issue_date)?;
    w.end_element("sii:IDFacturaRectificada")?;
    w.end_element("sii:FacturasRectificadas")?;
    Ok(())
}

fn write_counterparty(w: &mut PayloadWriter, party: &Party) -> Result<(), SiiError> {
    w.start_element("sii:Contraparte")?;
    w.text_element("sii:NombreRazon", &party.name)?;
    w.text_element("sii:NIF", &party.tax_id)?;
    if let Some(country) = &party.country {
        w.text_element("sii:CodigoPais", country)?;
    }
    w.end_element("sii:Contraparte")?;
    Ok(())
}
