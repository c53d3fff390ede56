use quick_xml::Reader;
use quick_xml::events::Event;

use crate::core::SiiError;

/// Overall delivery status reported by the authority for one payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// `Correcto` — every record accepted.
    Accepted,
    /// `ParcialmenteCorrecto` — some records accepted, some rejected.
    PartiallyAccepted,
    /// `Incorrecto` — the whole payload rejected.
    Rejected,
}

impl DeliveryStatus {
    fn from_wire(text: &str) -> Option<Self> {
        match text {
            "Correcto" => Some(Self::Accepted),
            "ParcialmenteCorrecto" => Some(Self::PartiallyAccepted),
            "Incorrecto" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Per-record outcome within a delivery response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    pub invoice_number: String,
    pub accepted: bool,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

/// Parsed success-path response for one submitted payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResponse {
    pub status: DeliveryStatus,
    /// Authority-assigned submission identifier, when present.
    pub submission_id: Option<String>,
    /// Verification stamp (CSV), when issued.
    pub verification: Option<String>,
    pub records: Vec<RecordOutcome>,
}

#[derive(Default)]
struct PendingRecord {
    invoice_number: Option<String>,
    accepted: bool,
    error_code: Option<String>,
    error_message: Option<String>,
}

/// Parse a delivery response body. Faults are not handled here — run
/// [`parse_fault`](super::parse_fault) on failure bodies instead.
pub fn parse_response(body: &str) -> Result<SubmissionResponse, SiiError> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut status = None;
    let mut submission_id = None;
    let mut verification = None;
    let mut records = Vec::new();

    let mut current: Option<String> = None;
    let mut pending: Option<PendingRecord> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = local_name(e.name().as_ref());
                if name == "RespuestaLinea" {
                    pending = Some(PendingRecord::default());
                }
                current = Some(name);
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default().trim().to_string();
                if text.is_empty() {
                    continue;
                }
                match (current.as_deref(), pending.as_mut()) {
                    (Some("NumSerieFacturaEmisor"), Some(record)) => {
                        record.invoice_number = Some(text);
                    }
                    (Some("EstadoRegistro"), Some(record)) => {
                        record.accepted = text == "Correcto";
                    }
                    (Some("CodigoErrorRegistro"), Some(record)) => {
                        record.error_code = Some(text);
                    }
                    (Some("DescripcionErrorRegistro"), Some(record)) => {
                        record.error_message = Some(text);
                    }
                    (Some("EstadoEnvio"), None) => {
                        status = DeliveryStatus::from_wire(&text);
                        if status.is_none() {
                            return Err(SiiError::Xml(format!(
                                "unrecognised EstadoEnvio '{text}'"
                            )));
                        }
                    }
                    (Some("IDEnvio"), None) => submission_id = Some(text),
                    (Some("CSV"), None) => verification = Some(text),
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => {
                if local_name(e.name().as_ref()) == "RespuestaLinea" {
                    if let Some(record) = pending.take() {
                        records.push(RecordOutcome {
                            invoice_number: record.invoice_number.unwrap_or_default(),
                            accepted: record.accepted,
                            error_code: record.error_code,
                            error_message: record.error_message,
                        });
                    }
                }
                current = None;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(SiiError::Xml(format!("response parse error: {e}"))),
            _ => {}
        }
    }

    let status = status.ok_or_else(|| {
        SiiError::Xml("response carries no EstadoEnvio delivery status".to_string())
    })?;

    Ok(SubmissionResponse {
        status,
        submission_id,
        verification,
        records,
    })
}

fn local_name(qname: &[u8]) -> String {
    let name = String::from_utf8_lossy(qname);
    match name.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCEPTED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
  <soapenv:Body>
    <siiLR:RespuestaLRFacturasEmitidas xmlns:siiLR="urn:siiLR" xmlns:sii="urn:sii">
      <sii:IDEnvio>ENV-20260703-0001</sii:IDEnvio>
      <sii:CSV>A3B9-QX2M-77KD</sii:CSV>
      <siiLR:EstadoEnvio>Correcto</siiLR:EstadoEnvio>
      <siiLR:RespuestaLinea>
        <siiLR:IDFactura>
          <sii:NumSerieFacturaEmisor>FA-2026-001</sii:NumSerieFacturaEmisor>
        </siiLR:IDFactura>
        <siiLR:EstadoRegistro>Correcto</siiLR:EstadoRegistro>
      </siiLR:RespuestaLinea>
    </siiLR:RespuestaLRFacturasEmitidas>
  </soapenv:Body>
</soapenv:Envelope>"#;

    const PARTIAL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<e:Envelope xmlns:e="http://schemas.xmlsoap.org/soap/envelope/">
  <e:Body>
    <r:RespuestaLRFacturasEmitidas xmlns:r="urn:siiLR" xmlns:sii="urn:sii">
      <r:EstadoEnvio>ParcialmenteCorrecto</r:EstadoEnvio>
      <r:RespuestaLinea>
        <sii:NumSerieFacturaEmisor>FA-1</sii:NumSerieFacturaEmisor>
        <r:EstadoRegistro>Correcto</r:EstadoRegistro>
      </r:RespuestaLinea>
      <r:RespuestaLinea>
        <sii:NumSerieFacturaEmisor>FA-2</sii:NumSerieFacturaEmisor>
        <r:EstadoRegistro>Incorrecto</r:EstadoRegistro>
        <r:CodigoErrorRegistro>2005</r:CodigoErrorRegistro>
        <r:DescripcionErrorRegistro>Factura duplicada</r:DescripcionErrorRegistro>
      </r:RespuestaLinea>
    </r:RespuestaLRFacturasEmitidas>
  </e:Body>
</e:Envelope>"#;

    #[test]
    fn accepted_response_parses() {
        let resp = parse_response(ACCEPTED).unwrap();
        assert_eq!(resp.status, DeliveryStatus::Accepted);
        assert_eq!(resp.submission_id.as_deref(), Some("ENV-20260703-0001"));
        assert_eq!(resp.verification.as_deref(), Some("A3B9-QX2M-77KD"));
        assert_eq!(resp.records.len(), 1);
        assert!(resp.records[0].accepted);
        assert_eq!(resp.records[0].invoice_number, "FA-2026-001");
    }

    #[test]
    fn partial_response_flags_rejected_record() {
        let resp = parse_response(PARTIAL).unwrap();
        assert_eq!(resp.status, DeliveryStatus::PartiallyAccepted);
        assert_eq!(resp.records.len(), 2);
        assert!(resp.records[0].accepted);
        let rejected = &resp.records[1];
        assert!(!rejected.accepted);
        assert_eq!(rejected.invoice_number, "FA-2");
        assert_eq!(rejected.error_code.as_deref(), Some("2005"));
        assert_eq!(rejected.error_message.as_deref(), Some("Factura duplicada"));
    }

    #[test]
    fn missing_status_is_an_error() {
        let err = parse_response("<Respuesta></Respuesta>").unwrap_err();
        assert!(matches!(err, SiiError::Xml(_)));
    }

    #[test]
    fn unknown_status_is_an_error() {
        let body = "<R><EstadoEnvio>Quizas</EstadoEnvio></R>";
        assert!(parse_response(body).is_err());
    }
}
