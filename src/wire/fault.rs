use quick_xml::Reader;
use quick_xml::events::Event;

/// A structured fault block extracted from a failure response.
///
/// Only the wire layer constructs faults — callers consume them through the
/// error mapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    /// SOAP-style fault code (e.g. `env:Server`).
    pub code: String,
    /// Human-readable fault string.
    pub message: String,
    /// Nested application error code, when the detail block carries one.
    pub detail_code: Option<String>,
    /// Nested application error description.
    pub detail_message: Option<String>,
}

/// Extract a fault from a failure response body.
///
/// Tries a structured parse of the known fault-block shape first; when the
/// body is not well-formed XML, falls back to tag-scanning heuristics so a
/// mangled error page still classifies. Returns `None` when no fault
/// material is found either way.
pub fn parse_fault(body: &str) -> Option<Fault> {
    if let Some(fault) = parse_structured(body) {
        return Some(fault);
    }
    parse_heuristic(body)
}

fn parse_structured(body: &str) -> Option<Fault> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut in_fault = false;
    let mut current: Option<String> = None;
    let mut code = None;
    let mut message = None;
    let mut detail_code = None;
    let mut detail_message = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = local_name(e.name().as_ref());
                if name.eq_ignore_ascii_case("fault") {
                    in_fault = true;
                }
                if in_fault {
                    current = Some(name);
                }
            }
            Ok(Event::Text(ref e)) => {
                if !in_fault {
                    continue;
                }
                let text = e.unescape().unwrap_or_default().trim().to_string();
                if text.is_empty() {
                    continue;
                }
                match current.as_deref() {
                    Some("faultcode") => code = Some(text),
                    Some("faultstring") => message = Some(text),
                    Some("Codigo") | Some("CodigoError") => detail_code = Some(text),
                    Some("Descripcion") | Some("DescripcionError") => {
                        detail_message = Some(text);
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => {
                if local_name(e.name().as_ref()).eq_ignore_ascii_case("fault") {
                    in_fault = false;
                }
                current = None;
            }
            Ok(Event::Eof) => break,
            Err(_) => return None,
            _ => {}
        }
    }

    if code.is_none() && message.is_none() {
        return None;
    }
    Some(Fault {
        code: code.unwrap_or_default(),
        message: message.unwrap_or_default(),
        detail_code,
        detail_message,
    })
}

fn parse_heuristic(body: &str) -> Option<Fault> {
    let code = scan_tag_text(body, "faultcode");
    let message = scan_tag_text(body, "faultstring");
    if code.is_none() && message.is_none() {
        return None;
    }
    Some(Fault {
        code: code.unwrap_or_default(),
        message: message.unwrap_or_default(),
        detail_code: scan_tag_text(body, "Codigo").or_else(|| scan_tag_text(body, "CodigoError")),
        detail_message: scan_tag_text(body, "Descripcion")
            .or_else(|| scan_tag_text(body, "DescripcionError")),
    })
}

/// Find `<...local>text</...local>` by local tag name, tolerating namespace
/// prefixes and surrounding garbage.
fn scan_tag_text(body: &str, local: &str) -> Option<String> {
    let open_plain = format!("<{local}>");
    let open_prefixed = format!(":{local}>");
    let start = body
        .find(&open_plain)
        .map(|i| i + open_plain.len())
        .or_else(|| {
            body.find(&open_prefixed)
                .map(|i| i + open_prefixed.len())
        })?;
    let rest = &body[start..];
    let end = rest.find('<')?;
    let text = rest[..end].trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn local_name(qname: &[u8]) -> String {
    let name = String::from_utf8_lossy(qname);
    match name.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => name.to_string(),
    }
}
