use crate::core::SiiError;

use super::fault::Fault;

/// The authority code for an already-registered invoice.
pub const DUPLICATE_INVOICE_CODE: &str = "2005";

/// Domain category of a remote error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// `1xxx` — certificate, signature, or authorisation problems.
    Authentication,
    /// `2xxx`/`3xxx` — request content or business-rule violations.
    BadRequest,
    /// The duplicate-invoice code.
    Conflict,
    /// `5xxx` and anything unknown — system-side trouble; fail safe
    /// toward "try again".
    ServiceUnavailable,
}

/// Classify a 4-digit remote error code by its leading digit.
pub fn categorize(code: &str) -> ErrorCategory {
    if code == DUPLICATE_INVOICE_CODE {
        return ErrorCategory::Conflict;
    }
    match code.as_bytes().first() {
        Some(b'1') => ErrorCategory::Authentication,
        Some(b'2') | Some(b'3') => ErrorCategory::BadRequest,
        _ => ErrorCategory::ServiceUnavailable,
    }
}

/// True only for the transient system codes: unavailability, timeout,
/// rate limit, maintenance. `5001` (internal error) is not retryable.
pub fn is_retryable(code: &str) -> bool {
    matches!(code, "5002" | "5003" | "5004" | "5005")
}

/// Catalog description for a known code.
pub fn describe(code: &str) -> Option<&'static str> {
    let text = match code {
        "1001" => "client certificate expired",
        "1002" => "client certificate revoked",
        "1003" => "client certificate not recognised",
        "1004" => "payload signature verification failed",
        "1005" => "holder not authorised for this book",
        "2001" => "malformed payload",
        "2002" => "missing holder identifier",
        "2003" => "invalid tax identifier",
        "2004" => "invalid date format",
        "2005" => "duplicate invoice already registered",
        "2006" => "unknown book code",
        "2007" => "invoice number exceeds maximum length",
        "2008" => "invalid VAT rate",
        "2009" => "invoice total does not match line breakdown",
        "2010" => "invalid settlement period",
        "2011" => "missing VAT breakdown lines",
        "2012" => "invalid invoice type code",
        "3001" => "record outside the legal submission window",
        "3002" => "rectification references no registered original",
        "3003" => "settlement period already closed",
        "3004" => "original invoice already rectified",
        "3005" => "holder does not match record issuer",
        "3006" => "negative amount not allowed for this book",
        "5001" => "internal system error",
        "5002" => "service temporarily unavailable",
        "5003" => "request timed out at the authority",
        "5004" => "rate limit exceeded",
        "5005" => "scheduled maintenance in progress",
        _ => return None,
    };
    Some(text)
}

/// Map a remote error code (and optional message) to the domain error.
pub fn error_for(code: &str, message: Option<&str>) -> SiiError {
    let message = message
        .map(str::to_string)
        .or_else(|| describe(code).map(str::to_string))
        .unwrap_or_else(|| "unrecognised error code".to_string());
    let code = code.to_string();
    match categorize(&code) {
        ErrorCategory::Authentication => SiiError::Authentication { code, message },
        ErrorCategory::BadRequest => SiiError::BadRequest { code, message },
        ErrorCategory::Conflict => SiiError::Conflict { code, message },
        ErrorCategory::ServiceUnavailable => SiiError::ServiceUnavailable { code, message },
    }
}

/// Map a parsed fault to the domain error.
///
/// Preference order: the nested application code, then a 4-digit code
/// embedded in the fault text, then coarse SOAP fault-code prefix matching.
pub fn error_for_fault(fault: &Fault) -> SiiError {
    if let Some(code) = &fault.detail_code {
        let message = fault
            .detail_message
            .as_deref()
            .or(Some(fault.message.as_str()));
        return error_for(code, message.filter(|m| !m.is_empty()));
    }

    if let Some(code) = embedded_code(&fault.message).or_else(|| embedded_code(&fault.code)) {
        let message = Some(fault.message.as_str()).filter(|m| !m.is_empty());
        return error_for(&code, message);
    }

    let message = if fault.message.is_empty() {
        fault.code.clone()
    } else {
        fault.message.clone()
    };
    if fault.code.contains("Client") {
        SiiError::BadRequest {
            code: fault.code.clone(),
            message,
        }
    } else {
        // "Server" and anything unclassifiable fail safe toward retry.
        SiiError::ServiceUnavailable {
            code: fault.code.clone(),
            message,
        }
    }
}

/// Whether a parsed fault indicates a transient condition worth retrying.
pub fn fault_is_retryable(fault: &Fault) -> bool {
    if let Some(code) = &fault.detail_code {
        return is_retryable(code);
    }
    if let Some(code) = embedded_code(&fault.message).or_else(|| embedded_code(&fault.code)) {
        return is_retryable(&code);
    }
    false
}

/// Find an isolated 4-digit error code in free text.
fn embedded_code(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            let run = &text[start..i];
            if run.len() == 4 && matches!(run.as_bytes()[0], b'1' | b'2' | b'3' | b'5') {
                return Some(run.to_string());
            }
        } else {
            i += 1;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_digit_categories() {
        assert_eq!(categorize("1001"), ErrorCategory::Authentication);
        assert_eq!(categorize("2001"), ErrorCategory::BadRequest);
        assert_eq!(categorize("2005"), ErrorCategory::Conflict);
        assert_eq!(categorize("3001"), ErrorCategory::BadRequest);
        assert_eq!(categorize("5001"), ErrorCategory::ServiceUnavailable);
        // Unknown leading digit fails safe toward "try again".
        assert_eq!(categorize("9999"), ErrorCategory::ServiceUnavailable);
        assert_eq!(categorize(""), ErrorCategory::ServiceUnavailable);
    }

    #[test]
    fn retryable_is_transient_system_only() {
        assert!(is_retryable("5002"));
        assert!(is_retryable("5003"));
        assert!(is_retryable("5004"));
        assert!(is_retryable("5005"));
        assert!(!is_retryable("5001"));
        assert!(!is_retryable("2005"));
        assert!(!is_retryable("1001"));
        assert!(!is_retryable("3001"));
    }

    #[test]
    fn error_for_uses_catalog_when_no_message() {
        match error_for("1001", None) {
            SiiError::Authentication { code, message } => {
                assert_eq!(code, "1001");
                assert_eq!(message, "client certificate expired");
            }
            other => panic!("unexpected: {other:?}"),
        }
        match error_for("2005", Some("ya registrada")) {
            SiiError::Conflict { message, .. } => assert_eq!(message, "ya registrada"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn fault_with_detail_code_maps_directly() {
        let fault = Fault {
            code: "env:Client".into(),
            message: "rejected".into(),
            detail_code: Some("3001".into()),
            detail_message: Some("fuera de plazo".into()),
        };
        match error_for_fault(&fault) {
            SiiError::BadRequest { code, message } => {
                assert_eq!(code, "3001");
                assert_eq!(message, "fuera de plazo");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn fault_code_embedded_in_text_is_extracted() {
        let fault = Fault {
            code: "env:Server".into(),
            message: "error 5004: limite de peticiones".into(),
            detail_code: None,
            detail_message: None,
        };
        assert!(fault_is_retryable(&fault));
        assert!(matches!(
            error_for_fault(&fault),
            SiiError::ServiceUnavailable { .. }
        ));
    }

    #[test]
    fn soap_prefix_fallback() {
        let client = Fault {
            code: "soap:Client".into(),
            message: "bad".into(),
            detail_code: None,
            detail_message: None,
        };
        assert!(matches!(
            error_for_fault(&client),
            SiiError::BadRequest { .. }
        ));

        let server = Fault {
            code: "soap:Server".into(),
            message: "busy".into(),
            detail_code: None,
            detail_message: None,
        };
        assert!(matches!(
            error_for_fault(&server),
            SiiError::ServiceUnavailable { .. }
        ));
        assert!(!fault_is_retryable(&server));
    }

    #[test]
    fn embedded_code_ignores_longer_runs() {
        assert_eq!(embedded_code("id 123456 then 3002 ok"), Some("3002".into()));
        assert_eq!(embedded_code("nothing here"), None);
        assert_eq!(embedded_code("4999 wrong family"), None);
    }
}
