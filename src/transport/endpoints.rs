use serde::{Deserialize, Serialize};

use crate::core::BookCode;

/// Target environment. Sandbox and production hosts are disjoint and a
/// client is pinned to one of them — they never mix within a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Production,
    Sandbox,
}

impl Environment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Production => "https://www1.agenciatributaria.gob.es/wlpl/SSII-FACT/ws",
            Self::Sandbox => "https://prewww1.aeat.es/wlpl/SSII-FACT/ws",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Full endpoint URL for the family serving `book`.
    pub fn endpoint(&self, book: BookCode) -> String {
        format!("{}{}", self.base_url(), EndpointFamily::for_book(book).path())
    }

    /// Full endpoint URL of the status-query service.
    pub fn query_endpoint(&self) -> String {
        format!("{}{}", self.base_url(), EndpointFamily::Query.path())
    }
}

/// Endpoint families of the reporting service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndpointFamily {
    /// Issued-invoice ledgers (A1, A2).
    Issued,
    /// Received-invoice ledgers (B1–B4).
    Received,
    /// Payment/collection records (A3).
    Collections,
    /// Submission status queries.
    Query,
}

impl EndpointFamily {
    pub fn for_book(book: BookCode) -> Self {
        match book {
            BookCode::A1 | BookCode::A2 => Self::Issued,
            BookCode::A3 => Self::Collections,
            BookCode::B1 | BookCode::B2 | BookCode::B3 | BookCode::B4 => Self::Received,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::Issued => "/fe/SiiFactFEV1SOAP",
            Self::Received => "/fr/SiiFactFRV1SOAP",
            Self::Collections => "/fc/SiiFactCOBV1SOAP",
            Self::Query => "/con/SiiFactCONV1SOAP",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environments_never_share_hosts() {
        assert_ne!(
            Environment::Production.base_url(),
            Environment::Sandbox.base_url()
        );
        assert!(Environment::Production.base_url().starts_with("https://"));
        assert!(Environment::Sandbox.base_url().starts_with("https://"));
    }

    #[test]
    fn books_map_to_families() {
        assert_eq!(EndpointFamily::for_book(BookCode::A1), EndpointFamily::Issued);
        assert_eq!(EndpointFamily::for_book(BookCode::A2), EndpointFamily::Issued);
        assert_eq!(
            EndpointFamily::for_book(BookCode::A3),
            EndpointFamily::Collections
        );
        for book in [BookCode::B1, BookCode::B2, BookCode::B3, BookCode::B4] {
            assert_eq!(EndpointFamily::for_book(book), EndpointFamily::Received);
        }
    }

    #[test]
    fn endpoint_urls_compose() {
        let url = Environment::Sandbox.endpoint(BookCode::B3);
        assert_eq!(url, "https://prewww1.aeat.es/wlpl/SSII-FACT/ws/fr/SiiFactFRV1SOAP");
    }
}
