//! Mutual-TLS transport to the authority's submission endpoints.
//!
//! Wraps `reqwest` with client-certificate authentication, pinned TLS
//! versions, bounded exponential-backoff retry, and client-side rate-limit
//! counters. Failure bodies are decoded through [`crate::wire`] so the
//! caller always gets a classified [`SiiError`](crate::core::SiiError).

mod client;
mod credentials;
mod endpoints;
mod ratelimit;

pub use client::{ClientConfig, RetryPolicy, SiiClient};
pub use credentials::ClientIdentity;
pub use endpoints::{EndpointFamily, Environment};
pub use ratelimit::{RateLimit, RateLimiter};

use std::sync::Arc;

use crate::core::{BookCode, SiiError};

/// The transport seam of the submission pipeline.
///
/// [`SiiClient`] is the production implementation; tests script this trait
/// to simulate authority behaviour without a network.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Deliver one serialized payload to the endpoint serving `book` and
    /// return the raw response body.
    async fn send(&self, book: BookCode, payload: &str) -> Result<String, SiiError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, book: BookCode, payload: &str) -> Result<String, SiiError> {
        (**self).send(book, payload).await
    }
}
