use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, warn};

use crate::core::{BookCode, SiiError};
use crate::wire;

use super::Transport;
use super::credentials::ClientIdentity;
use super::endpoints::Environment;
use super::ratelimit::{RateLimit, RateLimiter};

/// Bounded exponential backoff: `delay = min(initial × multiplier^(n−1), max)`
/// after the n-th failed attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Backoff delay after the `attempt`-th failure (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(63);
        let factor = self.multiplier.powi(exponent as i32);
        let delay = self.initial_delay.mul_f64(factor.max(0.0));
        delay.min(self.max_delay)
    }
}

/// Configuration for [`SiiClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub environment: Environment,
    pub identity: ClientIdentity,
    /// Per-call timeout; an elapsed timeout counts as a transient failure.
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Relax certificate-chain verification. Honoured in the sandbox only —
    /// production always verifies.
    pub accept_invalid_certs: bool,
    /// Optional client-side request budget per endpoint.
    pub rate_limit: Option<RateLimit>,
}

impl ClientConfig {
    pub fn new(environment: Environment, identity: ClientIdentity) -> Self {
        Self {
            environment,
            identity,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            accept_invalid_certs: false,
            rate_limit: None,
        }
    }
}

/// Mutual-TLS submission client, pinned to one environment.
///
/// Holds only read-only configuration — concurrent submissions for
/// different books need no locking.
pub struct SiiClient {
    http: reqwest::Client,
    environment: Environment,
    retry: RetryPolicy,
    limiter: Option<RateLimiter>,
}

impl SiiClient {
    pub fn new(config: ClientConfig) -> Result<Self, SiiError> {
        let identity = config.identity.build()?;

        let mut builder = reqwest::Client::builder()
            .identity(identity)
            .timeout(config.timeout)
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .max_tls_version(reqwest::tls::Version::TLS_1_3);

        builder = if config.identity.uses_native_tls() {
            builder.use_native_tls()
        } else {
            builder.use_rustls_tls()
        };

        if config.accept_invalid_certs && !config.environment.is_production() {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|e| SiiError::Tls(format!("client construction failed: {e}")))?;

        Ok(Self {
            http,
            environment: config.environment,
            retry: config.retry,
            limiter: config.rate_limit.map(RateLimiter::new),
        })
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Reset the client-side rate-limit counters (between test runs, or
    /// after an operator-acknowledged quota change).
    pub fn reset_rate_limits(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.reset();
        }
    }

    /// Deliver one payload to the endpoint serving `book`, retrying
    /// transient failures with exponential backoff. Returns the raw
    /// response body of the first successful attempt.
    pub async fn send(&self, book: BookCode, payload: &str) -> Result<String, SiiError> {
        let url = self.environment.endpoint(book);
        run_with_retry(&self.retry, |attempt| {
            debug!(%book, attempt, "submitting payload");
            self.attempt(&url, payload)
        })
        .await
    }

    async fn attempt(&self, url: &str, payload: &str) -> Result<String, AttemptError> {
        if let Some(limiter) = &self.limiter {
            if !limiter.try_acquire(url) {
                return Err(AttemptError {
                    error: wire::error_for("5004", Some("client-side rate limit reached")),
                    retryable: true,
                });
            }
        }

        let result = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", "\"\"")
            .body(payload.to_string())
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => return Err(classify_network_error(&e)),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            // A connection lost mid-body counts as transient.
            Err(e) => {
                return Err(AttemptError {
                    error: SiiError::Transport(error_chain(&e)),
                    retryable: true,
                });
            }
        };

        // A fault block is the most specific signal available and overrides
        // the HTTP status, in both directions.
        if let Some(fault) = wire::parse_fault(&body) {
            return Err(AttemptError {
                retryable: wire::fault_is_retryable(&fault),
                error: wire::error_for_fault(&fault),
            });
        }

        if status.is_success() {
            return Ok(body);
        }

        Err(status_error(status, &body))
    }
}

impl Transport for SiiClient {
    async fn send(&self, book: BookCode, payload: &str) -> Result<String, SiiError> {
        SiiClient::send(self, book, payload).await
    }
}

pub(crate) struct AttemptError {
    pub(crate) error: SiiError,
    pub(crate) retryable: bool,
}

/// Bounded retry loop — explicitly iterative so pathological attempt counts
/// cannot grow the call stack.
pub(crate) async fn run_with_retry<F, Fut>(
    policy: &RetryPolicy,
    mut op: F,
) -> Result<String, SiiError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<String, AttemptError>>,
{
    let mut last_error = None;

    for attempt in 1..=policy.max_attempts.max(1) {
        if attempt > 1 {
            let delay = policy.delay_for(attempt - 1);
            debug!(attempt, delay_ms = delay.as_millis() as u64, "backing off");
            tokio::time::sleep(delay).await;
        }

        match op(attempt).await {
            Ok(body) => return Ok(body),
            Err(AttemptError {
                error,
                retryable: false,
            }) => return Err(error),
            Err(AttemptError { error, .. }) => {
                warn!(attempt, error = %error, "transient submission failure");
                last_error = Some(error);
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| SiiError::Transport("submission failed with no attempts made".into())))
}

fn classify_network_error(e: &reqwest::Error) -> AttemptError {
    let detail = error_chain(e);

    // Handshake rejections reproduce deterministically.
    if detail.contains("certificate") || detail.contains("handshake") {
        return AttemptError {
            error: SiiError::Tls(detail),
            retryable: false,
        };
    }

    let retryable = e.is_timeout() || e.is_connect();
    AttemptError {
        error: SiiError::Transport(detail),
        retryable,
    }
}

fn status_error(status: StatusCode, body: &str) -> AttemptError {
    let retryable = retryable_status(status);
    let code = status.as_u16().to_string();
    let snippet: String = body.chars().take(200).collect();
    let message = if snippet.trim().is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {}", snippet.trim())
    };

    let error = if retryable {
        SiiError::ServiceUnavailable { code, message }
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        SiiError::Authentication { code, message }
    } else {
        SiiError::BadRequest { code, message }
    };
    AttemptError { error, retryable }
}

/// HTTP statuses worth retrying: request timeout, rate limit, and 5xx.
fn retryable_status(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

fn error_chain(e: &reqwest::Error) -> String {
    let mut parts = vec![e.to_string()];
    let mut source = std::error::Error::source(e);
    while let Some(err) = source {
        parts.push(err.to_string());
        source = err.source();
    }
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn delay_sequence_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 6,
            initial_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(5),
        };
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
        assert_eq!(policy.delay_for(4), Duration::from_secs(5)); // capped
        assert_eq!(policy.delay_for(10), Duration::from_secs(5));
    }

    #[test]
    fn retryable_statuses() {
        assert!(retryable_status(StatusCode::REQUEST_TIMEOUT));
        assert!(retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!retryable_status(StatusCode::BAD_REQUEST));
        assert!(!retryable_status(StatusCode::UNAUTHORIZED));
        assert!(!retryable_status(StatusCode::CONFLICT));
    }

    #[test]
    fn status_errors_classify() {
        let auth = status_error(StatusCode::FORBIDDEN, "");
        assert!(!auth.retryable);
        assert!(matches!(auth.error, SiiError::Authentication { .. }));

        let unavailable = status_error(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(unavailable.retryable);
        assert!(matches!(
            unavailable.error,
            SiiError::ServiceUnavailable { .. }
        ));
    }

    fn transient(message: &str) -> AttemptError {
        AttemptError {
            error: SiiError::ServiceUnavailable {
                code: "5002".into(),
                message: message.into(),
            },
            retryable: true,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success_with_backoff() {
        let policy = RetryPolicy {
            max_attempts: 4,
            initial_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
        };
        let calls = RefCell::new(0u32);
        let started = tokio::time::Instant::now();

        let result = run_with_retry(&policy, |_attempt| {
            let calls = &calls;
            async move {
                *calls.borrow_mut() += 1;
                if *calls.borrow() < 4 {
                    Err(transient("busy"))
                } else {
                    Ok("<ok/>".to_string())
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "<ok/>");
        assert_eq!(*calls.borrow(), 4);
        // 1s + 2s + 4s of backoff before the fourth attempt.
        assert_eq!(started.elapsed(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_fails_immediately() {
        let policy = RetryPolicy::default();
        let calls = RefCell::new(0u32);

        let result = run_with_retry(&policy, |_| {
            let calls = &calls;
            async move {
                *calls.borrow_mut() += 1;
                Err(AttemptError {
                    error: SiiError::Conflict {
                        code: "2005".into(),
                        message: "duplicate".into(),
                    },
                    retryable: false,
                })
            }
        })
        .await;

        assert!(matches!(result, Err(SiiError::Conflict { .. })));
        assert_eq!(*calls.borrow(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_surfaces_last_error() {
        let policy = RetryPolicy {
            max_attempts: 3,
            ..RetryPolicy::default()
        };
        let calls = RefCell::new(0u32);

        let result = run_with_retry(&policy, |attempt| {
            let calls = &calls;
            async move {
                *calls.borrow_mut() += 1;
                Err(transient(&format!("attempt {attempt}")))
            }
        })
        .await;

        assert_eq!(*calls.borrow(), 3);
        match result {
            Err(SiiError::ServiceUnavailable { message, .. }) => {
                assert_eq!(message, "attempt 3");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
