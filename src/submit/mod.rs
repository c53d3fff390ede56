//! Submission orchestration: validate, route, serialize, transport, merge.
//!
//! One [`Submitter`] drives the whole pipeline for a batch: fail-fast
//! validation (no network for an invalid batch), book partitioning,
//! concurrent per-book submission, partial-success merging, the
//! status cache, and the audit trail.

mod audit;
mod cache;

pub use audit::{AuditEntry, AuditError, AuditSink, MemoryAudit};
pub use cache::SubmissionCache;

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use tracing::{info, warn};

use crate::core::*;
use crate::transport::Transport;
use crate::wire::{self, DeliveryStatus, SubmissionResponse};

/// Drives submission attempts end to end.
///
/// The transport is a type parameter so tests can script authority
/// behaviour; production code uses
/// [`SiiClient`](crate::transport::SiiClient).
pub struct Submitter<T: Transport> {
    transport: T,
    validation: ValidationConfig,
    cache: SubmissionCache,
    audit: Arc<dyn AuditSink>,
}

impl<T: Transport> Submitter<T> {
    /// Defaults: standard 4-day window, 24-hour status cache, in-memory
    /// audit log.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            validation: ValidationConfig::default(),
            cache: SubmissionCache::new(24),
            audit: Arc::new(MemoryAudit::new()),
        }
    }

    pub fn with_validation(mut self, validation: ValidationConfig) -> Self {
        self.validation = validation;
        self
    }

    pub fn with_cache_ttl_hours(mut self, hours: i64) -> Self {
        self.cache = SubmissionCache::new(hours);
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn cache(&self) -> &SubmissionCache {
        &self.cache
    }

    /// Submit every book of the batch, valuing the submission window
    /// against today's date.
    pub async fn submit(&self, batch: &SubmissionBatch) -> Result<SubmissionResult, SiiError> {
        self.submit_at(batch, Utc::now().date_naive()).await
    }

    /// [`submit`](Self::submit) with an explicit reference date for the
    /// submission-window check.
    pub async fn submit_at(
        &self,
        batch: &SubmissionBatch,
        today: NaiveDate,
    ) -> Result<SubmissionResult, SiiError> {
        self.validate(batch, today)?;
        let partition = BookPartition::of(batch);
        self.submit_partition(batch, partition).await
    }

    /// Submit only the invoices routed to `book`. An empty selection is a
    /// business error, not a silent no-op.
    pub async fn submit_book(
        &self,
        batch: &SubmissionBatch,
        book: BookCode,
    ) -> Result<SubmissionResult, SiiError> {
        self.submit_book_at(batch, book, Utc::now().date_naive()).await
    }

    pub async fn submit_book_at(
        &self,
        batch: &SubmissionBatch,
        book: BookCode,
        today: NaiveDate,
    ) -> Result<SubmissionResult, SiiError> {
        self.validate(batch, today)?;
        let partition = BookPartition::of(batch).only(book)?;
        self.submit_partition(batch, partition).await
    }

    /// Cached status of a past submission, honouring expiry.
    pub fn status(&self, submission_id: &str) -> Option<CachedSubmission> {
        self.cache.get(submission_id)
    }

    fn validate(&self, batch: &SubmissionBatch, today: NaiveDate) -> Result<(), SiiError> {
        // Submitting nothing is never correct, silently or otherwise.
        if batch.invoices.is_empty() {
            let report = BatchValidationReport {
                invoices: vec![InvoiceValidationReport {
                    invoice_number: format!("holder {}", batch.holder.tax_id),
                    errors: vec![ValidationError::new(
                        "invoices",
                        "batch must contain at least one invoice",
                    )],
                }],
            };
            self.record_failure(batch, "VALIDATION_FAILED");
            return Err(SiiError::Validation(report));
        }
        if let Err(e) = validate_batch(batch, today, &self.validation) {
            self.record_failure(batch, "VALIDATION_FAILED");
            return Err(e);
        }
        Ok(())
    }

    async fn submit_partition(
        &self,
        batch: &SubmissionBatch,
        partition: BookPartition<'_>,
    ) -> Result<SubmissionResult, SiiError> {
        let jobs = match build_jobs(batch, &partition) {
            Ok(jobs) => jobs,
            Err(e) => {
                self.record_failure(batch, "ERROR");
                return Err(e);
            }
        };

        // Book partitions are independent; retries stay sequential within
        // each book's send.
        let sends = jobs.iter().map(|job| async move {
            let outcome = self.transport.send(job.book, &job.payload).await;
            (job, outcome)
        });
        let settled = join_all(sends).await;

        let mut merged = Merge::default();
        for (job, outcome) in settled {
            match outcome {
                Ok(body) => match wire::parse_response(&body) {
                    Ok(response) => merged.absorb_response(job, response),
                    Err(e) => merged.absorb_failure(job, e),
                },
                Err(e) => merged.absorb_failure(job, e),
            }
        }

        // No partition was delivered: raise the most specific classified
        // error instead of an all-rejected result.
        if merged.responded == 0 {
            if let Some(error) = merged.take_most_specific_error() {
                self.record_failure(batch, "ERROR");
                return Err(error);
            }
        }

        let timestamp = Utc::now();
        let submission_id = merged
            .submission_id
            .take()
            .unwrap_or_else(|| format!("LOC-{}", uuid::Uuid::new_v4()));
        let success = merged.success();
        let accepted = merged.accepted;
        let rejected = merged.rejected;
        let status = if rejected == 0 {
            SubmissionStatus::Accepted
        } else if accepted > 0 {
            SubmissionStatus::AcceptedWithErrors
        } else {
            SubmissionStatus::Rejected
        };

        self.cache.store(CachedSubmission {
            submission_id: submission_id.clone(),
            status,
            submitted_at: timestamp,
            processed_at: Some(timestamp),
            verification: merged.verification.clone(),
            invoice_count: accepted + rejected,
            accepted,
            rejected,
            expires_at: self.cache.expiry_from(timestamp),
        });

        self.append_audit(AuditEntry {
            holder_tax_id: batch.holder.tax_id.clone(),
            submission_id: submission_id.clone(),
            invoice_count: accepted + rejected,
            accepted,
            rejected,
            outcome: status.as_str().to_string(),
            timestamp,
        });

        info!(
            submission_id = %submission_id,
            accepted,
            rejected,
            status = status.as_str(),
            "submission merged"
        );

        Ok(SubmissionResult {
            success,
            timestamp,
            submission_id: Some(submission_id),
            accepted,
            rejected,
            outcomes: merged.outcomes,
            verification: merged.verification,
        })
    }

    fn record_failure(&self, batch: &SubmissionBatch, outcome: &str) {
        self.append_audit(AuditEntry {
            holder_tax_id: batch.holder.tax_id.clone(),
            submission_id: format!("LOC-{}", uuid::Uuid::new_v4()),
            invoice_count: batch.invoices.len() as u32,
            accepted: 0,
            rejected: 0,
            outcome: outcome.to_string(),
            timestamp: Utc::now(),
        });
    }

    fn append_audit(&self, entry: AuditEntry) {
        if let Err(e) = self.audit.append(entry) {
            warn!(error = %e, "audit append failed");
        }
    }
}

struct Job {
    book: BookCode,
    payload: String,
    numbers: Vec<String>,
}

fn build_jobs(
    batch: &SubmissionBatch,
    partition: &BookPartition<'_>,
) -> Result<Vec<Job>, SiiError> {
    let mut jobs = Vec::new();
    match partition {
        BookPartition::Issued(groups) => {
            for (book, invoices) in groups {
                let payload = wire::build_issued_payload(
                    &batch.holder,
                    batch.fiscal_year,
                    batch.period,
                    *book,
                    invoices,
                )?;
                jobs.push(Job {
                    book: *book,
                    payload,
                    numbers: invoices.iter().map(|i| i.identity.number.clone()).collect(),
                });
            }
        }
        BookPartition::Received(groups) => {
            for (book, invoices) in groups {
                let payload = wire::build_received_payload(
                    &batch.holder,
                    batch.fiscal_year,
                    batch.period,
                    *book,
                    invoices,
                )?;
                jobs.push(Job {
                    book: *book,
                    payload,
                    numbers: invoices.iter().map(|i| i.identity.number.clone()).collect(),
                });
            }
        }
    }
    Ok(jobs)
}

/// Accumulates per-book outcomes into one combined result.
#[derive(Default)]
struct Merge {
    responded: usize,
    failures: usize,
    accepted: u32,
    rejected: u32,
    outcomes: Vec<InvoiceOutcome>,
    submission_id: Option<String>,
    verification: Option<String>,
    errors: Vec<SiiError>,
}

impl Merge {
    fn absorb_response(&mut self, job: &Job, response: SubmissionResponse) {
        self.responded += 1;
        if self.submission_id.is_none() {
            self.submission_id = response.submission_id.clone();
        }
        if self.verification.is_none() {
            self.verification = response.verification.clone();
        }
        for number in &job.numbers {
            let record = response
                .records
                .iter()
                .find(|r| &r.invoice_number == number);
            let accepted =
                record.map_or(response.status == DeliveryStatus::Accepted, |r| r.accepted);
            if accepted {
                self.accepted += 1;
            } else {
                self.rejected += 1;
            }
            self.outcomes.push(InvoiceOutcome {
                invoice_number: number.clone(),
                book: job.book,
                accepted,
                error: record.filter(|r| !r.accepted).and_then(|r| {
                    r.error_message.clone().or_else(|| r.error_code.clone())
                }),
            });
        }
    }

    fn absorb_failure(&mut self, job: &Job, error: SiiError) {
        warn!(book = %job.book, error = %error, "book partition failed");
        self.failures += 1;
        let message = error.to_string();
        for number in &job.numbers {
            self.rejected += 1;
            self.outcomes.push(InvoiceOutcome {
                invoice_number: number.clone(),
                book: job.book,
                accepted: false,
                error: Some(message.clone()),
            });
        }
        self.errors.push(error);
    }

    fn success(&self) -> bool {
        self.rejected == 0 && self.failures == 0
    }

    fn take_most_specific_error(&mut self) -> Option<SiiError> {
        let mut best: Option<usize> = None;
        for (i, error) in self.errors.iter().enumerate() {
            let better = match best {
                None => true,
                Some(j) => specificity(error) < specificity(&self.errors[j]),
            };
            if better {
                best = Some(i);
            }
        }
        best.map(|i| self.errors.swap_remove(i))
    }
}

/// Lower is more specific — used to pick the error reported when every
/// partition failed.
fn specificity(error: &SiiError) -> u8 {
    match error {
        SiiError::Authentication { .. } => 0,
        SiiError::Tls(_) => 1,
        SiiError::Conflict { .. } => 2,
        SiiError::BadRequest { .. } => 3,
        SiiError::Validation(_) => 4,
        SiiError::Xml(_) => 5,
        SiiError::EmptyBook(_) => 6,
        SiiError::ServiceUnavailable { .. } => 7,
        SiiError::Transport(_) => 8,
    }
}
