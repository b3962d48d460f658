use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::config::{BatchOptions, SchedulerConfig};
use crate::models::email::{
    ApiValidationResponse, BatchSummary, BatchValidationResponse, ValidationResult,
};
use crate::scheduler::BatchScheduler;
use crate::validation::validator::EmailValidator;

/// Persistence collaborator. Receives finished results; validity is always
/// decided before anything is recorded, so a slow or failing sink can never
/// change an outcome.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn record(&self, result: &ValidationResult);
    async fn record_batch(&self, summary: &BatchSummary);
}

/// Default sink: discards results.
pub struct NullSink;

#[async_trait]
impl ResultSink for NullSink {
    async fn record(&self, _result: &ValidationResult) {}
    async fn record_batch(&self, _summary: &BatchSummary) {}
}

/// Thin glue between the caller-facing API shape, the scheduler and the
/// validator.
///
/// Batch requests are partitioned by domain before scheduling, so every
/// domain's first item warms the shared DNS cache and the rest of its group
/// hit the cached entry.
pub struct ValidationOrchestrator {
    validator: Arc<EmailValidator>,
    scheduler_config: SchedulerConfig,
    sink: Arc<dyn ResultSink>,
}

impl ValidationOrchestrator {
    pub fn new(validator: Arc<EmailValidator>, scheduler_config: SchedulerConfig) -> Self {
        Self::with_sink(validator, scheduler_config, Arc::new(NullSink))
    }

    pub fn with_sink(
        validator: Arc<EmailValidator>,
        scheduler_config: SchedulerConfig,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        Self {
            validator,
            scheduler_config,
            sink,
        }
    }

    /// Validates one email and derives the API-shape risk fields.
    pub async fn validate_one(
        &self,
        email: &str,
        options: &BatchOptions,
    ) -> ApiValidationResponse {
        let result = self.run_validation(email, options).await;
        self.sink.record(&result).await;
        ApiValidationResponse::from(result)
    }

    /// Validates a batch. Results come back in input order, one per input
    /// email, regardless of per-item failures.
    pub async fn validate_batch(
        &self,
        emails: Vec<String>,
        options: &BatchOptions,
    ) -> BatchValidationResponse {
        if emails.is_empty() {
            return BatchValidationResponse {
                results: Vec::new(),
                summary: BatchSummary::default(),
            };
        }

        let groups = group_by_domain(emails);
        debug!(groups = groups.len(), "dispatching batch by domain group");

        // One queue for this logical invocation; concurrent batch calls get
        // their own scheduler and cannot interfere.
        let scheduler: BatchScheduler<(usize, ValidationResult)> =
            BatchScheduler::new(self.scheduler_config);

        let group_runs = groups.into_iter().map(|(_, group)| {
            let scheduler = &scheduler;
            let priority = options.priority;
            let validation = options.validation;
            let check_dns = options.check_dns;
            async move {
                // Keep (index, email) alongside the outcomes: enqueue
                // preserves 1:1 input order, so a failed outcome can still
                // be matched back to its email.
                let inputs = group.clone();
                let validator = self.validator.clone();
                let outcomes = scheduler
                    .enqueue(group, priority, move |(index, email): (usize, String)| {
                        let validator = validator.clone();
                        async move {
                            let result = if check_dns {
                                validator.validate_with_dns(&email, &validation).await
                            } else {
                                validator.validate(&email, &validation).await
                            };
                            Ok((index, result))
                        }
                    })
                    .await;

                inputs
                    .into_iter()
                    .zip(outcomes)
                    .map(|((index, email), outcome)| match outcome {
                        Ok((_, result)) => (index, result),
                        Err(failure) => {
                            warn!(email = %email, %failure, "batch item failed");
                            (index, ValidationResult::system_failure(&email, failure.to_string()))
                        }
                    })
                    .collect::<Vec<_>>()
            }
        });

        let mut indexed: Vec<(usize, ValidationResult)> =
            join_all(group_runs).await.into_iter().flatten().collect();
        indexed.sort_by_key(|(index, _)| *index);
        let results: Vec<ValidationResult> =
            indexed.into_iter().map(|(_, result)| result).collect();

        let summary = BatchSummary::from_results(&results);
        for result in &results {
            self.sink.record(result).await;
        }
        self.sink.record_batch(&summary).await;

        BatchValidationResponse { results, summary }
    }

    async fn run_validation(&self, email: &str, options: &BatchOptions) -> ValidationResult {
        if options.check_dns {
            self.validator
                .validate_with_dns(email, &options.validation)
                .await
        } else {
            self.validator.validate(email, &options.validation).await
        }
    }
}

/// Partitions `(index, email)` pairs by domain. Emails without an `@` end up
/// in one group with an empty key and fail at the format stage.
fn group_by_domain(emails: Vec<String>) -> HashMap<String, Vec<(usize, String)>> {
    let mut groups: HashMap<String, Vec<(usize, String)>> = HashMap::new();
    for (index, email) in emails.into_iter().enumerate() {
        let domain = email
            .split('@')
            .nth(1)
            .unwrap_or("")
            .trim()
            .to_lowercase();
        groups.entry(domain).or_default().push((index, email));
    }
    groups
}
