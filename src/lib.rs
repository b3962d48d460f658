pub mod config;
pub mod dns;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod scheduler;
pub mod validation;

pub use config::{BatchOptions, CacheConfig, Priority, SchedulerConfig, ValidationOptions};
pub use dns::cache::{DnsCache, DomainDnsRecord};
pub use dns::resolver::{MxResolver, TrustDnsMxResolver};
pub use models::email::{
    ApiValidationResponse, BatchSummary, BatchValidationResponse, ValidationIssue,
    ValidationResult,
};
pub use orchestrator::{NullSink, ResultSink, ValidationOrchestrator};
pub use scheduler::{BatchItemError, BatchScheduler, BatchStats};
pub use validation::validator::EmailValidator;
