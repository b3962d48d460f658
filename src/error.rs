use thiserror::Error;

/// Failure reported by the resolver collaborator for a single lookup.
///
/// These never escape the DNS cache as errors: the cache converts them into a
/// non-cached `DomainDnsRecord` carrying the matching failure code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveFailure {
    /// The domain (or record type) does not exist.
    #[error("domain not found")]
    NotFound,
    /// The lookup did not complete within the resolver's deadline.
    #[error("DNS lookup timed out")]
    Timeout,
    /// Any other resolver-level problem (I/O, protocol, configuration).
    #[error("DNS lookup failed: {0}")]
    Other(String),
}

impl ResolveFailure {
    /// Stable error code surfaced in validation results.
    pub fn code(&self) -> &'static str {
        match self {
            ResolveFailure::NotFound => "DOMAIN_NOT_FOUND",
            ResolveFailure::Timeout => "DNS_TIMEOUT",
            ResolveFailure::Other(_) => "DNS_ERROR",
        }
    }
}

/// Programmer errors at the scheduler boundary. Unlike per-item failures,
/// these reject the whole enqueue operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("unknown priority `{0}`, expected CRITICAL, HIGH, NORMAL or LOW")]
    InvalidPriority(String),
}
