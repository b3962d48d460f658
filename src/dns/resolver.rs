use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use trust_dns_resolver::{
    TokioAsyncResolver,
    config::{ResolverConfig, ResolverOpts},
    error::{ResolveError, ResolveErrorKind},
};

use crate::error::ResolveFailure;

/// The resolver collaborator. Performs raw MX and A lookups with no caching
/// responsibility; the DNS cache owns result lifetimes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MxResolver: Send + Sync {
    /// MX records as `(preference, exchange)` pairs, unordered.
    async fn resolve_mx(&self, domain: &str) -> Result<Vec<(u16, String)>, ResolveFailure>;

    /// A/AAAA addresses for the domain.
    async fn resolve_a(&self, domain: &str) -> Result<Vec<IpAddr>, ResolveFailure>;
}

/// Production resolver on top of `trust-dns-resolver`.
pub struct TrustDnsMxResolver {
    inner: TokioAsyncResolver,
}

impl TrustDnsMxResolver {
    /// System default upstreams with a 2 second timeout and 2 attempts per
    /// lookup.
    pub fn new() -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = Duration::from_secs(2);
        opts.attempts = 2;

        Self {
            inner: TokioAsyncResolver::tokio(ResolverConfig::default(), opts),
        }
    }
}

impl Default for TrustDnsMxResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MxResolver for TrustDnsMxResolver {
    async fn resolve_mx(&self, domain: &str) -> Result<Vec<(u16, String)>, ResolveFailure> {
        let lookup = self.inner.mx_lookup(domain).await.map_err(classify)?;
        Ok(lookup
            .iter()
            .map(|mx| {
                let exchange = mx.exchange().to_utf8();
                (
                    mx.preference(),
                    exchange.trim_end_matches('.').to_string(),
                )
            })
            .collect())
    }

    async fn resolve_a(&self, domain: &str) -> Result<Vec<IpAddr>, ResolveFailure> {
        let lookup = self.inner.lookup_ip(domain).await.map_err(classify)?;
        Ok(lookup.iter().collect())
    }
}

fn classify(error: ResolveError) -> ResolveFailure {
    match error.kind() {
        ResolveErrorKind::NoRecordsFound { .. } => ResolveFailure::NotFound,
        ResolveErrorKind::Timeout => ResolveFailure::Timeout,
        _ => ResolveFailure::Other(error.to_string()),
    }
}
