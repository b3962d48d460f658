use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::dns::providers::ProviderFamily;
use crate::dns::resolver::MxResolver;
use crate::error::ResolveFailure;
use crate::models::email::ValidationIssue;

/// Golden ratio. Drives the TTL multiplier, and the eviction sectioning.
/// The ratios are load-bearing: changing them changes cache retention and
/// expiry behavior.
pub const PHI: f64 = 1.618_033_988_749_895;

/// One normalized MX record, annotated with its provider family when the
/// exchange matches the static suffix table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MxHost {
    pub preference: u16,
    pub exchange: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderFamily>,
}

/// Everything the cache currently knows about one domain's DNS.
///
/// Mutated only by cache insertion and eviction; consumers receive clones.
#[derive(Debug, Clone)]
pub struct DomainDnsRecord {
    pub domain: String,
    pub has_dns: bool,
    pub has_mx: bool,
    pub has_valid_a: bool,
    /// Sorted by preference ascending.
    pub mx_hosts: Vec<MxHost>,
    pub a_records: Vec<IpAddr>,
    /// Set for resolver failures; failure records are never cached.
    pub failure: Option<ValidationIssue>,
    /// Confidence/importance score in [1, 5].
    pub priority: u8,
    pub expires_at: Instant,
}

impl DomainDnsRecord {
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// Provider family of the first annotated MX host, if any.
    pub fn provider(&self) -> Option<ProviderFamily> {
        self.mx_hosts.iter().find_map(|mx| mx.provider)
    }

    fn failed(domain: &str, failure: &ResolveFailure) -> Self {
        Self {
            domain: domain.to_string(),
            has_dns: false,
            has_mx: false,
            has_valid_a: false,
            mx_hosts: Vec::new(),
            a_records: Vec::new(),
            failure: Some(ValidationIssue::new(failure.code(), failure.to_string())),
            priority: 1,
            expires_at: Instant::now(),
        }
    }
}

/// Cache hit/miss counters, readable at any time.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Domain-keyed DNS result cache.
///
/// On a miss, MX and A lookups run concurrently through the resolver
/// collaborator; the merged record gets a priority score which feeds both its
/// TTL (higher priority lives longer) and its rank during eviction. Resolver
/// failures are surfaced as data on the returned record and never stored, so
/// a transient timeout cannot poison the cache.
pub struct DnsCache {
    resolver: Arc<dyn MxResolver>,
    store: Mutex<HashMap<String, DomainDnsRecord>>,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DnsCache {
    pub fn new(resolver: Arc<dyn MxResolver>, config: CacheConfig) -> Self {
        Self {
            resolver,
            store: Mutex::new(HashMap::new()),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the current DNS record for `domain`, from cache when a live
    /// entry exists, otherwise by resolving MX and A records concurrently.
    pub async fn resolve(&self, domain: &str) -> DomainDnsRecord {
        let domain = domain.trim_end_matches('.').to_lowercase();

        if let Some(record) = self.lookup_live(&domain) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(domain = %domain, priority = record.priority, "dns cache hit");
            return record;
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(domain = %domain, "dns cache miss");

        let (mx_result, a_result) = tokio::join!(
            self.resolver.resolve_mx(&domain),
            self.resolver.resolve_a(&domain)
        );

        // Not-found on a single record type is an empty record set; only a
        // transient failure, or both sides missing, is a resolution failure.
        let (mx_raw, mx_absent) = match mx_result {
            Ok(records) => (records, false),
            Err(ResolveFailure::NotFound) => (Vec::new(), true),
            Err(failure) => return self.fail(&domain, failure),
        };
        let (a_records, a_absent) = match a_result {
            Ok(records) => (records, false),
            Err(ResolveFailure::NotFound) => (Vec::new(), true),
            Err(failure) => return self.fail(&domain, failure),
        };
        if mx_absent && a_absent {
            return self.fail(&domain, ResolveFailure::NotFound);
        }

        let mx_hosts = normalize_mx(mx_raw);
        let has_mx = !mx_hosts.is_empty();
        let has_valid_a = !a_records.is_empty();
        let has_dns = has_mx || has_valid_a;
        let popular_provider = mx_hosts
            .iter()
            .any(|mx| mx.provider.is_some_and(ProviderFamily::is_popular));

        // Priority and TTL are computed from the fetched data, so insertion
        // is a single compute-priority -> compute-TTL -> store step.
        let priority = priority_score(has_mx, popular_provider, has_dns);
        let record = DomainDnsRecord {
            domain: domain.clone(),
            has_dns,
            has_mx,
            has_valid_a,
            mx_hosts,
            a_records,
            failure: None,
            priority,
            expires_at: Instant::now() + ttl_for(self.config.base_ttl, priority),
        };
        self.insert(record.clone());
        record
    }

    pub fn len(&self) -> usize {
        self.store.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    fn lookup_live(&self, domain: &str) -> Option<DomainDnsRecord> {
        let mut store = self.store.lock().unwrap();
        match store.get(domain) {
            Some(record) if !record.is_expired() => Some(record.clone()),
            Some(_) => {
                // Expiry check on read; expired entries are dropped lazily.
                store.remove(domain);
                None
            }
            None => None,
        }
    }

    fn fail(&self, domain: &str, failure: ResolveFailure) -> DomainDnsRecord {
        warn!(domain = %domain, code = failure.code(), "dns resolution failed");
        DomainDnsRecord::failed(domain, &failure)
    }

    /// Stores a record and runs maintenance when the soft capacity bound is
    /// exceeded. Insert and eviction happen under one lock acquisition, so
    /// interleaved reads never observe a half-maintained store.
    pub(crate) fn insert(&self, record: DomainDnsRecord) {
        let mut store = self.store.lock().unwrap();
        store.insert(record.domain.clone(), record);
        if store.len() > self.config.capacity {
            evict(&mut store, self.config.capacity);
        }
    }
}

/// Sorts MX records by preference ascending and annotates provider families.
fn normalize_mx(mut raw: Vec<(u16, String)>) -> Vec<MxHost> {
    raw.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    raw.into_iter()
        .map(|(preference, exchange)| {
            let provider = ProviderFamily::from_exchange(&exchange);
            MxHost {
                preference,
                exchange,
                provider,
            }
        })
        .collect()
}

/// Priority score: start at 3, +1 for MX records, +1 for a popular provider,
/// -1 for no DNS at all, clamped to [1, 5].
pub(crate) fn priority_score(has_mx: bool, popular_provider: bool, has_dns: bool) -> u8 {
    let mut score: i8 = 3;
    if has_mx {
        score += 1;
    }
    if popular_provider {
        score += 1;
    }
    if !has_dns {
        score -= 1;
    }
    score.clamp(1, 5) as u8
}

/// TTL scaled by PHI^(priority - 3): trusted, common domains stay cached
/// longer while low-priority domains expire sooner.
pub(crate) fn ttl_for(base: Duration, priority: u8) -> Duration {
    Duration::from_secs_f64(base.as_secs_f64() * PHI.powi(i32::from(priority) - 3))
}

/// Golden-ratio partition of the capacity bound:
/// `(floor(cap/phi^2), floor(cap/phi), remainder)`. The three sections sum to
/// exactly `cap`.
pub(crate) fn golden_sections(capacity: usize) -> (usize, usize, usize) {
    let s1 = (capacity as f64 / (PHI * PHI)).floor() as usize;
    let s2 = (capacity as f64 / PHI).floor() as usize;
    (s1, s2, capacity - s1 - s2)
}

/// Deterministic, priority-biased retention: rank all entries by
/// `(priority desc, expires_at desc)` and keep the top `capacity`.
fn evict(store: &mut HashMap<String, DomainDnsRecord>, capacity: usize) {
    let (s1, s2, s3) = golden_sections(capacity);
    let keep = s1 + s2 + s3;

    let mut entries: Vec<DomainDnsRecord> = store.drain().map(|(_, r)| r).collect();
    entries.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.expires_at.cmp(&a.expires_at))
    });
    let evicted = entries.len().saturating_sub(keep);
    entries.truncate(keep);
    store.extend(entries.into_iter().map(|r| (r.domain.clone(), r)));
    debug!(evicted, retained = store.len(), "dns cache maintenance");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::resolver::MockMxResolver;
    use mockall::predicate::eq;
    use std::sync::Arc;

    fn cache_with(resolver: MockMxResolver, config: CacheConfig) -> DnsCache {
        DnsCache::new(Arc::new(resolver), config)
    }

    fn record(domain: &str, priority: u8, ttl_secs: u64) -> DomainDnsRecord {
        DomainDnsRecord {
            domain: domain.to_string(),
            has_dns: true,
            has_mx: true,
            has_valid_a: false,
            mx_hosts: Vec::new(),
            a_records: Vec::new(),
            failure: None,
            priority,
            expires_at: Instant::now() + Duration::from_secs(ttl_secs),
        }
    }

    #[tokio::test]
    async fn second_resolve_within_ttl_hits_the_cache() {
        let mut resolver = MockMxResolver::new();
        resolver
            .expect_resolve_mx()
            .with(eq("example.com"))
            .times(1)
            .returning(|_| Ok(vec![(10, "mx.example.com".to_string())]));
        resolver
            .expect_resolve_a()
            .with(eq("example.com"))
            .times(1)
            .returning(|_| Ok(vec!["93.184.216.34".parse().unwrap()]));

        let cache = cache_with(resolver, CacheConfig::default());
        let first = cache.resolve("example.com").await;
        let second = cache.resolve("example.com").await;

        assert!(first.has_dns && second.has_dns);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn domain_is_normalized_before_lookup() {
        let mut resolver = MockMxResolver::new();
        resolver
            .expect_resolve_mx()
            .with(eq("example.com"))
            .times(1)
            .returning(|_| Ok(vec![(10, "mx.example.com".to_string())]));
        resolver
            .expect_resolve_a()
            .with(eq("example.com"))
            .times(1)
            .returning(|_| Ok(vec![]));

        let cache = cache_with(resolver, CacheConfig::default());
        cache.resolve("Example.COM.").await;
        let hit = cache.resolve("example.com").await;
        assert!(hit.has_mx);
    }

    #[tokio::test]
    async fn timeout_failure_is_surfaced_and_not_cached() {
        let mut resolver = MockMxResolver::new();
        resolver
            .expect_resolve_mx()
            .times(2)
            .returning(|_| Err(ResolveFailure::Timeout));
        resolver
            .expect_resolve_a()
            .times(2)
            .returning(|_| Ok(vec![]));

        let cache = cache_with(resolver, CacheConfig::default());
        let record = cache.resolve("x.invalid").await;

        assert!(!record.has_dns);
        assert_eq!(record.failure.as_ref().unwrap().code, "DNS_TIMEOUT");
        assert_eq!(cache.len(), 0);

        // Next call re-invokes the resolver (times(2) above enforces it).
        cache.resolve("x.invalid").await;
    }

    #[tokio::test]
    async fn both_record_types_missing_is_domain_not_found() {
        let mut resolver = MockMxResolver::new();
        resolver
            .expect_resolve_mx()
            .returning(|_| Err(ResolveFailure::NotFound));
        resolver
            .expect_resolve_a()
            .returning(|_| Err(ResolveFailure::NotFound));

        let cache = cache_with(resolver, CacheConfig::default());
        let record = cache.resolve("nonexistent.invalid").await;

        assert!(!record.has_dns);
        assert_eq!(record.failure.as_ref().unwrap().code, "DOMAIN_NOT_FOUND");
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn missing_mx_with_a_records_is_cached_success() {
        let mut resolver = MockMxResolver::new();
        resolver
            .expect_resolve_mx()
            .returning(|_| Err(ResolveFailure::NotFound));
        resolver
            .expect_resolve_a()
            .returning(|_| Ok(vec!["192.0.2.1".parse().unwrap()]));

        let cache = cache_with(resolver, CacheConfig::default());
        let record = cache.resolve("a-only.example").await;

        assert!(record.has_dns);
        assert!(!record.has_mx);
        assert!(record.has_valid_a);
        assert!(record.failure.is_none());
        assert_eq!(cache.len(), 1);
        // No MX, no provider bonus: 3 - 0 = 3.
        assert_eq!(record.priority, 3);
    }

    #[tokio::test]
    async fn google_mx_scores_priority_five() {
        let mut resolver = MockMxResolver::new();
        resolver
            .expect_resolve_mx()
            .returning(|_| Ok(vec![(10, "aspmx.l.google.com".to_string())]));
        resolver.expect_resolve_a().returning(|_| Ok(vec![]));

        let cache = cache_with(resolver, CacheConfig::default());
        let record = cache.resolve("corp.example").await;

        assert!(record.priority >= 4);
        assert_eq!(record.priority, 5);
        assert_eq!(
            record.provider(),
            Some(ProviderFamily::GoogleWorkspace)
        );
    }

    #[tokio::test]
    async fn mx_hosts_are_sorted_by_preference() {
        let mut resolver = MockMxResolver::new();
        resolver.expect_resolve_mx().returning(|_| {
            Ok(vec![
                (30, "mx3.example.com".to_string()),
                (10, "mx1.example.com".to_string()),
                (20, "mx2.example.com".to_string()),
            ])
        });
        resolver.expect_resolve_a().returning(|_| Ok(vec![]));

        let cache = cache_with(resolver, CacheConfig::default());
        let record = cache.resolve("example.com").await;
        let exchanges: Vec<&str> = record.mx_hosts.iter().map(|m| m.exchange.as_str()).collect();
        assert_eq!(exchanges, vec!["mx1.example.com", "mx2.example.com", "mx3.example.com"]);
    }

    #[test]
    fn priority_score_is_clamped() {
        assert_eq!(priority_score(true, true, true), 5);
        assert_eq!(priority_score(true, false, true), 4);
        assert_eq!(priority_score(false, false, true), 3);
        assert_eq!(priority_score(false, false, false), 2);
        // All combinations stay inside [1, 5].
        for has_mx in [false, true] {
            for popular in [false, true] {
                for has_dns in [false, true] {
                    let p = priority_score(has_mx, popular, has_dns);
                    assert!((1..=5).contains(&p));
                }
            }
        }
    }

    #[test]
    fn ttl_scales_by_phi_around_the_midpoint() {
        let base = Duration::from_secs(3600);
        assert_eq!(ttl_for(base, 3), base);
        let high = ttl_for(base, 4).as_secs_f64() / base.as_secs_f64();
        let low = ttl_for(base, 2).as_secs_f64() / base.as_secs_f64();
        assert!((high - PHI).abs() < 1e-9);
        assert!((low - 1.0 / PHI).abs() < 1e-9);
        assert!(ttl_for(base, 5) > ttl_for(base, 4));
        assert!(ttl_for(base, 1) < ttl_for(base, 2));
    }

    #[test]
    fn golden_sections_sum_to_capacity() {
        for cap in [10, 100, 377, 1000] {
            let (s1, s2, s3) = golden_sections(cap);
            assert_eq!(s1 + s2 + s3, cap, "cap={cap}");
            assert!(s1 <= s2);
        }
        assert_eq!(golden_sections(1000), (381, 618, 1));
    }

    #[tokio::test]
    async fn eviction_bounds_size_and_keeps_high_priority() {
        let cache = cache_with(
            MockMxResolver::new(),
            CacheConfig {
                base_ttl: Duration::from_secs(3600),
                capacity: 10,
            },
        );

        for i in 0..10 {
            cache.insert(record(&format!("low{i}.example"), 2, 60));
        }
        for i in 0..5 {
            cache.insert(record(&format!("high{i}.example"), 5, 60));
        }

        assert_eq!(cache.len(), 10);
        // All high-priority entries survive; the overflow came out of the
        // low-priority population.
        for i in 0..5 {
            let domain = format!("high{i}.example");
            assert!(
                cache.resolve(&domain).await.has_dns,
                "{domain} should still be cached"
            );
        }
    }

    #[tokio::test]
    async fn expired_entries_are_dropped_on_read() {
        let mut resolver = MockMxResolver::new();
        resolver
            .expect_resolve_mx()
            .times(1)
            .returning(|_| Ok(vec![(10, "mx.example.com".to_string())]));
        resolver.expect_resolve_a().times(1).returning(|_| Ok(vec![]));

        let cache = cache_with(resolver, CacheConfig::default());
        let mut stale = record("stale.example", 3, 60);
        stale.expires_at = Instant::now() - Duration::from_secs(1);
        cache.insert(stale);

        // The expired entry forces a fresh lookup.
        let fresh = cache.resolve("stale.example").await;
        assert!(fresh.has_mx);
        assert_eq!(cache.stats().misses, 1);
    }
}
