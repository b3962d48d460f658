use std::sync::{Arc, LazyLock};

use futures::FutureExt;
use regex::Regex;
use tracing::debug;

use crate::config::ValidationOptions;
use crate::dns::cache::{DnsCache, DomainDnsRecord};
use crate::models::email::{
    DnsFacts, DomainFacts, LocalPartFacts, ValidationIssue, ValidationResult,
};
use crate::validation::disposable::DisposableDomains;
use crate::validation::role_based::RolePrefixes;
use crate::validation::syntax;

/// Cheap-rejection pattern: something before an `@`, something after, no
/// whitespace. Full structure is checked by the syntax analyzer.
static QUICK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("quick pattern compiles"));

/// Trims surrounding whitespace and lowercases. Idempotent.
pub fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Multi-stage email validator.
///
/// Composes the syntax analyzer, the static disposable/role lists and the
/// DNS cache into one structured result. The validator retains no reference
/// to results it returns.
pub struct EmailValidator {
    cache: Arc<DnsCache>,
    disposable: DisposableDomains,
    roles: RolePrefixes,
}

impl EmailValidator {
    pub fn new(cache: Arc<DnsCache>) -> Self {
        Self::with_lists(cache, DisposableDomains::default(), RolePrefixes::default())
    }

    pub fn with_lists(
        cache: Arc<DnsCache>,
        disposable: DisposableDomains,
        roles: RolePrefixes,
    ) -> Self {
        Self {
            cache,
            disposable,
            roles,
        }
    }

    /// Validates syntax and risk signals only; no network I/O.
    pub async fn validate(&self, email: &str, options: &ValidationOptions) -> ValidationResult {
        self.guarded(email, options, false).await
    }

    /// Full validation including the DNS stage. The DNS stage only runs when
    /// syntax analysis produced no errors.
    pub async fn validate_with_dns(
        &self,
        email: &str,
        options: &ValidationOptions,
    ) -> ValidationResult {
        self.guarded(email, options, true).await
    }

    /// Runs the pipeline and converts any panic into a single `SYSTEM`
    /// error, so callers always receive a structured result.
    async fn guarded(
        &self,
        email: &str,
        options: &ValidationOptions,
        with_dns: bool,
    ) -> ValidationResult {
        let run = std::panic::AssertUnwindSafe(self.run(email, options, with_dns));
        match run.catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "validation pipeline fault".to_string());
                ValidationResult::system_failure(email, message)
            }
        }
    }

    async fn run(
        &self,
        email: &str,
        options: &ValidationOptions,
        with_dns: bool,
    ) -> ValidationResult {
        let normalized = normalize(email);
        let mut result = ValidationResult::empty(email, normalized.clone());

        // Stage 1: cheap rejection before any real analysis.
        if !QUICK_PATTERN.is_match(&normalized) {
            result.errors.push(ValidationIssue::new(
                "FORMAT",
                "Email address must be of the form local@domain",
            ));
            return result;
        }

        // Stage 2: structural analysis.
        let report = syntax::analyze(&normalized);
        result.errors.extend(report.errors.iter().cloned());
        result.warnings.extend(report.warnings.iter().cloned());

        let is_role_based =
            options.check_role_based && self.roles.is_role_based(&report.local_part);
        let is_disposable = options.check_disposable && self.disposable.contains(&report.domain);

        result.details.local_part = Some(LocalPartFacts {
            value: report.local_part.clone(),
            length: report.local_length,
            contains_unicode: !report.local_part.is_ascii(),
            is_quoted: report.is_quoted_local,
            is_role_based,
        });
        result.details.domain = Some(DomainFacts {
            value: report.domain.clone(),
            length: report.domain_length,
            labels: report.labels.clone(),
            is_ip_literal: report.is_ip_literal,
            is_punycode: report.is_punycode,
            is_disposable,
        });

        // Stage 3: risk-signal lists. Advisory only, never fatal.
        if is_disposable {
            result.warnings.push(ValidationIssue::new(
                "DISPOSABLE_EMAIL",
                format!("{} is a disposable email provider", report.domain),
            ));
        }
        if is_role_based {
            result.warnings.push(ValidationIssue::new(
                "ROLE_BASED_EMAIL",
                format!("'{}' is a role-based local part", report.local_part),
            ));
        }

        // Stage 4: DNS, only when requested and syntax passed.
        if with_dns && result.errors.is_empty() {
            let record = self.cache.resolve(&report.domain).await;
            self.apply_dns_stage(&mut result, &record, options);
        }

        result.is_valid = result.errors.is_empty();
        debug!(
            email = %result.normalized,
            valid = result.is_valid,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "validation finished"
        );
        result
    }

    /// DNS policy is fail-closed: a resolution failure invalidates this one
    /// validation with its specific code, and `allow_no_mx` relaxes only the
    /// missing-MX case.
    fn apply_dns_stage(
        &self,
        result: &mut ValidationResult,
        record: &DomainDnsRecord,
        options: &ValidationOptions,
    ) {
        result.details.dns = Some(DnsFacts {
            has_dns: record.has_dns,
            has_mx: record.has_mx,
            has_valid_a: record.has_valid_a,
            mx_exchanges: record.mx_hosts.iter().map(|m| m.exchange.clone()).collect(),
            provider: record.provider().map(|p| p.label().to_string()),
            cache_priority: record.priority,
        });

        if let Some(failure) = &record.failure {
            result.errors.push(failure.clone());
            return;
        }
        if !record.has_dns {
            result.errors.push(ValidationIssue::new(
                "DNS",
                format!("Domain {} has no DNS records", record.domain),
            ));
            return;
        }
        if !record.has_mx && !options.allow_no_mx {
            result.errors.push(ValidationIssue::new(
                "MX",
                format!("Domain {} publishes no MX records", record.domain),
            ));
        }
        if let Some(provider) = record.provider() {
            result.warnings.push(ValidationIssue::new(
                provider.warning_code(),
                format!("Mail for this domain is handled by {}", provider.label()),
            ));
        }
    }
}
