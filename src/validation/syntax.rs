use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::models::email::ValidationIssue;

/// Structural facts and diagnostics for one email address.
///
/// Produced by [`analyze`]; the validator copies these facts into the
/// `details` section of its result.
#[derive(Debug, Clone, Default)]
pub struct SyntaxReport {
    pub local_part: String,
    pub domain: String,
    pub labels: Vec<String>,
    pub is_ip_literal: bool,
    pub is_punycode: bool,
    pub contains_unicode: bool,
    pub is_quoted_local: bool,
    pub email_length: usize,
    pub local_length: usize,
    pub domain_length: usize,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl SyntaxReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, code: &str, message: impl Into<String>) {
        self.errors.push(ValidationIssue::new(code, message));
    }

    fn warning(&mut self, code: &str, message: impl Into<String>) {
        self.warnings.push(ValidationIssue::new(code, message));
    }
}

/// Analyzes the structure of an email address without performing any I/O.
///
/// A missing `@` is fatal and produces a single `FORMAT` error. Every other
/// rule appends its error or warning and analysis continues, so one call
/// reports all structural problems at once.
pub fn analyze(email: &str) -> SyntaxReport {
    let mut report = SyntaxReport {
        email_length: email.len(),
        ..Default::default()
    };

    let Some((local, domain)) = email.rsplit_once('@') else {
        report.error("FORMAT", "Email address must contain an '@' symbol");
        return report;
    };

    report.local_part = local.to_string();
    report.domain = domain.to_string();
    report.local_length = local.len();
    report.domain_length = domain.len();

    check_lengths(&mut report);
    check_local_part(&mut report);
    check_domain(&mut report);

    // Full-pattern pass last, so structural errors above read first.
    if !matches_address_pattern(local, domain) {
        report.error("SYNTAX", "Email address does not match the RFC 5322 pattern");
    }

    report
}

fn check_lengths(report: &mut SyntaxReport) {
    if report.email_length > 254 {
        report.error("LENGTH", "Email address exceeds 254 characters");
    }
    if report.local_length > 64 {
        report.error("LOCAL_LENGTH", "Local part exceeds 64 characters");
    }
    if report.domain_length > 255 {
        report.error("DOMAIN_LENGTH", "Domain exceeds 255 characters");
    }
    if report.email_length < 3 {
        report.error("MIN_LENGTH", "Email address is shorter than 3 characters");
    }
}

fn check_local_part(report: &mut SyntaxReport) {
    let local = report.local_part.clone();

    if !local.is_ascii() {
        report.contains_unicode = true;
        report.warning("UNICODE_LOCAL", "Local part contains non-ASCII characters");
    }
    if local.contains("..") {
        report.error("CONSECUTIVE_DOTS", "Local part contains consecutive dots");
    }
    if local.len() >= 2 && local.starts_with('"') && local.ends_with('"') {
        report.is_quoted_local = true;
        report.warning("QUOTED_LOCAL", "Local part is a quoted string");
    }
}

fn check_domain(report: &mut SyntaxReport) {
    let domain = report.domain.clone();

    if is_ip_literal(&domain) {
        report.is_ip_literal = true;
        report.warning("IP_DOMAIN", "Domain is an IP address literal");
        return;
    }

    let labels: Vec<String> = domain.split('.').map(str::to_string).collect();
    report.is_punycode = labels.iter().any(|l| l.starts_with("xn--"));

    if !domain.is_ascii() {
        report.contains_unicode = true;
        if !report.is_punycode {
            report.warning(
                "UNICODE_DOMAIN",
                "Domain contains non-ASCII characters without punycode encoding",
            );
        }
    }

    if labels.len() < 2 {
        report.error("DOMAIN_PARTS", "Domain must contain at least two labels");
    }
    if labels.iter().any(|l| l.len() > 63) {
        report.error("LABEL_LENGTH", "A domain label exceeds 63 characters");
    }

    report.labels = labels;
}

/// Bracketed (`[192.0.2.1]`, `[IPv6:...]`) or bare dotted-quad IP domains.
fn is_ip_literal(domain: &str) -> bool {
    if let Some(inner) = domain.strip_prefix('[').and_then(|d| d.strip_suffix(']')) {
        return inner.parse::<IpAddr>().is_ok()
            || inner
                .strip_prefix("IPv6:")
                .is_some_and(|ip| ip.parse::<Ipv6Addr>().is_ok());
    }
    domain.parse::<Ipv4Addr>().is_ok()
}

/// RFC-5322-approximating full match for `local@domain`.
///
/// Dot-atom and quoted-string local parts, hyphen-constrained alphanumeric
/// domain labels, IP-literal domains. Internationalized addresses pass here
/// and are flagged by the unicode warnings instead.
fn matches_address_pattern(local: &str, domain: &str) -> bool {
    let local_ok = if local.starts_with('"') && local.ends_with('"') && local.len() >= 2 {
        is_valid_quoted_string(local)
    } else {
        is_valid_dot_atom(local, false)
    };
    let domain_ok = is_ip_literal(domain) || is_valid_dot_atom(domain, true);
    local_ok && domain_ok
}

/// Validates quoted-string format from RFC 5322 section 3.4.1.
fn is_valid_quoted_string(quoted: &str) -> bool {
    let content = &quoted[1..quoted.len() - 1];
    let mut escape = false;

    for c in content.chars() {
        if escape {
            if !matches!(c, '\\' | '"') {
                return false;
            }
            escape = false;
        } else if c == '\\' {
            escape = true;
        } else if c == '"' {
            return false; // Unescaped quote
        }
    }
    !escape // Ensure no dangling escape
}

/// Validates dot-atom format from RFC 5322 section 3.4.1.
///
/// * `is_domain` - Enforces stricter rules for domain labels
fn is_valid_dot_atom(s: &str, is_domain: bool) -> bool {
    let parts: Vec<&str> = s.split('.').collect();
    if parts.is_empty() || parts.iter().any(|&p| p.is_empty()) {
        return false;
    }

    parts.iter().all(|part| {
        part.chars().all(|c| match c {
            '-' => !is_domain || (!part.starts_with('-') && !part.ends_with('-')),
            c if is_domain => c.is_alphanumeric() || c == '-',
            _ => c.is_alphanumeric() || "!#$%&'*+/=?^_`{|}~".contains(c),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_codes(report: &SyntaxReport) -> Vec<&str> {
        report.errors.iter().map(|e| e.code.as_str()).collect()
    }

    fn warning_codes(report: &SyntaxReport) -> Vec<&str> {
        report.warnings.iter().map(|w| w.code.as_str()).collect()
    }

    #[test]
    fn valid_standard_emails() {
        for email in [
            "simple@example.com",
            "very.common@example.com",
            "x@example.com",
            "user.name+tag@example.com",
        ] {
            let report = analyze(email);
            assert!(report.is_valid(), "{email}: {:?}", report.errors);
            assert!(report.warnings.is_empty(), "{email}");
        }
    }

    #[test]
    fn decomposition_facts() {
        let report = analyze("user.name@mail.example.com");
        assert_eq!(report.local_part, "user.name");
        assert_eq!(report.domain, "mail.example.com");
        assert_eq!(report.labels, vec!["mail", "example", "com"]);
        assert_eq!(report.local_length, 9);
        assert_eq!(report.domain_length, 16);
    }

    #[test]
    fn missing_at_is_fatal_format_error() {
        let report = analyze("not-an-email");
        assert_eq!(error_codes(&report), vec!["FORMAT"]);
        // No other rule runs after the fatal check.
        assert!(report.warnings.is_empty());
        assert!(report.local_part.is_empty());
    }

    #[test]
    fn length_errors() {
        let long_local = "a".repeat(65);
        let report = analyze(&format!("{long_local}@example.com"));
        assert!(error_codes(&report).contains(&"LOCAL_LENGTH"));

        let long_domain = format!("{}.com", "b".repeat(260));
        let report = analyze(&format!("user@{long_domain}"));
        assert!(error_codes(&report).contains(&"DOMAIN_LENGTH"));
        assert!(error_codes(&report).contains(&"LENGTH"));

        let report = analyze("a@b");
        assert!(!error_codes(&report).contains(&"MIN_LENGTH"));
        let report = analyze("@b");
        assert!(error_codes(&report).contains(&"MIN_LENGTH"));
    }

    #[test]
    fn max_length_email_is_accepted() {
        let local = "a".repeat(64);
        let label = "b".repeat(63);
        let domain = format!("{label}.{label}.{}", "c".repeat(61));
        let email = format!("{local}@{domain}");
        assert_eq!(email.len(), 254);
        assert!(analyze(&email).is_valid());
    }

    #[test]
    fn consecutive_dots_error_and_syntax_failure() {
        let report = analyze("no..dots@example.com");
        assert!(error_codes(&report).contains(&"CONSECUTIVE_DOTS"));
        assert!(error_codes(&report).contains(&"SYNTAX"));
    }

    #[test]
    fn quoted_local_is_warned_not_rejected() {
        let report = analyze("\"with space\"@example.com");
        assert!(report.is_valid(), "{:?}", report.errors);
        assert!(report.is_quoted_local);
        assert_eq!(warning_codes(&report), vec!["QUOTED_LOCAL"]);
    }

    #[test]
    fn ip_literal_domains_warn() {
        for email in ["user@[192.168.0.1]", "user@[IPv6:2001:db8::1]", "user@192.168.0.1"] {
            let report = analyze(email);
            assert!(report.is_ip_literal, "{email}");
            assert!(warning_codes(&report).contains(&"IP_DOMAIN"), "{email}");
            assert!(report.is_valid(), "{email}: {:?}", report.errors);
        }
    }

    #[test]
    fn unicode_local_and_domain_warnings() {
        let report = analyze("Pelé@example.com");
        assert!(report.contains_unicode);
        assert!(warning_codes(&report).contains(&"UNICODE_LOCAL"));

        let report = analyze("user@exämple.com");
        assert!(warning_codes(&report).contains(&"UNICODE_DOMAIN"));

        // Punycode-encoded domains are ASCII and flagged as such.
        let report = analyze("user@xn--bcher-kva.example");
        assert!(report.is_punycode);
        assert!(!warning_codes(&report).contains(&"UNICODE_DOMAIN"));
    }

    #[test]
    fn single_label_domain_is_rejected() {
        let report = analyze("user@localhost");
        assert!(error_codes(&report).contains(&"DOMAIN_PARTS"));
    }

    #[test]
    fn oversized_label_is_rejected() {
        let label = "a".repeat(64);
        let report = analyze(&format!("user@{label}.com"));
        assert!(error_codes(&report).contains(&"LABEL_LENGTH"));
    }

    #[test]
    fn pattern_failures() {
        for email in [
            ".leading@example.com",
            "trailing.@example.com",
            "spaces unquoted@example.com",
            "user@-hyphenstart.com",
            "user@hyphenend-.com",
            "user@double..dot.com",
            "user@_invalidchar.com",
            "\"unclosed@example.com",
        ] {
            let report = analyze(email);
            assert!(
                error_codes(&report).contains(&"SYNTAX"),
                "{email}: {:?}",
                report.errors
            );
        }
    }

    #[test]
    fn multiple_errors_are_collected_in_rule_order() {
        let long_local = format!("{}..x", "a".repeat(65));
        let report = analyze(&format!("{long_local}@localhost"));
        let codes = error_codes(&report);
        let local_len = codes.iter().position(|c| *c == "LOCAL_LENGTH").unwrap();
        let dots = codes.iter().position(|c| *c == "CONSECUTIVE_DOTS").unwrap();
        let parts = codes.iter().position(|c| *c == "DOMAIN_PARTS").unwrap();
        let syntax = codes.iter().position(|c| *c == "SYNTAX").unwrap();
        assert!(local_len < dots && dots < parts && parts < syntax);
    }
}
