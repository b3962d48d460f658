use std::collections::HashSet;

/// Domains operated by throwaway-inbox providers. A static starter set; the
/// full list is expected to be supplied at construction by the embedding
/// service.
const BUILTIN_DOMAINS: &[&str] = &[
    "0-00.usa.cc",
    "10minutemail.com",
    "dispostable.com",
    "fakeinbox.com",
    "getnada.com",
    "guerrillamail.com",
    "mailinator.com",
    "maildrop.cc",
    "mintemail.com",
    "sharklasers.com",
    "temp-mail.org",
    "tempmail.dev",
    "throwawaymail.com",
    "trashmail.com",
    "yopmail.com",
];

/// Read-only membership check for disposable email domains.
#[derive(Debug, Clone)]
pub struct DisposableDomains {
    domains: HashSet<String>,
}

impl Default for DisposableDomains {
    fn default() -> Self {
        Self::with_domains(BUILTIN_DOMAINS.iter().copied())
    }
}

impl DisposableDomains {
    pub fn with_domains<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            domains: domains
                .into_iter()
                .map(|d| d.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// True when `domain` or any parent domain is a known disposable
    /// provider, so `m.mailinator.com` matches the `mailinator.com` entry.
    pub fn contains(&self, domain: &str) -> bool {
        let domain = domain.to_lowercase();
        if self.domains.contains(&domain) {
            return true;
        }
        domain
            .char_indices()
            .filter(|&(_, c)| c == '.')
            .any(|(i, _)| self.domains.contains(&domain[i + 1..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_domains_match() {
        let list = DisposableDomains::default();
        assert!(list.contains("mailinator.com"));
        assert!(list.contains("MAILINATOR.COM"));
        assert!(!list.contains("gmail.com"));
    }

    #[test]
    fn subdomains_match_by_suffix() {
        let list = DisposableDomains::default();
        assert!(list.contains("m.mailinator.com"));
        assert!(!list.contains("notmailinator.com"));
    }

    #[test]
    fn custom_list_replaces_builtin() {
        let list = DisposableDomains::with_domains(["burner.example"]);
        assert!(list.contains("burner.example"));
        assert!(!list.contains("mailinator.com"));
    }
}
