use std::collections::HashSet;

/// Local parts that address a function rather than a person.
const BUILTIN_PREFIXES: &[&str] = &[
    "abuse",
    "admin",
    "administrator",
    "billing",
    "contact",
    "help",
    "hostmaster",
    "hr",
    "info",
    "marketing",
    "no-reply",
    "noreply",
    "office",
    "postmaster",
    "root",
    "sales",
    "security",
    "support",
    "team",
    "webmaster",
];

/// Read-only membership check for role-based local parts.
#[derive(Debug, Clone)]
pub struct RolePrefixes {
    prefixes: HashSet<String>,
}

impl Default for RolePrefixes {
    fn default() -> Self {
        Self::with_prefixes(BUILTIN_PREFIXES.iter().copied())
    }
}

impl RolePrefixes {
    pub fn with_prefixes<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// True for role-based local parts. Plus-tags are stripped first, so
    /// `support+tickets` still matches `support`.
    pub fn is_role_based(&self, local_part: &str) -> bool {
        let local = local_part.to_lowercase();
        let base = local.split('+').next().unwrap_or(&local);
        self.prefixes.contains(base)
    }
}
