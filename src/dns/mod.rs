/// The resolver collaborator boundary: an async `MxResolver` trait for MX and
/// A lookups, implemented on `trust-dns-resolver` for production and mocked
/// in tests.
pub mod resolver;

/// Static mail-provider suffix table used to annotate MX exchanges with a
/// provider family (Google Workspace, Microsoft 365, ...).
pub mod providers;

/// The domain-keyed DNS result cache: priority-weighted TTLs and bounded,
/// golden-ratio-sectioned eviction.
pub mod cache;
