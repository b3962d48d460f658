/// Pure syntax analysis of an email address.
///
/// `analyze` decomposes the address into local part, domain and labels,
/// records character-class and length facts, and collects structural
/// errors/warnings in rule order. No I/O, never blocks.
pub mod syntax;

/// Static disposable-domain list with suffix matching.
pub mod disposable;

/// Static role-based local-part list (admin, support, noreply, ...).
pub mod role_based;

/// The multi-stage email validator: regex pre-check, normalization, syntax
/// analysis, list checks and the optional DNS stage, composed into one
/// structured `ValidationResult`.
pub mod validator;
