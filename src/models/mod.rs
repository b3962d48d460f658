/// Validation result and API-shape types: `ValidationResult` with its ordered
/// error/warning lists and structured per-check details, plus the response
/// shapes an HTTP layer serializes (`ApiValidationResponse`,
/// `BatchValidationResponse`).
pub mod email;

/// Risk scoring derived from a finished `ValidationResult`: a 0-100 score
/// (higher is riskier) and a coarse `low`/`medium`/`high` level.
pub mod risk;
