use serde::{Deserialize, Serialize};

use crate::models::risk::{self, RiskLevel};

/// A single diagnostic produced during validation.
///
/// Errors make the result invalid; warnings are advisory and never change
/// validity on their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Structural facts about the local part, recorded by the validator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalPartFacts {
    pub value: String,
    pub length: usize,
    pub contains_unicode: bool,
    pub is_quoted: bool,
    pub is_role_based: bool,
}

/// Structural facts about the domain part.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainFacts {
    pub value: String,
    pub length: usize,
    pub labels: Vec<String>,
    pub is_ip_literal: bool,
    pub is_punycode: bool,
    pub is_disposable: bool,
}

/// DNS facts copied out of the cache record for this domain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsFacts {
    pub has_dns: bool,
    pub has_mx: bool,
    pub has_valid_a: bool,
    pub mx_exchanges: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    pub cache_priority: u8,
}

/// Per-check details, keyed `localPart` / `domain` / `dns` on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_part: Option<LocalPartFacts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<DomainFacts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns: Option<DnsFacts>,
}

/// Outcome of validating one email address.
///
/// Immutable once handed to the caller; the validator keeps no reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub email: String,
    pub normalized: String,
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub details: ValidationDetails,
}

impl ValidationResult {
    pub(crate) fn empty(email: &str, normalized: String) -> Self {
        Self {
            email: email.to_string(),
            normalized,
            is_valid: false,
            errors: Vec::new(),
            warnings: Vec::new(),
            details: ValidationDetails::default(),
        }
    }

    /// Result for an email the pipeline could not process at all. Used when
    /// an internal fault is caught at the validator boundary or a batch item
    /// times out.
    pub fn system_failure(email: &str, message: impl Into<String>) -> Self {
        let mut result = Self::empty(email, email.trim().to_lowercase());
        result
            .errors
            .push(ValidationIssue::new("SYSTEM", message.into()));
        result
    }

    /// True when `errors` contains the given code.
    pub fn has_error(&self, code: &str) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    /// True when `warnings` contains the given code.
    pub fn has_warning(&self, code: &str) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }
}

/// Single-validation API shape: the result plus derived risk fields.
#[derive(Debug, Clone, Serialize)]
pub struct ApiValidationResponse {
    #[serde(flatten)]
    pub result: ValidationResult,
    pub score: u8,
    pub risk_level: RiskLevel,
}

impl From<ValidationResult> for ApiValidationResponse {
    fn from(result: ValidationResult) -> Self {
        let score = risk::risk_score(&result);
        Self {
            score,
            risk_level: RiskLevel::from_score(score),
            result,
        }
    }
}

/// Aggregate counts for a batch response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    /// Items that failed for system reasons (timeout, internal fault) rather
    /// than failing a validation check.
    pub errors: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[ValidationResult]) -> Self {
        Self {
            total: results.len(),
            valid: results.iter().filter(|r| r.is_valid).count(),
            invalid: results.iter().filter(|r| !r.is_valid).count(),
            errors: results.iter().filter(|r| r.has_error("SYSTEM")).count(),
        }
    }
}

/// Batch API shape: one result per input email, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchValidationResponse {
    pub results: Vec<ValidationResult>,
    pub summary: BatchSummary,
}
