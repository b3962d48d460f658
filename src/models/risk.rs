use serde::{Deserialize, Serialize};

use crate::models::email::ValidationResult;

/// Coarse risk rating derived from the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=24 => RiskLevel::Low,
            25..=59 => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }
}

/// Weight applied for an error with the given code.
fn error_weight(code: &str) -> u32 {
    match code {
        // Structural failures: the address cannot receive mail at all.
        "FORMAT" | "SYNTAX" | "CONSECUTIVE_DOTS" | "DOMAIN_PARTS" | "LABEL_LENGTH" => 40,
        "LENGTH" | "LOCAL_LENGTH" | "DOMAIN_LENGTH" | "MIN_LENGTH" => 40,
        "DNS" | "DOMAIN_NOT_FOUND" | "DNS_TIMEOUT" | "DNS_ERROR" => 40,
        "MX" => 30,
        "SYSTEM" => 50,
        _ => 20,
    }
}

/// Weight applied for a warning with the given code.
fn warning_weight(code: &str) -> u32 {
    match code {
        "DISPOSABLE_EMAIL" => 15,
        "IP_DOMAIN" => 10,
        "ROLE_BASED_EMAIL" | "UNICODE_LOCAL" | "UNICODE_DOMAIN" | "QUOTED_LOCAL" => 5,
        // Provider-family notes (GOOGLE_WORKSPACE etc.) carry no risk.
        _ => 0,
    }
}

/// Risk score in [0, 100]; higher is riskier. Errors dominate, warnings add
/// smaller increments, and the total is capped at 100.
pub fn risk_score(result: &ValidationResult) -> u8 {
    let mut score: u32 = 0;
    for error in &result.errors {
        score += error_weight(&error.code);
    }
    for warning in &result.warnings {
        score += warning_weight(&warning.code);
    }
    score.min(100) as u8
}
