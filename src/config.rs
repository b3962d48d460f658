use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

/// Scheduling priority for batch validation work.
///
/// Higher priorities are drained first. The discriminant order matters:
/// bucket 0 is drained before bucket 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Critical,
    High,
    Normal,
    Low,
}

impl Priority {
    /// All priorities, highest first. Matches the scheduler's bucket layout.
    pub const ALL: [Priority; 4] = [
        Priority::Critical,
        Priority::High,
        Priority::Normal,
        Priority::Low,
    ];

    /// Bucket index used by the scheduler, 0 = highest priority.
    pub fn index(self) -> usize {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Normal => 2,
            Priority::Low => 3,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

impl FromStr for Priority {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CRITICAL" => Ok(Priority::Critical),
            "HIGH" => Ok(Priority::High),
            "NORMAL" => Ok(Priority::Normal),
            "LOW" => Ok(Priority::Low),
            other => Err(SchedulerError::InvalidPriority(other.to_string())),
        }
    }
}

/// Per-validation toggles. All checks default to off; callers opt in.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ValidationOptions {
    /// Flag disposable-domain addresses with a `DISPOSABLE_EMAIL` warning.
    pub check_disposable: bool,
    /// Flag role-based local parts (admin@, support@, ...) with a warning.
    pub check_role_based: bool,
    /// Accept domains that resolve but publish no MX records.
    pub allow_no_mx: bool,
}

/// Options for a batch validation request handed to the orchestrator.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    pub validation: ValidationOptions,
    pub priority: Priority,
    /// Run the DNS stage for each email. Syntax-only batches skip it.
    pub check_dns: bool,
}

/// DNS cache sizing. The capacity is a soft bound: it is checked after each
/// insert and enforced by the golden-ratio eviction pass, not preemptively.
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    pub base_ttl: Duration,
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            base_ttl: Duration::from_secs(3600),
            capacity: 1000,
        }
    }
}

/// Batch scheduler timings.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Per-item processing deadline. A timed-out item fails alone; its
    /// siblings in the batch keep running.
    pub batch_timeout: Duration,
    /// Pause between batches, throttling pressure on downstream DNS.
    pub inter_batch_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            batch_timeout: Duration::from_secs(10),
            inter_batch_delay: Duration::from_millis(100),
        }
    }
}
