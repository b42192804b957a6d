//! Red-team flag severity and categorization.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity tier of a detected safety issue, ordered least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Where a flagged piece of content originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagSource {
    Input,
    Output,
    Synthesis,
}

/// A single safety-scanner finding. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedTeamFlag {
    pub flag_id: Uuid,
    pub severity: Severity,
    pub categories: Vec<String>,
    pub explanation: String,
    pub source: FlagSource,
    pub content: String,
}

/// Most severe tier present in a set of flags, if any.
pub fn highest_severity(flags: &[RedTeamFlag]) -> Option<Severity> {
    flags.iter().map(|f| f.severity).max()
}

/// Whether any flag in the set should block the mission outright.
pub fn should_block(flags: &[RedTeamFlag]) -> bool {
    flags
        .iter()
        .any(|f| matches!(f.severity, Severity::High | Severity::Critical))
}
