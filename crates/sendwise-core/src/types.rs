//! Risk taxonomy shared by every sub-analysis.
//!
//! Variant names are the exact strings the model is asked to emit, so serde
//! matches them case-sensitively in both directions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a risk dimension.
///
/// Variants are declared from least to most severe; the derived `Ord`
/// follows that order so callers can compare or take the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// All levels in ascending severity.
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall state of the message as judged by the actionable summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageStatus {
    Optimal,
    NeedsImprovement,
    Critical,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Optimal => "Optimal",
            MessageStatus::NeedsImprovement => "NeedsImprovement",
            MessageStatus::Critical => "Critical",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the sender should do with the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FinalRecommendation {
    Send,
    SendWithCaution,
    Revise,
    DoNotSend,
}

impl FinalRecommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinalRecommendation::Send => "Send",
            FinalRecommendation::SendWithCaution => "SendWithCaution",
            FinalRecommendation::Revise => "Revise",
            FinalRecommendation::DoNotSend => "DoNotSend",
        }
    }

    /// True for the two outcomes that let the message go out.
    pub fn allows_sending(&self) -> bool {
        matches!(
            self,
            FinalRecommendation::Send | FinalRecommendation::SendWithCaution
        )
    }
}

impl fmt::Display for FinalRecommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
