//! The consequence analysis aggregate.
//!
//! A [`ConsequenceAnalysis`] is built once per request, either entirely from
//! a validated model reply or entirely by the fallback analyzer, and is never
//! mutated afterwards. Field names serialize in camelCase, which is also the
//! shape the model is asked to produce.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::types::{FinalRecommendation, MessageStatus, RiskLevel};

/// Accepted range for [`Effectiveness::probability_of_action`].
///
/// Values outside the range are rejected by the reply schema instead of being
/// clamped, so drift in the model output shows up as a fallback.
pub const PROBABILITY_RANGE: RangeInclusive<u8> = 0..=100;

/// Full multi-dimensional assessment of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsequenceAnalysis {
    pub legal_risk: LegalRisk,
    pub emotional_impact: EmotionalImpact,
    pub effectiveness: Effectiveness,
    pub backlash: Backlash,
    pub overall: OverallAssessment,
    pub actionable_recommendations: ActionableRecommendations,
}

impl ConsequenceAnalysis {
    /// Highest severity across the three leveled risk dimensions.
    pub fn max_risk(&self) -> RiskLevel {
        self.legal_risk
            .level
            .max(self.emotional_impact.level)
            .max(self.backlash.level)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalRisk {
    pub level: RiskLevel,
    #[serde(deserialize_with = "de::nullable_string")]
    pub description: String,
    #[serde(deserialize_with = "de::string_list")]
    pub potential_issues: Vec<String>,
    #[serde(deserialize_with = "de::string_list")]
    pub legal_references: Vec<String>,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub practical_reality: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionalImpact {
    pub level: RiskLevel,
    #[serde(deserialize_with = "de::nullable_string")]
    pub description: String,
    /// Free-form tone label, usually Neutral, Confrontational or Constructive.
    #[serde(deserialize_with = "de::nullable_string")]
    pub detected_tone: String,
    #[serde(deserialize_with = "de::string_list")]
    pub trigger_words: Vec<String>,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub cultural_context: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effectiveness {
    /// Estimated chance (percent) that the recipient acts on the message.
    pub probability_of_action: u8,
    #[serde(deserialize_with = "de::nullable_string")]
    pub reasoning: String,
    #[serde(deserialize_with = "de::string_list")]
    pub missing_elements: Vec<String>,
    #[serde(deserialize_with = "de::string_list")]
    pub strength_points: Vec<String>,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub local_recommendations: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backlash {
    pub level: RiskLevel,
    #[serde(deserialize_with = "de::string_list")]
    pub potential_consequences: Vec<String>,
    #[serde(deserialize_with = "de::nullable_string")]
    pub mitigation_advice: String,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub local_protections: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallAssessment {
    pub recommend_sending: bool,
    #[serde(deserialize_with = "de::nullable_string")]
    pub summary: String,
    /// Usually three entries, not enforced.
    #[serde(deserialize_with = "de::string_list")]
    pub top_priorities: Vec<String>,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub next_steps: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionableRecommendations {
    pub message_status: MessageStatus,
    #[serde(deserialize_with = "de::nullable_string")]
    pub executive_summary: String,
    #[serde(default, deserialize_with = "de::string_list")]
    pub can_improve: Vec<String>,
    #[serde(default, deserialize_with = "de::string_list")]
    pub must_improve: Vec<String>,
    #[serde(default, deserialize_with = "de::string_list")]
    pub strengths_to_keep: Vec<String>,
    pub final_recommendation: FinalRecommendation,
}

impl ActionableRecommendations {
    /// Placeholder used when a reply predates the actionable block.
    pub fn unavailable() -> Self {
        Self {
            message_status: MessageStatus::NeedsImprovement,
            executive_summary: "Recommendation analysis unavailable".to_string(),
            can_improve: Vec::new(),
            must_improve: Vec::new(),
            strengths_to_keep: Vec::new(),
            final_recommendation: FinalRecommendation::Revise,
        }
    }
}

mod de {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// `null` reads as an empty string.
    pub fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
    }

    /// Keeps non-empty string elements; anything else in the array is skipped.
    pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let items = Vec::<Value>::deserialize(deserializer)?;
        Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.is_empty() => Some(s),
                _ => None,
            })
            .collect())
    }
}
