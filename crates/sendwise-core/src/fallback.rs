//! Rule-based fallback analysis.
//!
//! Used whenever the model call or the reply parser fails. It never fails,
//! needs no network and always produces a conservative result that tells the
//! sender to wait and retry rather than send.
//!
//! | Dimension | Result |
//! |-----------|--------|
//! | Legal, backlash | Medium |
//! | Emotional impact | High / "Confrontational" if an insult token is present, else Medium / "Neutral" |
//! | Probability of action | 30 |
//! | Recommendation | DoNotSend, status Critical, recommend_sending = false |

use crate::analysis::{
    ActionableRecommendations, Backlash, ConsequenceAnalysis, Effectiveness, EmotionalImpact,
    LegalRisk, OverallAssessment,
};
use crate::types::{FinalRecommendation, MessageStatus, RiskLevel};

/// Probability reported when no model estimate is available.
pub const FALLBACK_PROBABILITY_OF_ACTION: u8 = 30;

/// Version label of the built-in lexicon.
pub const DEFAULT_LEXICON_VERSION: &str = "es-default-1";

/// Built-in insult tokens (lowercase).
pub const DEFAULT_INSULT_TOKENS: &[&str] = &["imbécil", "idiota"];

const UNAVAILABLE: &str = "Full analysis is temporarily unavailable. Please retry in a few minutes.";

/// Ordered set of lowercase insult tokens with a version label.
///
/// Tokens are lowercased on insertion, blank tokens are dropped and
/// duplicates keep their first position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsultLexicon {
    version: String,
    tokens: Vec<String>,
}

impl InsultLexicon {
    pub fn new<I, S>(version: impl Into<String>, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lexicon = Self {
            version: version.into(),
            tokens: Vec::new(),
        };
        for token in tokens {
            lexicon.insert(token.as_ref());
        }
        lexicon
    }

    /// Add a token; returns false if it was blank or already present.
    pub fn insert(&mut self, token: &str) -> bool {
        let token = token.trim().to_lowercase();
        if token.is_empty() || self.tokens.contains(&token) {
            return false;
        }
        self.tokens.push(token);
        true
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens found in `text`, case-insensitive substring match, lexicon order.
    pub fn matches<'a>(&'a self, text: &str) -> Vec<&'a str> {
        let lowered = text.to_lowercase();
        self.tokens
            .iter()
            .filter(|token| lowered.contains(token.as_str()))
            .map(String::as_str)
            .collect()
    }

    pub fn contains_insult(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.tokens.iter().any(|token| lowered.contains(token.as_str()))
    }
}

impl Default for InsultLexicon {
    fn default() -> Self {
        Self::new(DEFAULT_LEXICON_VERSION, DEFAULT_INSULT_TOKENS.iter().copied())
    }
}

/// Deterministic substitute for the model-backed analysis.
#[derive(Debug, Clone, Default)]
pub struct FallbackAnalyzer {
    lexicon: InsultLexicon,
}

impl FallbackAnalyzer {
    pub fn new(lexicon: InsultLexicon) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &InsultLexicon {
        &self.lexicon
    }

    /// Build the conservative analysis for `text`.
    pub fn build(&self, text: &str) -> ConsequenceAnalysis {
        let has_insults = self.lexicon.contains_insult(text);

        let (emotional_level, tone) = if has_insults {
            (RiskLevel::High, "Confrontational")
        } else {
            (RiskLevel::Medium, "Neutral")
        };

        ConsequenceAnalysis {
            legal_risk: LegalRisk {
                level: RiskLevel::Medium,
                description: "Basic analysis only; AI analysis is temporarily unavailable."
                    .to_string(),
                potential_issues: vec!["Detailed analysis unavailable".to_string()],
                legal_references: vec!["Consult an employment lawyer".to_string()],
                practical_reality: "Retry the analysis in a few minutes.".to_string(),
            },
            emotional_impact: EmotionalImpact {
                level: emotional_level,
                description: "Basic tone check only; full analysis unavailable.".to_string(),
                detected_tone: tone.to_string(),
                trigger_words: Vec::new(),
                cultural_context: "Unavailable".to_string(),
            },
            effectiveness: Effectiveness {
                probability_of_action: FALLBACK_PROBABILITY_OF_ACTION,
                reasoning: "Rough estimate; full analysis unavailable.".to_string(),
                missing_elements: vec!["Analysis unavailable".to_string()],
                strength_points: Vec::new(),
                local_recommendations: "Check the applicable labor regulations before sending."
                    .to_string(),
            },
            backlash: Backlash {
                level: RiskLevel::Medium,
                potential_consequences: vec!["Analysis unavailable".to_string()],
                mitigation_advice: "Consult a legal expert before sending.".to_string(),
                local_protections: "Ministerio del Trabajo (Colombia): 018000 112518".to_string(),
            },
            overall: OverallAssessment {
                recommend_sending: false,
                summary: UNAVAILABLE.to_string(),
                top_priorities: vec![
                    "Retry the analysis".to_string(),
                    "Consult a legal expert".to_string(),
                    "Document your evidence".to_string(),
                ],
                next_steps: "Wait a few minutes and request the analysis again.".to_string(),
            },
            actionable_recommendations: ActionableRecommendations {
                message_status: MessageStatus::Critical,
                executive_summary: "The AI analysis could not be completed. Retry in a few \
                                    minutes to get precise recommendations."
                    .to_string(),
                can_improve: Vec::new(),
                must_improve: vec!["Get a complete AI analysis before sending".to_string()],
                strengths_to_keep: Vec::new(),
                final_recommendation: FinalRecommendation::DoNotSend,
            },
        }
    }
}
