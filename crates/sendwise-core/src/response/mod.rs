//! Model reply parsing and validation.
//!
//! # Core Principle
//! A reply is either fully valid or rejected. The parser never guesses a
//! missing level or coerces an unknown enumeration value; recovery happens in
//! exactly one place, the caller's fallback path.
//!
//! # Stages
//! 1. Extract: strip a code fence, slice from the first `{` to the last `}`
//! 2. Syntax: parse the slice as JSON
//! 3. Schema: required blocks and fields, enum values, probability bounds
//! 4. Materialize: typed structs, list fields keep string elements only

mod extract;
mod schema;

pub use extract::{extract_json_object, strip_code_fence};
pub use schema::{validate_reply, SchemaCheck, REPLY_SCHEMA_JSON};

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

use crate::analysis::{
    ActionableRecommendations, Backlash, ConsequenceAnalysis, Effectiveness, EmotionalImpact,
    LegalRisk, OverallAssessment,
};

/// Pipeline stage at which a reply was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    Extract,
    Syntax,
    Schema,
    Materialize,
}

impl fmt::Display for ParseStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseStage::Extract => write!(f, "extract"),
            ParseStage::Syntax => write!(f, "syntax"),
            ParseStage::Schema => write!(f, "schema"),
            ParseStage::Materialize => write!(f, "materialize"),
        }
    }
}

/// The model reply could not be validated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("reply contains no JSON object")]
    NoJsonObject,

    #[error("reply is not valid JSON: {0}")]
    Syntax(String),

    #[error("reply violates the analysis schema: {}", .0.join("; "))]
    Schema(Vec<String>),

    #[error("reply schema unavailable: {0}")]
    SchemaUnavailable(String),

    #[error("reply could not be materialized: {0}")]
    Materialize(String),
}

impl ParseError {
    pub fn stage(&self) -> ParseStage {
        match self {
            ParseError::NoJsonObject => ParseStage::Extract,
            ParseError::Syntax(_) => ParseStage::Syntax,
            ParseError::Schema(_) | ParseError::SchemaUnavailable(_) => ParseStage::Schema,
            ParseError::Materialize(_) => ParseStage::Materialize,
        }
    }
}

/// Top-level reply shape. `actionable_recommendations` is optional so that
/// replies to older prompt versions still parse.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelReply {
    legal_risk: LegalRisk,
    emotional_impact: EmotionalImpact,
    effectiveness: Effectiveness,
    backlash: Backlash,
    overall: OverallAssessment,
    actionable_recommendations: Option<ActionableRecommendations>,
}

impl From<ModelReply> for ConsequenceAnalysis {
    fn from(reply: ModelReply) -> Self {
        Self {
            legal_risk: reply.legal_risk,
            emotional_impact: reply.emotional_impact,
            effectiveness: reply.effectiveness,
            backlash: reply.backlash,
            overall: reply.overall,
            actionable_recommendations: reply
                .actionable_recommendations
                .unwrap_or_else(ActionableRecommendations::unavailable),
        }
    }
}

/// Parses raw model text into a [`ConsequenceAnalysis`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseParser;

impl ResponseParser {
    pub fn new() -> Self {
        Self
    }

    /// Run every stage over `raw`, returning the first failure.
    pub fn parse(&self, raw: &str) -> Result<ConsequenceAnalysis, ParseError> {
        tracing::debug!(raw_len = raw.len(), "Parsing model reply");

        let slice = extract_json_object(raw).ok_or(ParseError::NoJsonObject)?;

        let document: serde_json::Value =
            serde_json::from_str(slice).map_err(|e| ParseError::Syntax(e.to_string()))?;

        match validate_reply(&document) {
            SchemaCheck::Valid => {}
            SchemaCheck::Invalid(errors) => return Err(ParseError::Schema(errors)),
            SchemaCheck::Unavailable(e) => return Err(ParseError::SchemaUnavailable(e)),
        }

        let reply: ModelReply = serde_json::from_value(document)
            .map_err(|e| ParseError::Materialize(e.to_string()))?;

        if reply.actionable_recommendations.is_none() {
            tracing::debug!("Reply has no actionable block, using placeholder");
        }
        if reply.overall.top_priorities.len() != 3 {
            tracing::debug!(
                count = reply.overall.top_priorities.len(),
                "Reply top priorities differ from the requested three"
            );
        }

        Ok(reply.into())
    }
}

/// Convenience wrapper around [`ResponseParser::parse`].
pub fn parse_response(raw: &str) -> Result<ConsequenceAnalysis, ParseError> {
    ResponseParser::new().parse(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FinalRecommendation, MessageStatus, RiskLevel};
    use proptest::prelude::*;

    const FIXTURE: &str = include_str!("../../../../fixtures/model_reply.json");

    fn fixture_value() -> serde_json::Value {
        serde_json::from_str(FIXTURE).unwrap()
    }

    #[test]
    fn test_parse_valid_reply() {
        let analysis = parse_response(FIXTURE).unwrap();

        assert_eq!(analysis.legal_risk.level, RiskLevel::Low);
        assert_eq!(analysis.legal_risk.legal_references.len(), 1);
        assert_eq!(analysis.emotional_impact.detected_tone, "Constructive");
        assert_eq!(analysis.effectiveness.probability_of_action, 65);
        assert_eq!(analysis.overall.top_priorities.len(), 3);
        assert!(analysis.overall.recommend_sending);
        assert_eq!(
            analysis.actionable_recommendations.final_recommendation,
            FinalRecommendation::SendWithCaution
        );
        assert_eq!(
            analysis.actionable_recommendations.message_status,
            MessageStatus::NeedsImprovement
        );
    }

    #[test]
    fn test_fenced_reply_equals_bare_reply() {
        let bare = parse_response(FIXTURE).unwrap();
        let fenced = format!("\n\n  ```json\n{}\n```\n  ", FIXTURE);
        assert_eq!(parse_response(&fenced).unwrap(), bare);

        let plain_fence = format!("```\n{}\n```", FIXTURE);
        assert_eq!(parse_response(&plain_fence).unwrap(), bare);
    }

    #[test]
    fn test_reply_with_prose() {
        let raw = format!("Sure! Here is the JSON:\n{}\nHope this helps.", FIXTURE);
        assert_eq!(parse_response(&raw).unwrap(), parse_response(FIXTURE).unwrap());
    }

    #[test]
    fn test_missing_actionable_block_uses_placeholder() {
        let mut reply = fixture_value();
        reply.as_object_mut().unwrap().remove("actionableRecommendations");

        let analysis = parse_response(&reply.to_string()).unwrap();
        assert_eq!(
            analysis.actionable_recommendations,
            ActionableRecommendations::unavailable()
        );
    }

    #[test]
    fn test_malformed_actionable_block_fails() {
        let mut reply = fixture_value();
        reply["actionableRecommendations"]
            .as_object_mut()
            .unwrap()
            .remove("finalRecommendation");

        let err = parse_response(&reply.to_string()).unwrap_err();
        assert_eq!(err.stage(), ParseStage::Schema);
    }

    #[test]
    fn test_probability_out_of_range_fails() {
        let mut reply = fixture_value();
        reply["effectiveness"]["probabilityOfAction"] = serde_json::json!(150);

        let err = parse_response(&reply.to_string()).unwrap_err();
        assert!(matches!(err, ParseError::Schema(_)));
    }

    #[test]
    fn test_fractional_probability_fails() {
        let mut reply = fixture_value();
        reply["effectiveness"]["probabilityOfAction"] = serde_json::json!(42.5);

        assert!(parse_response(&reply.to_string()).is_err());
    }

    #[test]
    fn test_unknown_level_fails_instead_of_defaulting() {
        let mut reply = fixture_value();
        reply["backlash"]["level"] = serde_json::json!("medium");

        let err = parse_response(&reply.to_string()).unwrap_err();
        assert_eq!(err.stage(), ParseStage::Schema);
    }

    #[test]
    fn test_missing_required_field_fails() {
        let mut reply = fixture_value();
        reply["emotionalImpact"]
            .as_object_mut()
            .unwrap()
            .remove("detectedTone");

        assert!(matches!(
            parse_response(&reply.to_string()),
            Err(ParseError::Schema(_))
        ));
    }

    #[test]
    fn test_optional_fields_default_to_empty() {
        let mut reply = fixture_value();
        reply["legalRisk"].as_object_mut().unwrap().remove("practicalReality");
        reply["overall"].as_object_mut().unwrap().remove("nextSteps");
        reply["actionableRecommendations"]
            .as_object_mut()
            .unwrap()
            .remove("canImprove");

        let analysis = parse_response(&reply.to_string()).unwrap();
        assert_eq!(analysis.legal_risk.practical_reality, "");
        assert_eq!(analysis.overall.next_steps, "");
        assert!(analysis.actionable_recommendations.can_improve.is_empty());
    }

    #[test]
    fn test_non_string_list_elements_skipped() {
        let mut reply = fixture_value();
        reply["emotionalImpact"]["triggerWords"] = serde_json::json!(["idiota", 7, true, null]);

        let analysis = parse_response(&reply.to_string()).unwrap();
        assert_eq!(analysis.emotional_impact.trigger_words, vec!["idiota"]);
    }

    #[test]
    fn test_syntax_error() {
        let err = parse_response("{\"legalRisk\": {\"level\": }").unwrap_err();
        assert_eq!(err.stage(), ParseStage::Syntax);
    }

    #[test]
    fn test_no_json() {
        let err = parse_response("The analysis service is overloaded.").unwrap_err();
        assert_eq!(err, ParseError::NoJsonObject);
        assert_eq!(err.stage(), ParseStage::Extract);
    }

    #[test]
    fn test_schema_error_lists_all_violations() {
        let mut reply = fixture_value();
        reply.as_object_mut().unwrap().remove("overall");
        reply["legalRisk"]["level"] = serde_json::json!("Unknown");

        match parse_response(&reply.to_string()) {
            Err(ParseError::Schema(errors)) => assert!(errors.len() >= 2),
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    proptest! {
        #[test]
        fn prop_parser_never_panics(raw in ".{0,400}") {
            let _ = parse_response(&raw);
        }

        #[test]
        fn prop_any_in_range_probability_accepted(p in 0u8..=100) {
            let mut reply = fixture_value();
            reply["effectiveness"]["probabilityOfAction"] = serde_json::json!(p);
            let analysis = parse_response(&reply.to_string()).unwrap();
            prop_assert_eq!(analysis.effectiveness.probability_of_action, p);
        }
    }
}
