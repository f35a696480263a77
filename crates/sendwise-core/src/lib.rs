//! # sendwise-core
//!
//! Deterministic building blocks of the consequence analysis engine.
//!
//! This crate answers, without any network access:
//! - What does a complete assessment of a message look like?
//! - Is this model reply a valid assessment?
//! - What do we return when no valid assessment is available?
//!
//! ## Key Guarantees
//!
//! 1. **No I/O**: nothing here talks to the model; see `sendwise-runtime`
//! 2. **Strict replies**: a reply is accepted whole or rejected with a [`ParseError`]
//! 3. **Total fallback**: [`FallbackAnalyzer::build`] always returns a complete result
//!
//! ## Example
//!
//! ```rust,ignore
//! use sendwise_core::{parse_response, FallbackAnalyzer};
//!
//! let analysis = match parse_response(&raw_model_text) {
//!     Ok(analysis) => analysis,
//!     Err(_) => FallbackAnalyzer::default().build(&message),
//! };
//! println!("{}", analysis.actionable_recommendations.final_recommendation);
//! ```

pub mod analysis;
pub mod fallback;
pub mod input;
pub mod response;
pub mod types;

// Re-export main types at crate root
pub use analysis::{
    ActionableRecommendations, Backlash, ConsequenceAnalysis, Effectiveness, EmotionalImpact,
    LegalRisk, OverallAssessment, PROBABILITY_RANGE,
};
pub use fallback::{FallbackAnalyzer, InsultLexicon};
pub use input::{validate_text, InputError, MAX_TEXT_CHARS, MIN_TEXT_CHARS};
pub use response::{parse_response, ParseError, ParseStage, ResponseParser};
pub use types::{FinalRecommendation, MessageStatus, RiskLevel};
