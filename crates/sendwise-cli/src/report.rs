//! JSON envelope printed by `sendwise analyze`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use sendwise_core::{ConsequenceAnalysis, RiskLevel};
use sendwise_runtime::prompts::country_name;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport<'a> {
    pub analyzed_at: DateTime<Utc>,
    /// `model` or `fallback`
    pub branch: &'static str,
    pub context: &'a str,
    pub country: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_name: Option<&'static str>,
    pub max_risk: RiskLevel,
    pub analysis: &'a ConsequenceAnalysis,
}

impl<'a> AnalysisReport<'a> {
    pub fn new(
        branch: &'static str,
        context: &'a str,
        country: &'a str,
        analysis: &'a ConsequenceAnalysis,
    ) -> Self {
        Self {
            analyzed_at: Utc::now(),
            branch,
            context,
            country,
            country_name: country_name(country),
            max_risk: analysis.max_risk(),
            analysis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sendwise_core::FallbackAnalyzer;

    #[test]
    fn test_report_shape() {
        let analysis = FallbackAnalyzer::default().build("Eres un idiota, págame ya.");
        let report = AnalysisReport::new("fallback", "workplace", "CO", &analysis);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["branch"], "fallback");
        assert_eq!(json["countryName"], "Colombia");
        assert_eq!(json["maxRisk"], "High");
        assert_eq!(
            json["analysis"]["actionableRecommendations"]["finalRecommendation"],
            "DoNotSend"
        );
        assert!(json["analyzedAt"].is_string());
    }

    #[test]
    fn test_unknown_country_has_no_name() {
        let analysis = FallbackAnalyzer::default().build("Hola equipo, ¿cómo están?");
        let report = AnalysisReport::new("fallback", "personal", "UY", &analysis);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("countryName").is_none());
    }
}
