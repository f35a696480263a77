//! JSON Schema validation for model replies.
//!
//! The schema file is the one place that declares which reply fields are
//! structural (required), which are enrichment (optional), the accepted
//! enumeration values and the probability bounds.

use std::sync::OnceLock;

/// Embedded reply schema (loaded at compile time).
pub const REPLY_SCHEMA_JSON: &str =
    include_str!("../../../../schema/consequence-analysis.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

fn get_validator() -> Result<&'static jsonschema::Validator, String> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = serde_json::from_str(REPLY_SCHEMA_JSON)
            .map_err(|e| format!("Invalid schema JSON: {}", e))?;

        jsonschema::options()
            .build(&schema_value)
            .map_err(|e| format!("Failed to compile schema: {}", e))
    });

    result.as_ref().map_err(Clone::clone)
}

/// Outcome of validating a reply document against the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaCheck {
    Valid,
    Invalid(Vec<String>),
    Unavailable(String),
}

/// Validate a parsed reply, collecting every violation.
pub fn validate_reply(reply: &serde_json::Value) -> SchemaCheck {
    let validator = match get_validator() {
        Ok(v) => v,
        Err(e) => return SchemaCheck::Unavailable(e),
    };

    let errors: Vec<String> = validator
        .iter_errors(reply)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        SchemaCheck::Valid
    } else {
        SchemaCheck::Invalid(errors)
    }
}
