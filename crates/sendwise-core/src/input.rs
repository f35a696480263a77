//! Caller input contract for analysis requests.

use thiserror::Error;

/// Minimum message length, in characters.
pub const MIN_TEXT_CHARS: usize = 10;

/// Maximum message length, in characters.
pub const MAX_TEXT_CHARS: usize = 5000;

/// The caller violated the text-length contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("text must not be empty")]
    Empty,

    #[error("text is too short to analyze: {chars} characters (minimum {min})")]
    TooShort { chars: usize, min: usize },

    #[error("text exceeds the maximum length: {chars} characters (maximum {max})")]
    TooLong { chars: usize, max: usize },
}

impl InputError {
    /// Name of the violated bound, for logs and client error payloads.
    pub fn bound(&self) -> &'static str {
        match self {
            InputError::Empty => "non_empty",
            InputError::TooShort { .. } => "min_length",
            InputError::TooLong { .. } => "max_length",
        }
    }
}

/// Check a message against the length contract.
///
/// Whitespace-only text counts as empty. Length is measured in Unicode
/// scalar values, not bytes.
pub fn validate_text(text: &str) -> Result<(), InputError> {
    if text.trim().is_empty() {
        return Err(InputError::Empty);
    }

    let chars = text.chars().count();
    if chars < MIN_TEXT_CHARS {
        return Err(InputError::TooShort {
            chars,
            min: MIN_TEXT_CHARS,
        });
    }
    if chars > MAX_TEXT_CHARS {
        return Err(InputError::TooLong {
            chars,
            max: MAX_TEXT_CHARS,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_and_blank() {
        assert_eq!(validate_text(""), Err(InputError::Empty));
        assert_eq!(validate_text("   \n\t "), Err(InputError::Empty));
    }

    #[test]
    fn test_boundaries() {
        assert!(matches!(
            validate_text("123456789"),
            Err(InputError::TooShort { chars: 9, min: 10 })
        ));
        assert!(validate_text("1234567890").is_ok());
        assert!(validate_text(&"a".repeat(MAX_TEXT_CHARS)).is_ok());
        assert!(matches!(
            validate_text(&"a".repeat(MAX_TEXT_CHARS + 1)),
            Err(InputError::TooLong { chars: 5001, max: 5000 })
        ));
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // 10 characters, 20 bytes
        let text = "ññññññññññ";
        assert_eq!(text.len(), 20);
        assert!(validate_text(text).is_ok());
    }

    #[test]
    fn test_bound_names() {
        assert_eq!(InputError::Empty.bound(), "non_empty");
        assert_eq!(
            InputError::TooShort { chars: 1, min: 10 }.bound(),
            "min_length"
        );
        assert_eq!(
            InputError::TooLong { chars: 9000, max: 5000 }.bound(),
            "max_length"
        );
    }

    proptest! {
        #[test]
        fn prop_valid_lengths_accepted(text in "[a-zA-Z][a-zA-Z ]{9,300}") {
            prop_assert!(validate_text(&text).is_ok());
        }

        #[test]
        fn prop_short_text_rejected(text in "[a-z]{1,9}") {
            let is_too_short = matches!(validate_text(&text), Err(InputError::TooShort { .. }));
            prop_assert!(is_too_short);
        }
    }
}
