//! Recovered problems found while parsing markup.
//!
//! Nothing here is fatal: parsing and layout always produce a best-effort
//! result, and these warnings describe what was repaired or ignored along
//! the way.

use serde::Serialize;
use thiserror::Error;

/// A recoverable problem in the input markup.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Tags were unterminated, mis-nested or left open; the parser closed
    /// or dropped them.
    #[error("Malformed markup at byte {offset}: {message}")]
    MalformedMarkup { offset: usize, message: String },

    /// A recognized attribute or CSS declaration carried a value that could
    /// not be interpreted; it was ignored.
    #[error("Unsupported value '{value}' for '{attribute}'")]
    UnsupportedAttributeValue { attribute: String, value: String },

    /// An image `width`/`height` was not a number; the default box is used.
    #[error("Invalid image {attribute} '{value}', falling back to default size")]
    ImageDimensionInvalid { attribute: String, value: String },
}

impl Warning {
    pub fn malformed(offset: usize, message: impl Into<String>) -> Self {
        Self::MalformedMarkup {
            offset,
            message: message.into(),
        }
    }

    pub fn unsupported(attribute: &str, value: &str) -> Self {
        Self::UnsupportedAttributeValue {
            attribute: attribute.to_string(),
            value: value.to_string(),
        }
    }

    pub fn image_dimension(attribute: &str, value: &str) -> Self {
        Self::ImageDimensionInvalid {
            attribute: attribute.to_string(),
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_messages_name_the_problem() {
        let w = Warning::malformed(12, "unclosed <b>");
        assert_eq!(w.to_string(), "Malformed markup at byte 12: unclosed <b>");

        let w = Warning::unsupported("color", "bogus");
        assert!(w.to_string().contains("'bogus'"));

        let w = Warning::image_dimension("width", "abc");
        assert!(w.to_string().contains("default size"));
    }

    #[test]
    fn test_warning_serializes_with_kind_tag() {
        let w = Warning::image_dimension("height", "tall");
        let json = serde_json::to_string(&w).unwrap();
        assert!(json.contains(r#""kind":"image_dimension_invalid""#));
        assert!(json.contains(r#""value":"tall""#));
    }
}
