//! JSON recovery from LLM output.
//!
//! Providers are asked for pure JSON but routinely wrap it in markdown
//! fences or prose anyway. Extraction runs a fixed fallback chain:
//! direct parse, then fenced-block extraction, then bracket scan.

use regex_lite::Regex;
use serde_json::Value;
use thiserror::Error;

/// Failure to recover a JSON payload from a completion.
#[derive(Debug, Error)]
pub enum AssistantParseError {
    #[error("response did not contain a JSON payload")]
    NoJsonFound,

    #[error("response JSON was malformed: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("response JSON failed validation: {0}")]
    Validation(String),
}

/// Extract a JSON value from free-form completion text.
pub fn extract_json(content: &str) -> Result<Value, AssistantParseError> {
    let trimmed = content.trim();

    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    // regex_lite's dot does not span lines, so the fence body is sliced
    // out manually after locating the opening marker.
    if let Ok(fence) = Regex::new(r"```(?:json)?") {
        if let Some(open) = fence.find(trimmed) {
            let rest = &trimmed[open.end()..];
            if let Some(close) = rest.find("```") {
                let body = rest[..close].trim();
                if !body.is_empty() {
                    return serde_json::from_str(body).map_err(Into::into);
                }
            }
        }
    }

    // Last resort: widest bracket span, array first since the task list
    // payload is an array.
    for (open, close) in [('[', ']'), ('{', '}')] {
        if let (Some(start), Some(end)) = (trimmed.find(open), trimmed.rfind(close)) {
            if start < end {
                return serde_json::from_str(&trimmed[start..=end]).map_err(Into::into);
            }
        }
    }

    Err(AssistantParseError::NoJsonFound)
}

/// Extract and deserialize into a typed payload. A payload of the wrong
/// shape (missing field, invalid enum value) is a validation failure,
/// never silently dropped.
pub fn extract_payload<T: serde::de::DeserializeOwned>(
    content: &str,
) -> Result<T, AssistantParseError> {
    let value = extract_json(content)?;
    serde_json::from_value(value)
        .map_err(|e| AssistantParseError::Validation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_json() {
        let value = extract_json(r#"[{"title":"a"}]"#).unwrap();
        assert!(value.is_array());
    }

    #[test]
    fn parses_fenced_json() {
        let content = "Here you go:\n```json\n[{\"title\":\"a\"}]\n```\nDone.";
        let value = extract_json(content).unwrap();
        assert_eq!(value[0]["title"], "a");
    }

    #[test]
    fn parses_fence_without_language_tag() {
        let content = "```\n{\"assigneeName\":\"Jane\"}\n```";
        let value = extract_json(content).unwrap();
        assert_eq!(value["assigneeName"], "Jane");
    }

    #[test]
    fn falls_back_to_bracket_scan() {
        let content = "Sure! The tasks are [{\"title\":\"a\"},{\"title\":\"b\"}] as requested.";
        let value = extract_json(content).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn rejects_prose_without_json() {
        assert!(matches!(
            extract_json("I could not produce tasks for that."),
            Err(AssistantParseError::NoJsonFound)
        ));
    }

    #[test]
    fn malformed_fenced_json_is_an_error() {
        let content = "```json\n[{\"title\": }]\n```";
        assert!(matches!(
            extract_json(content),
            Err(AssistantParseError::MalformedJson(_))
        ));
    }

    #[test]
    fn typed_extraction_rejects_wrong_shape() {
        #[derive(Debug, serde::Deserialize)]
        struct Payload {
            #[allow(dead_code)]
            name: String,
        }

        let err = extract_payload::<Payload>(r#"{"other": 1}"#).unwrap_err();
        assert!(matches!(err, AssistantParseError::Validation(_)));
    }
}
