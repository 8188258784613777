//! Tolerant parsing of backend output.

use serde_json::{Map, Value};

use crate::error::{NarrationError, Result};
use crate::types::Narration;

/// Parse backend text into a [`Narration`].
///
/// Blank text reads as `{}`. If the text is not a JSON object, the region
/// from the first `{` to the last `}` is tried instead. Missing or mistyped
/// fields degrade to empty values; only a text with no parsable object is
/// an error.
pub fn parse_narration(content: &str) -> Result<Narration> {
    let content = content.trim();
    let content = if content.is_empty() { "{}" } else { content };

    let object = match parse_object(content) {
        Ok(object) => object,
        Err(strict) => match salvage_object(content) {
            Some(object) => object,
            None => return Err(strict),
        },
    };

    Ok(narration_from_object(&object))
}

fn parse_object(text: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(object) => Ok(object),
        other => Err(NarrationError::MalformedOutput(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

fn salvage_object(text: &str) -> Option<Map<String, Value>> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    parse_object(&text[start..=end]).ok()
}

fn narration_from_object(object: &Map<String, Value>) -> Narration {
    let narration = object
        .get("narration")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let choices = object
        .get("choices")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Narration { narration, choices }
}
