use crate::models::RECOMMENDATION_COUNT;
use serde_json::{json, Value};

pub const RECOMMEND: &str = include_str!("../data/prompts/recommend.txt");

const NO_TEXT_INPUT: &str = "No text provided, strictly analyze the visual/audio content.";
const MEDIA_NOTE: &str =
    "An image or short video is attached. Read its mood from what it shows and how it feels.";

/// Replace `{{key}}` placeholders in a template string.
///
/// Single pass over the template: substituted values are never rescanned,
/// so user text containing `{{...}}` is inserted verbatim. Unknown keys are
/// left as written.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let value = after
            .find("}}")
            .and_then(|end| {
                let key = &after[..end];
                vars.iter()
                    .find(|(name, _)| *name == key)
                    .map(|(_, value)| (*value, end))
            });

        match value {
            Some((value, end)) => {
                result.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                result.push_str("{{");
                rest = after;
            }
        }
    }

    result.push_str(rest);
    result
}

/// Build the instruction text sent as the last part of a recommendation request.
///
/// Empty (or whitespace-only) text tells the model to rely solely on the
/// attached media.
pub fn build_recommendation_prompt(user_text: &str, has_media: bool) -> String {
    let trimmed = user_text.trim();
    let input = if trimmed.is_empty() {
        NO_TEXT_INPUT
    } else {
        trimmed
    };
    let media_note = if has_media { MEDIA_NOTE } else { "" };
    let count = RECOMMENDATION_COUNT.to_string();

    render(
        RECOMMEND,
        &[("count", &count), ("input", input), ("media_note", media_note)],
    )
}

/// Structured-output schema passed to Gemini as `responseSchema`.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "moodAnalysis": {
                "type": "STRING",
                "description": "A creative description of the mood detected from the user's input."
            },
            "movies": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING" },
                        "year": { "type": "STRING" },
                        "genre": { "type": "STRING" },
                        "description": { "type": "STRING" },
                        "matchReason": {
                            "type": "STRING",
                            "description": "Why this movie fits the mood."
                        }
                    },
                    "required": ["title", "year", "genre", "description", "matchReason"]
                }
            }
        },
        "required": ["moodAnalysis", "movies"]
    })
}
