//! Recover a JSON object from free-text model output.
//!
//! Models asked for "JSON only" still wrap it in prose or ```json fences
//! now and then. The recovery rule is deliberately simple: take everything
//! from the first `{` to the last `}` and decode that span. It works as long
//! as the surrounding prose contains no stray braces; when it does, decoding
//! fails and the caller gets [`Vocab2PostError::ResponseParse`].

use crate::error::Vocab2PostError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Decode the span between the first `{` and the last `}` of `text`.
pub fn extract_first_json_object(text: &str) -> Result<Map<String, Value>, Vocab2PostError> {
    let start = text.find('{').ok_or_else(|| Vocab2PostError::ResponseParse {
        detail: "no '{' in model output".into(),
    })?;
    let end = text.rfind('}').ok_or_else(|| Vocab2PostError::ResponseParse {
        detail: "no '}' in model output".into(),
    })?;
    if end < start {
        return Err(Vocab2PostError::ResponseParse {
            detail: "last '}' precedes first '{'".into(),
        });
    }

    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(Vocab2PostError::ResponseParse {
            detail: "braced span is not a JSON object".into(),
        }),
        Err(e) => Err(Vocab2PostError::ResponseParse {
            detail: format!("invalid JSON: {e}"),
        }),
    }
}

/// Recover the JSON object from `text` and deserialise it into `T`.
///
/// A missing or mistyped key surfaces as `ResponseParse` too.
pub fn parse_model_json<T: DeserializeOwned>(text: &str) -> Result<T, Vocab2PostError> {
    let map = extract_first_json_object(text)?;
    serde_json::from_value(Value::Object(map)).map_err(|e| Vocab2PostError::ResponseParse {
        detail: format!("unexpected shape: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Passage;

    #[test]
    fn recovers_fenced_object() {
        let reply = "Here is the result:\n```json\n{\"title\":\"A\",\"content\":\"<p>B</p>\"}\n```";
        let p: Passage = parse_model_json(reply).expect("recoverable");
        assert_eq!(p.title, "A");
        assert_eq!(p.content, "<p>B</p>");
    }

    #[test]
    fn bare_object() {
        let map = extract_first_json_object(r#"{"words":["a","b"]}"#).expect("valid");
        assert_eq!(map["words"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn nested_braces_inside_span() {
        let map = extract_first_json_object(r#"ok {"a":{"b":1}} done"#).expect("valid");
        assert_eq!(map["a"]["b"], 1);
    }

    #[test]
    fn no_brace_fails() {
        let err = extract_first_json_object("I cannot help with that.").unwrap_err();
        assert!(matches!(err, Vocab2PostError::ResponseParse { .. }));
    }

    #[test]
    fn unbalanced_braces_fail() {
        assert!(extract_first_json_object(r#"{"title": "A""#).is_err());
        assert!(extract_first_json_object("} backwards {").is_err());
    }

    #[test]
    fn stray_brace_in_prose_breaks_recovery() {
        let reply = "Use {curly} quotes: {\"title\":\"A\",\"content\":\"B\"}";
        assert!(extract_first_json_object(reply).is_err());
    }

    #[test]
    fn missing_key_is_parse_error() {
        let err = parse_model_json::<Passage>(r#"{"title":"only"}"#).unwrap_err();
        assert!(matches!(err, Vocab2PostError::ResponseParse { .. }));
        assert!(err.to_string().contains("content"), "got: {err}");
    }
}
