//! Prompts sent to the generative-text service.
//!
//! Every prompt lives here so wording changes touch one file and tests can
//! inspect the exact text without a live model. Each prompt asks for a
//! single JSON object; replies are recovered with
//! [`crate::pipeline::json::extract_first_json_object`].

/// Ask the model to pick vocabulary words out of raw PDF text.
pub const VOCABULARY_PROMPT: &str = r#"The following text was extracted from a PDF containing a vocabulary list.
Identify the vocabulary words it lists. Ignore headers, footers, page numbers,
definitions and any other surrounding text.

You MUST respond with valid JSON only, no other text:
{"words": ["word1", "word2"]}

Text:
"#;

/// Ask the model to partition a word list into coherent groups.
///
/// The placeholder `{max}` is replaced with the group-size bound.
pub const GROUPING_PROMPT: &str = r#"Partition the following vocabulary words into groups of at most {max} words.
Each group should be related closely enough that all of its words can appear
naturally in one short story. Use every word exactly once and do not add words.

You MUST respond with valid JSON only, no other text:
{"groups": [["word1", "word2"], ["word3"]]}

Words:
"#;

/// Ask the model for a titled HTML passage using the given vocabulary.
pub const PASSAGE_PROMPT: &str = r#"Based on the following vocabulary content, generate a creative passage.
You MUST respond with valid JSON only, no other text:
{"title": "your creative title", "content": "<p>your HTML content here</p>"}

Vocabulary:
"#;

/// Build the vocabulary-extraction prompt for `text`.
pub fn vocabulary_prompt(text: &str) -> String {
    format!("{VOCABULARY_PROMPT}{text}")
}

/// Build the grouping prompt for `words` with groups of at most `max`.
pub fn grouping_prompt(words: &[String], max: usize) -> String {
    format!(
        "{}{}",
        GROUPING_PROMPT.replace("{max}", &max.to_string()),
        words.join(", ")
    )
}

/// Build the passage prompt for a word set (joined with `", "`).
pub fn passage_prompt(words: &[String]) -> String {
    format!("{PASSAGE_PROMPT}{}", words.join(", "))
}
