//! Vocabulary extraction: turn extracted PDF text into a word list.
//!
//! The heuristic strategy only accepts lines shaped exactly like a numbered
//! list entry, `<int><whitespace><letters>`. Anything else (definitions,
//! headers, multi-word entries, punctuation) is skipped. Recall is low and
//! noise is near zero, which suits the numbered word lists this service is
//! fed. The generative strategy hands the whole text to the model instead.

use crate::config::VocabularyStrategy;
use crate::error::Vocab2PostError;
use crate::pipeline::json::parse_model_json;
use crate::pipeline::llm::CompletionBackend;
use crate::prompts::vocabulary_prompt;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

static RE_NUMBERED_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\s+([A-Za-z]+)\s*$").unwrap());

/// Words from every line of the form `<int> <word>`, in document order.
pub fn heuristic_words(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| RE_NUMBERED_WORD.captures(line))
        .map(|caps| caps[1].to_string())
        .collect()
}

#[derive(Debug, Deserialize)]
struct WordsReply {
    words: Vec<String>,
}

/// Ask the model for the word list.
pub async fn generative_words(
    backend: &dyn CompletionBackend,
    text: &str,
) -> Result<Vec<String>, Vocab2PostError> {
    let reply = backend.complete(&vocabulary_prompt(text)).await?;
    let parsed: WordsReply = parse_model_json(&reply)?;
    Ok(parsed.words)
}

/// Extract the word list with the chosen strategy.
pub async fn extract_words(
    strategy: VocabularyStrategy,
    backend: &dyn CompletionBackend,
    text: &str,
) -> Result<Vec<String>, Vocab2PostError> {
    let words = match strategy {
        VocabularyStrategy::Heuristic => heuristic_words(text),
        VocabularyStrategy::Generative => generative_words(backend, text).await?,
    };
    debug!("{:?} strategy found {} words", strategy, words.len());
    Ok(words)
}
