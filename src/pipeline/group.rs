//! Grouping: split a word list into small, related sets.
//!
//! The model decides which words belong together. Its partition is then
//! normalised so every group holds at most `max` words and the groups
//! together cover exactly the input words, whatever the model returned.
//! There is no deterministic fallback: an unreachable model or unparseable
//! reply fails the stage.

use crate::error::Vocab2PostError;
use crate::pipeline::json::parse_model_json;
use crate::pipeline::llm::CompletionBackend;
use crate::prompts::grouping_prompt;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct GroupsReply {
    groups: Vec<Vec<String>>,
}

/// Ask the model to partition `words` into groups of at most `max`.
pub async fn group_words(
    backend: &dyn CompletionBackend,
    words: &[String],
    max: usize,
) -> Result<Vec<Vec<String>>, Vocab2PostError> {
    let reply = backend.complete(&grouping_prompt(words, max)).await?;
    let parsed: GroupsReply = parse_model_json(&reply)?;
    let groups = normalise_groups(words, parsed.groups, max);
    debug!("{} words → {} groups", words.len(), groups.len());
    Ok(groups)
}

/// Repair a proposed partition of `words`.
///
/// - words absent from the input are dropped
/// - a word already placed is not placed again
/// - groups over `max` are split into consecutive chunks
/// - empty groups disappear
/// - input words the proposal missed are appended, `max` at a time
pub fn normalise_groups(
    words: &[String],
    proposed: Vec<Vec<String>>,
    max: usize,
) -> Vec<Vec<String>> {
    let max = max.max(1);
    let known: HashSet<&str> = words.iter().map(String::as_str).collect();
    let mut placed: HashSet<String> = HashSet::new();
    let mut groups = Vec::new();

    for group in proposed {
        let mut kept = Vec::with_capacity(group.len());
        for word in group {
            if !known.contains(word.as_str()) {
                warn!("Dropping word '{}' not present in the input list", word);
                continue;
            }
            if placed.insert(word.clone()) {
                kept.push(word);
            }
        }
        for chunk in kept.chunks(max) {
            groups.push(chunk.to_vec());
        }
    }

    let mut missing = Vec::new();
    for word in words {
        if placed.insert(word.clone()) {
            missing.push(word.clone());
        }
    }
    if !missing.is_empty() {
        warn!("Model left {} word(s) ungrouped; appending them", missing.len());
        for chunk in missing.chunks(max) {
            groups.push(chunk.to_vec());
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    fn words(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("w{i}")).collect()
    }

    fn as_set(groups: &[Vec<String>]) -> HashSet<String> {
        groups.iter().flatten().cloned().collect()
    }

    #[test]
    fn oversized_group_split() {
        let input = words(25);
        let groups = normalise_groups(&input, vec![input.clone()], 10);
        assert_eq!(groups.iter().map(Vec::len).collect::<Vec<_>>(), vec![10, 10, 5]);
        assert_eq!(as_set(&groups), input.into_iter().collect::<HashSet<_>>());
    }

    #[test]
    fn hallucinated_and_repeated_words_removed() {
        let input = words(3);
        let proposed = vec![
            vec!["w1".into(), "invented".into()],
            vec!["w1".into(), "w2".into()],
            vec![],
        ];
        let groups = normalise_groups(&input, proposed, 10);
        assert_eq!(groups, vec![vec!["w1"], vec!["w2"], vec!["w3"]]);
    }

    #[test]
    fn omitted_words_appended_in_bounded_groups() {
        let input = words(25);
        let groups = normalise_groups(&input, vec![vec!["w1".into()]], 10);
        assert!(groups.iter().all(|g| !g.is_empty() && g.len() <= 10));
        assert_eq!(as_set(&groups).len(), 25);
    }

    struct Canned(String);

    #[async_trait]
    impl CompletionBackend for Canned {
        async fn complete(&self, prompt: &str) -> Result<String, Vocab2PostError> {
            assert!(prompt.contains("at most 10 words"));
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn twenty_five_words_grouped_within_bound() {
        let input = words(25);
        let reply = serde_json::json!({
            "groups": [input[..12].to_vec(), input[12..20].to_vec(), input[20..].to_vec()]
        })
        .to_string();
        let groups = group_words(&Canned(format!("Here you go: {reply}")), &input, 10)
            .await
            .expect("parsable reply");
        assert!(groups.iter().all(|g| g.len() <= 10));
        assert_eq!(as_set(&groups), input.iter().cloned().collect::<HashSet<_>>());
    }

    #[tokio::test]
    async fn unparseable_reply_fails() {
        let err = group_words(&Canned("no json here".into()), &words(3), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, Vocab2PostError::ResponseParse { .. }));
    }
}
