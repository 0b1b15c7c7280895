//! Passage generation: one titled HTML passage per word set.
//!
//! Title and content are passed through exactly as the model wrote them;
//! nothing here checks length or sanitises the HTML.

use crate::error::Vocab2PostError;
use crate::output::Passage;
use crate::pipeline::json::parse_model_json;
use crate::pipeline::llm::CompletionBackend;
use crate::prompts::passage_prompt;
use tracing::debug;

/// Generate a passage using every word in `words`.
pub async fn generate_passage(
    backend: &dyn CompletionBackend,
    words: &[String],
) -> Result<Passage, Vocab2PostError> {
    let reply = backend.complete(&passage_prompt(words)).await?;
    let passage: Passage = parse_model_json(&reply)?;
    debug!(
        "Passage '{}' ({} chars of HTML) for {} words",
        passage.title,
        passage.content.len(),
        words.len()
    );
    Ok(passage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Recording {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CompletionBackend for Recording {
        async fn complete(&self, prompt: &str) -> Result<String, Vocab2PostError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    #[tokio::test]
    async fn words_sent_comma_separated_and_reply_passed_through() {
        let backend = Recording {
            reply: r#"{"title":"The Journalist's Diet","content":"<p>...</p>"}"#.into(),
            prompts: Mutex::new(Vec::new()),
        };
        let words = vec!["journalism".to_string(), "nutrition".to_string()];
        let passage = generate_passage(&backend, &words).await.expect("valid reply");

        assert_eq!(passage.title, "The Journalist's Diet");
        assert_eq!(passage.content, "<p>...</p>");
        let prompts = backend.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].ends_with("journalism, nutrition"));
    }

    #[tokio::test]
    async fn backend_error_propagates() {
        struct Down;
        #[async_trait]
        impl CompletionBackend for Down {
            async fn complete(&self, _prompt: &str) -> Result<String, Vocab2PostError> {
                Err(Vocab2PostError::GenerationTimeout { secs: 120 })
            }
        }
        let err = generate_passage(&Down, &["a".to_string()]).await.unwrap_err();
        assert!(matches!(err, Vocab2PostError::GenerationTimeout { secs: 120 }));
    }
}
