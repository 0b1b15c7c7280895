//! Job result types.
//!
//! A finished job yields a [`JobReport`]; every type here is `Serialize` so
//! the CLI can print it with `run --json`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The states a job moves through, in order.
///
/// `Grouping` and `VocabExtracting` are entered only by the pipeline
/// variants that use them. A job that stops early is reported as a
/// [`crate::error::JobFailure`] carrying the stage it was in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    Fetching,
    Extracting,
    VocabExtracting,
    Grouping,
    Generating,
    Publishing,
    Done,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStage::Fetching => "fetching",
            JobStage::Extracting => "extracting",
            JobStage::VocabExtracting => "vocab-extracting",
            JobStage::Grouping => "grouping",
            JobStage::Generating => "generating",
            JobStage::Publishing => "publishing",
            JobStage::Done => "done",
        };
        f.write_str(s)
    }
}

/// A generated passage: a title and an HTML fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub title: String,
    pub content: String,
}

/// One post accepted by the CMS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedPost {
    /// The word group this post was written from.
    pub words: Vec<String>,
    pub title: String,
    /// The CMS response body, passed through uninterpreted.
    pub response: serde_json::Value,
}

/// Summary numbers for one job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobStats {
    pub document_bytes: usize,
    pub text_chars: usize,
    pub word_count: usize,
    pub group_count: usize,
    pub total_duration_ms: u64,
}

/// Everything a successful job produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub url: String,
    pub words: Vec<String>,
    /// The sets passages were generated from; a single entry when
    /// grouping is off.
    pub groups: Vec<Vec<String>>,
    pub posts: Vec<PublishedPost>,
    pub stats: JobStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_display_is_lowercase() {
        assert_eq!(JobStage::VocabExtracting.to_string(), "vocab-extracting");
        assert_eq!(JobStage::Publishing.to_string(), "publishing");
    }

    #[test]
    fn passage_deserialises_from_model_shape() {
        let p: Passage =
            serde_json::from_str(r#"{"title":"A","content":"<p>B</p>"}"#).expect("valid passage");
        assert_eq!(p.title, "A");
        assert_eq!(p.content, "<p>B</p>");
    }
}
