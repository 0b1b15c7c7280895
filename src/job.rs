//! Job orchestration: one submitted URL in, one or more posts out.
//!
//! A job walks the stages in [`JobStage`] order, strictly sequentially:
//!
//! ```text
//! Fetching → Extracting → VocabExtracting → [Grouping] → (Generating → Publishing)×N → Done
//! ```
//!
//! Any stage error ends the job at once. Nothing is retried, nothing is
//! persisted, and posts that already went out for earlier groups stay
//! published. [`Pipeline::process`] is the fire-and-forget entry point: it
//! logs the outcome exactly once and never returns an error to its caller.

use crate::config::{Settings, VocabularyStrategy};
use crate::error::{JobFailure, Vocab2PostError};
use crate::output::{JobReport, JobStage, JobStats, PublishedPost};
use crate::pipeline::extract::{PdfiumExtractor, TextExtractor};
use crate::pipeline::fetch::{DocumentFetcher, HttpFetcher};
use crate::pipeline::llm::{backend_from_settings, CompletionBackend};
use crate::pipeline::publish::{Publisher, WordPressPublisher};
use crate::pipeline::{group, passage, vocab};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, Instrument};

/// How a job ended.
#[derive(Debug)]
pub enum JobOutcome {
    Done(JobReport),
    Failed(JobFailure),
}

impl JobOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, JobOutcome::Done(_))
    }
}

/// The collaborators and settings one job runs with.
///
/// Cheap to share: hold it in an `Arc` and run any number of jobs on it.
/// Jobs share no mutable state.
pub struct Pipeline {
    fetcher: Arc<dyn DocumentFetcher>,
    extractor: Arc<dyn TextExtractor>,
    backend: Arc<dyn CompletionBackend>,
    publisher: Arc<dyn Publisher>,
    strategy: VocabularyStrategy,
    group_words: bool,
    max_group_size: usize,
}

/// What the stages before generation produced.
struct Harvest {
    document_bytes: usize,
    text_chars: usize,
    words: Vec<String>,
}

impl Pipeline {
    /// A pipeline over explicit collaborators: heuristic vocabulary, no grouping.
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        extractor: Arc<dyn TextExtractor>,
        backend: Arc<dyn CompletionBackend>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            backend,
            publisher,
            strategy: VocabularyStrategy::Heuristic,
            group_words: false,
            max_group_size: 10,
        }
    }

    /// The production pipeline: HTTP fetcher, pdfium extractor, configured
    /// generative backend and the WordPress publisher.
    pub fn from_settings(settings: &Settings) -> Result<Self, Vocab2PostError> {
        let backend = backend_from_settings(settings)?;
        Ok(Self::new(
            Arc::new(HttpFetcher::from_settings(settings)),
            Arc::new(PdfiumExtractor),
            backend,
            Arc::new(WordPressPublisher::from_settings(settings)),
        )
        .with_strategy(settings.vocabulary_strategy)
        .with_grouping(settings.group_words, settings.max_group_size))
    }

    pub fn with_strategy(mut self, strategy: VocabularyStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Enable or disable the grouping stage; `max_group_size` is clamped to ≥ 1.
    pub fn with_grouping(mut self, enabled: bool, max_group_size: usize) -> Self {
        self.group_words = enabled;
        self.max_group_size = max_group_size.max(1);
        self
    }

    /// Run one job and log its outcome. Never fails.
    pub async fn process(&self, url: &str) -> JobOutcome {
        let span = info_span!("job", url = %url);
        async {
            match self.run(url).await {
                Ok(report) => {
                    info!(
                        posts = report.posts.len(),
                        duration_ms = report.stats.total_duration_ms,
                        "Successfully processed: {}",
                        url
                    );
                    JobOutcome::Done(report)
                }
                Err(failure) => {
                    error!(
                        stage = %failure.stage,
                        published = failure.published,
                        error_kind = failure.source.kind(),
                        "Failed to process {}: {}",
                        url,
                        failure.source
                    );
                    JobOutcome::Failed(failure)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Run one job, returning the report or the stage that failed.
    pub async fn run(&self, url: &str) -> Result<JobReport, JobFailure> {
        let start = Instant::now();
        let harvest = self.harvest(url).await?;
        if harvest.words.is_empty() {
            return Err(fail(url, JobStage::VocabExtracting, 0)(Vocab2PostError::NoVocabulary));
        }

        let groups = if self.group_words {
            debug!("→ {}", JobStage::Grouping);
            group::group_words(&*self.backend, &harvest.words, self.max_group_size)
                .await
                .map_err(fail(url, JobStage::Grouping, 0))?
        } else {
            vec![harvest.words.clone()]
        };
        info!(
            "{} words in {} group(s)",
            harvest.words.len(),
            groups.len()
        );

        let mut posts: Vec<PublishedPost> = Vec::with_capacity(groups.len());
        for (idx, words) in groups.iter().enumerate() {
            debug!("→ {} (group {}/{})", JobStage::Generating, idx + 1, groups.len());
            let passage = passage::generate_passage(&*self.backend, words)
                .await
                .map_err(fail(url, JobStage::Generating, posts.len()))?;

            debug!("→ {} '{}'", JobStage::Publishing, passage.title);
            let response = self
                .publisher
                .publish(&passage)
                .await
                .map_err(fail(url, JobStage::Publishing, posts.len()))?;

            posts.push(PublishedPost {
                words: words.clone(),
                title: passage.title,
                response,
            });
        }

        let stats = JobStats {
            document_bytes: harvest.document_bytes,
            text_chars: harvest.text_chars,
            word_count: harvest.words.len(),
            group_count: groups.len(),
            total_duration_ms: start.elapsed().as_millis() as u64,
        };
        debug!("→ {}", JobStage::Done);

        Ok(JobReport {
            url: url.to_string(),
            words: harvest.words,
            groups,
            posts,
            stats,
        })
    }

    /// Fetch, extract and derive the word list without generating anything.
    pub async fn vocabulary(&self, url: &str) -> Result<Vec<String>, JobFailure> {
        Ok(self.harvest(url).await?.words)
    }

    async fn harvest(&self, url: &str) -> Result<Harvest, JobFailure> {
        debug!("→ {}", JobStage::Fetching);
        let document = self
            .fetcher
            .fetch(url)
            .await
            .map_err(fail(url, JobStage::Fetching, 0))?;

        debug!("→ {}", JobStage::Extracting);
        let text = self
            .extractor
            .extract_text(&document)
            .await
            .map_err(fail(url, JobStage::Extracting, 0))?;
        debug!("Extracted {} chars of text", text.len());

        debug!("→ {}", JobStage::VocabExtracting);
        let words = vocab::extract_words(self.strategy, &*self.backend, &text)
            .await
            .map_err(fail(url, JobStage::VocabExtracting, 0))?;

        Ok(Harvest {
            document_bytes: document.len(),
            text_chars: text.chars().count(),
            words,
        })
    }
}

/// Wrap a stage error with where it happened.
fn fail(url: &str, stage: JobStage, published: usize) -> impl FnOnce(Vocab2PostError) -> JobFailure {
    let url = url.to_string();
    move |source| JobFailure {
        url,
        stage,
        published,
        source,
    }
}
