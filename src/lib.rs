//! # vocab2post
//!
//! Turn a vocabulary-list PDF into a short generated reading passage and
//! publish it to WordPress.
//!
//! A webhook receives a PDF URL and answers immediately; the job then runs
//! in the background:
//!
//! ```text
//! URL
//!  │
//!  ├─ 1. Fetch     download the PDF (60 s timeout, browser User-Agent)
//!  ├─ 2. Extract   page-by-page text via pdfium, joined with newlines
//!  ├─ 3. Vocab     "<n> <word>" lines, or ask the model for the words
//!  ├─ 4. Group     optional: related sets of at most 10 words
//!  ├─ 5. Generate  one titled HTML passage per set
//!  └─ 6. Publish   POST to wp/v2/posts as a published post
//! ```
//!
//! A failed job is logged once and dropped: no retries, no persistence.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vocab2post::{Pipeline, Settings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::builder()
//!         .wp_url("https://blog.example.com/wp-json/wp/v2/posts")
//!         .wp_user("editor")
//!         .wp_app_password("abcd efgh ijkl mnop")
//!         .ai_api_key(std::env::var("AI_API_KEY")?)
//!         .build()?;
//!     let pipeline = Pipeline::from_settings(&settings)?;
//!     let report = pipeline.run("https://example.com/list.pdf").await?;
//!     println!("published {} post(s)", report.posts.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature   | Default | Description |
//! |-----------|---------|-------------|
//! | `cli`     | on      | Enables the `vocab2post` binary (clap + anyhow + dotenvy + tracing-subscriber) |
//! | `bundled` | off     | Embed the pdfium shared library at build time |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod dispatch;
pub mod error;
pub mod job;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{Settings, SettingsBuilder, VocabularyStrategy};
pub use dispatch::{InlineDispatcher, JobDispatcher, SpawnDispatcher};
pub use error::{JobFailure, Vocab2PostError};
pub use job::{JobOutcome, Pipeline};
pub use output::{JobReport, JobStage, JobStats, Passage, PublishedPost};
pub use pipeline::extract::{PdfiumExtractor, TextExtractor};
pub use pipeline::fetch::{DocumentFetcher, HttpFetcher};
pub use pipeline::json::extract_first_json_object;
pub use pipeline::llm::{CompletionBackend, MessagesBackend, ProviderBackend};
pub use pipeline::publish::{Publisher, WordPressPublisher};
pub use server::build_router;
