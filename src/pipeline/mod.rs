//! Pipeline stages for turning a vocabulary PDF into a published post.
//!
//! Each submodule implements exactly one step, and each external
//! collaborator sits behind a trait so the orchestrator in [`crate::job`]
//! can be run against stubs.
//!
//! ## Data Flow
//!
//! ```text
//! fetch ──▶ extract ──▶ vocab ──▶ [group] ──▶ passage ──▶ publish
//! (HTTP)    (pdfium)    (regex     (LLM)       (LLM)       (WordPress)
//!                        or LLM)
//! ```
//!
//! 1. [`fetch`]   download the document bytes ([`fetch::DocumentFetcher`])
//! 2. [`extract`] page-by-page text via pdfium ([`extract::TextExtractor`])
//! 3. [`vocab`]   numbered-line heuristic or model-picked word list
//! 4. [`group`]   optional partition into related sets of bounded size
//! 5. [`passage`] titled HTML passage per word set
//! 6. [`publish`] create the post ([`publish::Publisher`])
//!
//! [`llm`] holds the generative-service seam ([`llm::CompletionBackend`]) and
//! [`json`] the one parser every model reply goes through.

pub mod extract;
pub mod fetch;
pub mod group;
pub mod json;
pub mod llm;
pub mod passage;
pub mod publish;
pub mod vocab;
