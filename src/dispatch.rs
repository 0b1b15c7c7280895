//! Job dispatch: how the webhook hands a URL to the pipeline.
//!
//! The server only ever calls [`JobDispatcher::dispatch`]. In production that
//! spawns the job on the Tokio runtime and returns at once, keeping no
//! handle; the caller never learns the outcome. Tests swap in
//! [`InlineDispatcher`], which runs the job to completion before returning,
//! so assertions see the finished pipeline.

use crate::job::Pipeline;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Accepts a submitted URL for processing.
#[async_trait]
pub trait JobDispatcher: Send + Sync {
    async fn dispatch(&self, url: String);
}

/// Fire-and-forget: each job becomes an independent Tokio task.
#[derive(Clone)]
pub struct SpawnDispatcher {
    pipeline: Arc<Pipeline>,
}

impl SpawnDispatcher {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl JobDispatcher for SpawnDispatcher {
    async fn dispatch(&self, url: String) {
        let pipeline = Arc::clone(&self.pipeline);
        debug!("Spawning job for {}", url);
        tokio::spawn(async move {
            pipeline.process(&url).await;
        });
    }
}

/// Runs the job on the caller's task and returns when it is finished.
#[derive(Clone)]
pub struct InlineDispatcher {
    pipeline: Arc<Pipeline>,
}

impl InlineDispatcher {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl JobDispatcher for InlineDispatcher {
    async fn dispatch(&self, url: String) {
        self.pipeline.process(&url).await;
    }
}
