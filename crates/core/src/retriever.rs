//! Context Retrieval
//!
//! Resolves a driving query into ranked passages. Retrieval is deliberately
//! infallible from the caller's point of view: when the embedding model or the
//! index fails, or the lookup times out, the retriever logs the degradation and
//! returns an empty list so the dialogue proceeds on fallback context.

use crate::{embedding::Embedder, index::VectorIndex, passage::ScoredPassage};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Number of candidates fetched per query, ahead of selection.
pub const DEFAULT_TOP_K: usize = 5;

/// Default upper bound on a single embed-and-query round trip.
pub const DEFAULT_RETRIEVAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Returns passages relevant to a query, ordered by descending score.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContextRetriever: Send + Sync {
    /// Retrieves at most `top_k` passages for `query`.
    ///
    /// Never fails: any underlying error yields an empty list.
    async fn retrieve(&self, query: &str, top_k: usize) -> Vec<ScoredPassage>;
}

/// A `ContextRetriever` that embeds the query and searches a vector index.
pub struct SemanticRetriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    timeout: Duration,
}

impl SemanticRetriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            embedder,
            index,
            timeout: DEFAULT_RETRIEVAL_TIMEOUT,
        }
    }

    /// Sets the timeout after which retrieval falls back to an empty result.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<ScoredPassage>> {
        let vector = self.embedder.embed(query).await?;
        let mut passages = self.index.query(&vector, top_k).await?;
        // Stable: equal scores keep the index's own order.
        passages.sort_by(|a, b| b.score.total_cmp(&a.score));
        passages.truncate(top_k);
        Ok(passages)
    }
}

#[async_trait]
impl ContextRetriever for SemanticRetriever {
    #[instrument(skip(self, query), fields(query_len = query.len()))]
    async fn retrieve(&self, query: &str, top_k: usize) -> Vec<ScoredPassage> {
        match tokio::time::timeout(self.timeout, self.search(query, top_k)).await {
            Ok(Ok(passages)) => {
                debug!(count = passages.len(), "Retrieved passages");
                passages
            }
            Ok(Err(e)) => {
                warn!(error = ?e, "Retrieval degraded, continuing with fallback context");
                Vec::new()
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Retrieval timed out, continuing with fallback context"
                );
                Vec::new()
            }
        }
    }
}
