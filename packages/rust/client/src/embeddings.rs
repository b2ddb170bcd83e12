//! `/v1/embeddings` calls.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use defi_trainer_shared::{Result, TrainerError};

use crate::ModelClient;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f64>,
}

/// Cut `text` to at most `max_chars` characters (not bytes).
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

impl ModelClient {
    /// Embed a single text, truncated to `max_embed_chars` first.
    pub async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        let input = truncate_chars(text, self.opts.max_embed_chars);
        let request = EmbeddingRequest {
            model: &self.opts.embedding_model,
            input,
        };

        let response: EmbeddingResponse = self
            .post_json(
                &self.opts.endpoints.embeddings,
                &request,
                self.opts.embedding_timeout,
            )
            .await?;

        let first = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| TrainerError::Shape("no embedding data received".into()))?;

        if first.embedding.is_empty() {
            return Err(TrainerError::Shape("embedding vector is empty".into()));
        }

        Ok(first.embedding)
    }

    /// Embed every text in order, one request at a time.
    ///
    /// The result has one slot per input. A failed item is logged and left
    /// as `None`; it never stops the remaining items.
    #[instrument(skip_all, fields(count = texts.len()))]
    pub async fn embed_many<T: AsRef<str>>(
        &self,
        texts: &[T],
        progress: &dyn EmbedProgress,
    ) -> Vec<Option<Vec<f64>>> {
        let total = texts.len();
        let mut out = Vec::with_capacity(total);

        for (i, text) in texts.iter().enumerate() {
            let text = text.as_ref();
            let slot = match self.embed(text).await {
                Ok(vector) => {
                    info!(chars = text.chars().count(), dims = vector.len(), "generated embedding");
                    Some(vector)
                }
                Err(e @ TrainerError::Shape(_)) => {
                    warn!(index = i, error = %e, "no embedding data received");
                    None
                }
                Err(e) => {
                    warn!(index = i, error = %e, "failed to generate embedding");
                    None
                }
            };
            progress.item_done(i + 1, total, slot.is_some());
            out.push(slot);
        }

        out
    }
}

// ---------------------------------------------------------------------------
// Progress trait
// ---------------------------------------------------------------------------

/// Per-item callback while embedding a batch of texts.
pub trait EmbedProgress: Send + Sync {
    /// Called after item `current` (1-based) of `total` finished.
    fn item_done(&self, current: usize, total: usize, embedded: bool);
}

/// No-op embedding progress.
pub struct SilentEmbedProgress;

impl EmbedProgress for SilentEmbedProgress {
    fn item_done(&self, _current: usize, _total: usize, _embedded: bool) {}
}
