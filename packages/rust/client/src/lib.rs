//! HTTP client for a local OpenAI-compatible model server (LM Studio style).
//!
//! Two endpoints are used: `/v1/embeddings` for context vectors and
//! `/v1/chat/completions` for the post-run smoke test. Every call is a single
//! attempt; failures come back as typed [`TrainerError`] variants
//! (`Transport`, `HttpStatus`, `Decode`, `Shape`) and the caller decides
//! whether to continue.

mod chat;
mod embeddings;

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use defi_trainer_shared::{Endpoints, Result, TrainerConfig, TrainerError};

pub use chat::{ChatMessage, ChatOptions};
pub use embeddings::{EmbedProgress, SilentEmbedProgress, truncate_chars};

/// User-Agent string for model server requests.
const USER_AGENT: &str = concat!("defi-trainer/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Client options
// ---------------------------------------------------------------------------

/// Settings fixed for the lifetime of a [`ModelClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Resolved endpoint URLs.
    pub endpoints: Endpoints,
    /// Model identifier for embedding requests.
    pub embedding_model: String,
    /// Model identifier for chat-completion requests.
    pub chat_model: String,
    /// Timeout for a single embedding request.
    pub embedding_timeout: Duration,
    /// Timeout for a single chat-completion request.
    pub chat_timeout: Duration,
    /// Texts are cut to this many characters before embedding.
    pub max_embed_chars: usize,
}

impl ClientOptions {
    /// Derive client options from the application config.
    pub fn from_config(config: &TrainerConfig) -> Result<Self> {
        Ok(Self {
            endpoints: config.endpoints()?,
            embedding_model: config.server.embedding_model.clone(),
            chat_model: config.server.chat_model.clone(),
            embedding_timeout: Duration::from_secs(config.server.embedding_timeout_secs),
            chat_timeout: Duration::from_secs(config.server.chat_timeout_secs),
            max_embed_chars: config.pipeline.max_embed_chars,
        })
    }
}

// ---------------------------------------------------------------------------
// ModelClient
// ---------------------------------------------------------------------------

/// Stateless client for the local model server.
#[derive(Debug, Clone)]
pub struct ModelClient {
    http: Client,
    opts: ClientOptions,
}

impl ModelClient {
    /// Build a client. The endpoint URLs never change afterwards.
    pub fn new(opts: ClientOptions) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TrainerError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, opts })
    }

    /// POST a JSON body and decode the JSON reply.
    async fn post_json<B, R>(&self, url: &Url, body: &B, timeout: Duration) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .http
            .post(url.clone())
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| TrainerError::Transport(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrainerError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| TrainerError::Transport(format!("{url}: failed to read body: {e}")))?;

        debug!(%url, bytes = text.len(), "response received");

        serde_json::from_str(&text).map_err(|e| TrainerError::Decode(format!("{url}: {e}")))
    }
}
