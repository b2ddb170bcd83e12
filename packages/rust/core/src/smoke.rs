//! Post-run smoke test: one chat completion against the target model.
//!
//! Best effort only. A failure is logged and reported in the run summary,
//! never returned as an error.

use serde::Serialize;
use tracing::{info, instrument, warn};

use defi_trainer_artifacts::ASSISTANT_PERSONA;
use defi_trainer_client::{ChatMessage, ChatOptions, ModelClient};
use defi_trainer_shared::{Result, SmokeTestConfig, TrainerError};

/// How the smoke test went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum SmokeTestOutcome {
    /// The model answered; holds the reply text.
    Replied(String),
    /// The call failed; holds the error message.
    Failed(String),
    /// Disabled by config or flag.
    Skipped,
}

/// Ask the fixed sample question and return the model's reply.
pub async fn ask_sample_question(client: &ModelClient, config: &SmokeTestConfig) -> Result<String> {
    let messages = [
        ChatMessage::system(ASSISTANT_PERSONA),
        ChatMessage::user(config.question.clone()),
    ];
    let opts = ChatOptions {
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    };
    client.chat(&messages, opts).await
}

/// Run the smoke test, logging the reply or the failure.
#[instrument(skip_all)]
pub async fn run_smoke_test(client: &ModelClient, config: &SmokeTestConfig) -> SmokeTestOutcome {
    if !config.enabled {
        info!("smoke test disabled, skipping");
        return SmokeTestOutcome::Skipped;
    }

    match ask_sample_question(client, config).await {
        Ok(reply) => {
            info!("model test response:");
            info!("{reply}");
            SmokeTestOutcome::Replied(reply)
        }
        Err(e @ TrainerError::Shape(_)) => {
            warn!(error = %e, "no response from model");
            SmokeTestOutcome::Failed(e.to_string())
        }
        Err(e) => {
            warn!(error = %e, "failed to test model");
            SmokeTestOutcome::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use defi_trainer_client::ClientOptions;
    use defi_trainer_shared::TrainerConfig;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(uri: &str) -> ModelClient {
        let mut config = TrainerConfig::default();
        config.server.base_url = uri.to_string();
        ModelClient::new(ClientOptions::from_config(&config).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn sends_persona_and_sample_question() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "model": "text-embedding-nomic-embed-text-v1.5",
                "max_tokens": 500,
                "messages": [
                    {"role": "system", "content": ASSISTANT_PERSONA},
                    {"role": "user", "content": "What are the best arbitrage opportunities on Solana right now?"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "Check Jupiter routes."}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = run_smoke_test(&client_for(&server.uri()), &SmokeTestConfig::default()).await;
        assert_eq!(outcome, SmokeTestOutcome::Replied("Check Jupiter routes.".into()));
    }

    #[tokio::test]
    async fn failure_is_reported_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let outcome = run_smoke_test(&client_for(&server.uri()), &SmokeTestConfig::default()).await;
        match outcome {
            SmokeTestOutcome::Failed(msg) => assert!(msg.contains("500")),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn disabled_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let config = SmokeTestConfig {
            enabled: false,
            ..SmokeTestConfig::default()
        };
        let outcome = run_smoke_test(&client_for(&server.uri()), &config).await;
        assert_eq!(outcome, SmokeTestOutcome::Skipped);
    }
}
