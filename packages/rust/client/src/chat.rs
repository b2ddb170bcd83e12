//! `/v1/chat/completions` calls.

use serde::{Deserialize, Serialize};

use defi_trainer_shared::{Result, TrainerError};

use crate::ModelClient;

/// One message in a chat-completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// Sampling limits for a chat-completion request.
#[derive(Debug, Clone, Copy)]
pub struct ChatOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ModelClient {
    /// Send one chat-completion request and return the first choice's text.
    pub async fn chat(&self, messages: &[ChatMessage], opts: ChatOptions) -> Result<String> {
        let request = ChatRequest {
            model: &self.opts.chat_model,
            messages,
            temperature: opts.temperature,
            max_tokens: opts.max_tokens,
        };

        let response: ChatResponse = self
            .post_json(
                &self.opts.endpoints.chat_completions,
                &request,
                self.opts.chat_timeout,
            )
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| TrainerError::Shape("no choices in completion response".into()))?
            .message
            .content
            .ok_or_else(|| TrainerError::Shape("completion message has no content".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::client_for;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const OPTS: ChatOptions = ChatOptions {
        temperature: 0.7,
        max_tokens: 500,
    };

    #[test]
    fn request_serializes_openai_shape() {
        let messages = [ChatMessage::system("persona"), ChatMessage::user("hi")];
        let request = ChatRequest {
            model: "m",
            messages: &messages,
            temperature: 0.5,
            max_tokens: 10,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "m");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert_eq!(json["max_tokens"], 10);
    }

    #[tokio::test]
    async fn chat_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "max_tokens": 500,
                "messages": [
                    {"role": "system", "content": "persona"},
                    {"role": "user", "content": "What is a slot?"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-1",
                "choices": [
                    {"index": 0, "message": {"role": "assistant", "content": "About 400ms."}},
                    {"index": 1, "message": {"role": "assistant", "content": "ignored"}}
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let messages = [
            ChatMessage::system("persona"),
            ChatMessage::user("What is a slot?"),
        ];
        let reply = client.chat(&messages, OPTS).await.unwrap();
        assert_eq!(reply, "About 400ms.");
    }

    #[tokio::test]
    async fn empty_choices_is_a_shape_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server.uri())
            .chat(&[ChatMessage::user("q")], OPTS)
            .await
            .unwrap_err();
        assert!(matches!(err, TrainerError::Shape(_)));
    }

    #[tokio::test]
    async fn null_content_is_a_shape_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": null}}]
            })))
            .mount(&server)
            .await;

        let err = client_for(&server.uri())
            .chat(&[ChatMessage::user("q")], OPTS)
            .await
            .unwrap_err();
        assert!(matches!(err, TrainerError::Shape(_)));
    }

    #[tokio::test]
    async fn server_error_is_typed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client_for(&server.uri())
            .chat(&[ChatMessage::user("q")], OPTS)
            .await
            .unwrap_err();
        assert!(matches!(err, TrainerError::HttpStatus { status: 404, .. }));
    }
}
