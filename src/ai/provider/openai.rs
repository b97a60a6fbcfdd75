//! OpenAI API Backend
//!
//! Premium-tier backend using the Chat Completions API. Images are passed
//! as `image_url` content parts (http URLs or data URLs) with a detail hint.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{
    CompletionBackend, CompletionRequest, ErrorClassifier, ProviderConfig, ProviderKind,
    RawCompletion, Role, TokenUsage, http_client, http_error,
};
use crate::ai::timeout::TimeoutConfig;
use crate::types::{ErrorCategory, LlmError, Result};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub(super) const DEFAULT_MODEL: &str = "gpt-4o";

/// OpenAI backend with secure API key handling
pub struct OpenAiBackend {
    /// API key stored securely - never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    model: String,
    name: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiBackend {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = config.require_api_key()?;

        Ok(Self {
            api_key,
            api_base: config
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: config.model_name().to_string(),
            name: config.display_name().to_string(),
            client: http_client(TimeoutConfig::default().connection)?,
        })
    }

    fn build_request(&self, request: &CompletionRequest) -> ChatCompletionRequest {
        let last_user = request.messages.iter().rposition(|m| m.role == Role::User);

        let mut messages: Vec<WireMessage> = request
            .messages
            .iter()
            .enumerate()
            .map(|(i, message)| {
                let content = match (&request.image, Some(i) == last_user) {
                    (Some(image), true) => WireContent::Parts(vec![
                        ContentPart::Text {
                            text: message.content.clone(),
                        },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl {
                                url: image.to_url(),
                                detail: request.detail.as_str().to_string(),
                            },
                        },
                    ]),
                    _ => WireContent::Text(message.content.clone()),
                };
                WireMessage {
                    role: message.role.as_str().to_string(),
                    content,
                }
            })
            .collect();

        if let (Some(image), None) = (&request.image, last_user) {
            messages.push(WireMessage {
                role: Role::User.as_str().to_string(),
                content: WireContent::Parts(vec![ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image.to_url(),
                        detail: request.detail.as_str().to_string(),
                    },
                }]),
            });
        }

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<RawCompletion> {
        let body = self.build_request(request);
        let url = format!("{}/chat/completions", self.api_base);

        debug!("Sending request to OpenAI API (model: {})", self.model);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, &self.name))?;

        if !response.status().is_success() {
            return Err(http_error(response, &self.name).await);
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, &self.name))?;

        let choice = body.choices.into_iter().next();
        let finish_reason = choice.as_ref().and_then(|c| c.finish_reason.clone());
        let text = choice
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                LlmError::with_provider(
                    ErrorCategory::ParseError,
                    "No content in OpenAI response",
                    &self.name,
                )
            })?;

        Ok(RawCompletion {
            text,
            usage: body
                .usage
                .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens)),
            finish_reason,
        })
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/models", self.api_base);

        let response = self
            .client
            .get(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                info!("OpenAI API is available");
                true
            }
            Ok(resp) => {
                warn!("OpenAI API check failed: {}", resp.status());
                false
            }
            Err(e) => {
                warn!("OpenAI API check failed: {}", e);
                false
            }
        }
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: WireContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WireContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
    detail: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    prompt_tokens: u32,
    completion_tokens: u32,
}
