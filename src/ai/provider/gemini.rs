//! Google Gemini Backend
//!
//! Fast-tier backend using the `generateContent` REST endpoint.
//! Images must be sent inline, so remote URLs are downloaded first.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{
    ChatMessage, CompletionBackend, CompletionRequest, ErrorClassifier, ProviderConfig,
    ProviderKind, RawCompletion, Role, TokenUsage, http_client, http_error,
};
use crate::ai::timeout::TimeoutConfig;
use crate::types::{ErrorCategory, LlmError, Result};

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub(super) const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

/// Gemini backend with secure API key handling
pub struct GeminiBackend {
    /// API key stored securely - never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    model: String,
    name: String,
    image_fetch_timeout: Duration,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiBackend {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = config.require_api_key()?;
        let timeouts = TimeoutConfig::default();

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
            image_fetch_timeout: timeouts.image_fetch,
            client: http_client(timeouts.connection)?,
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.api_base, self.model, method)
    }

    /// Split out system turns; Gemini calls the assistant role "model"
    fn convert_messages(messages: &[ChatMessage]) -> (Vec<GeminiContent>, Option<GeminiContent>) {
        let mut contents = Vec::new();
        let mut system_parts = Vec::new();

        for message in messages {
            match message.role {
                Role::System => system_parts.push(Part::text(&message.content)),
                Role::User | Role::Assistant => contents.push(GeminiContent {
                    role: Some(
                        if message.role == Role::User {
                            "user"
                        } else {
                            "model"
                        }
                        .to_string(),
                    ),
                    parts: vec![Part::text(&message.content)],
                }),
            }
        }

        let system_instruction = (!system_parts.is_empty()).then(|| GeminiContent {
            role: None,
            parts: system_parts,
        });
        (contents, system_instruction)
    }

    async fn build_request(&self, request: &CompletionRequest) -> Result<GeminiRequest> {
        let (mut contents, system_instruction) = Self::convert_messages(&request.messages);

        if let Some(image) = &request.image {
            let inline = image
                .to_inline(&self.client, self.image_fetch_timeout, &self.name)
                .await?;
            let part = Part::InlineData {
                inline_data: InlineData {
                    mime_type: inline.mime_type,
                    data: inline.data,
                },
            };
            match contents.iter_mut().rev().find(|c| c.role.as_deref() == Some("user")) {
                Some(last_user) => last_user.parts.push(part),
                None => contents.push(GeminiContent {
                    role: Some("user".to_string()),
                    parts: vec![part],
                }),
            }
        }

        Ok(GeminiRequest {
            contents,
            system_instruction,
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            },
        })
    }

    fn extract(&self, body: GeminiResponse) -> Result<RawCompletion> {
        let Some(candidate) = body.candidates.into_iter().next() else {
            let reason = body
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(LlmError::with_provider(
                ErrorCategory::BadRequest,
                format!("Gemini returned no content: {}", reason),
                &self.name,
            )
            .into());
        };

        let text = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| match p {
                        Part::Text { text } => Some(text),
                        Part::InlineData { .. } => None,
                    })
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(LlmError::with_provider(
                ErrorCategory::ParseError,
                format!(
                    "Gemini returned an empty candidate (finish reason: {})",
                    candidate.finish_reason.as_deref().unwrap_or("unknown")
                ),
                &self.name,
            )
            .into());
        }

        Ok(RawCompletion {
            text,
            usage: body
                .usage_metadata
                .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count)),
            finish_reason: candidate.finish_reason,
        })
    }
}

#[async_trait]
impl CompletionBackend for GeminiBackend {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<RawCompletion> {
        let body = self.build_request(request).await?;

        debug!("Sending request to Gemini API (model: {})", self.model);

        let response = self
            .client
            .post(self.endpoint("generateContent"))
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, &self.name))?;

        if !response.status().is_success() {
            return Err(http_error(response, &self.name).await);
        }

        let body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, &self.name))?;

        self.extract(body)
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/models/{}", self.api_base, self.model);
        match self
            .client
            .get(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => {
                info!("Gemini API is available");
                true
            }
            Ok(resp) => {
                warn!("Gemini API check failed: {}", resp.status());
                false
            }
            Err(e) => {
                warn!("Gemini API check failed: {}", e);
                false
            }
        }
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(alias = "inlineData")]
        inline_data: InlineData,
    },
}

impl Part {
    fn text(text: &str) -> Self {
        Part::Text {
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct InlineData {
    #[serde(alias = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<GeminiContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}
