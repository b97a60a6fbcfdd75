//! Ollama Local Backend
//!
//! Backend for locally-running Ollama vision models via `/api/chat`.
//! Images go in the message's `images` array as raw base64.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{
    CompletionBackend, CompletionRequest, ErrorClassifier, ProviderConfig, ProviderKind,
    RawCompletion, Role, TokenUsage, http_client, http_error,
};
use crate::ai::timeout::TimeoutConfig;
use crate::types::{ErrorCategory, LlmError, Result, SarmaError};

const DEFAULT_API_BASE: &str = "http://localhost:11434";
pub(super) const DEFAULT_MODEL: &str = "llava:latest";

/// Ollama local backend
pub struct OllamaBackend {
    api_base: String,
    model: String,
    name: String,
    image_fetch_timeout: Duration,
    client: reqwest::Client,
}

impl OllamaBackend {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        // Validate endpoint URL for security (SSRF prevention)
        let api_base = Self::validate_endpoint(&api_base)?;
        let timeouts = TimeoutConfig::default();

        Ok(Self {
            api_base,
            model: config.model_name().to_string(),
            name: config.display_name().to_string(),
            image_fetch_timeout: timeouts.image_fetch,
            client: http_client(timeouts.connection)?,
        })
    }

    /// Validate endpoint URL for security (SSRF prevention)
    ///
    /// Only allows http/https schemes and warns for non-localhost endpoints.
    fn validate_endpoint(endpoint: &str) -> Result<String> {
        let url = url::Url::parse(endpoint).map_err(|e| {
            SarmaError::Config(format!("Invalid Ollama endpoint URL '{}': {}", endpoint, e))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(SarmaError::Config(format!(
                "Ollama endpoint must use http or https scheme, got: {}",
                url.scheme()
            )));
        }

        if let Some(host) = url.host_str()
            && !matches!(host, "localhost" | "127.0.0.1" | "[::1]")
        {
            warn!(
                "Ollama endpoint is not localhost: {}. Ensure this is intentional.",
                host
            );
        }

        Ok(url.to_string().trim_end_matches('/').to_string())
    }

    async fn build_request(&self, request: &CompletionRequest) -> Result<OllamaChatRequest> {
        let image = match &request.image {
            Some(image) => Some(
                image
                    .to_inline(&self.client, self.image_fetch_timeout, &self.name)
                    .await?
                    .data,
            ),
            None => None,
        };
        let last_user = request.messages.iter().rposition(|m| m.role == Role::User);

        let mut messages: Vec<OllamaMessage> = request
            .messages
            .iter()
            .enumerate()
            .map(|(i, m)| OllamaMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
                images: match (&image, Some(i) == last_user) {
                    (Some(data), true) => vec![data.clone()],
                    _ => Vec::new(),
                },
            })
            .collect();

        if let (Some(data), None) = (image, last_user) {
            messages.push(OllamaMessage {
                role: Role::User.as_str().to_string(),
                content: String::new(),
                images: vec![data],
            });
        }

        Ok(OllamaChatRequest {
            model: self.model.clone(),
            messages,
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        })
    }
}

#[async_trait]
impl CompletionBackend for OllamaBackend {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<RawCompletion> {
        let body = self.build_request(request).await?;
        let url = format!("{}/api/chat", self.api_base);

        debug!("Sending request to Ollama API (model: {})", self.model);

        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
            if e.is_connect() {
                LlmError::with_provider(
                    ErrorCategory::Network,
                    format!(
                        "Failed to connect to Ollama at {}. Is Ollama running? Start with: ollama serve",
                        self.api_base
                    ),
                    &self.name,
                )
                .into()
            } else {
                SarmaError::from(ErrorClassifier::classify_transport(&e, &self.name))
            }
        })?;

        if !response.status().is_success() {
            return Err(http_error(response, &self.name).await);
        }

        let body: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, &self.name))?;

        let usage = match (body.prompt_eval_count, body.eval_count) {
            (None, None) => None,
            (input, output) => Some(TokenUsage::new(input.unwrap_or(0), output.unwrap_or(0))),
        };

        Ok(RawCompletion {
            text: body.message.content,
            usage,
            finish_reason: body.done_reason,
        })
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/api/tags", self.api_base);

        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                if let Ok(tags) = resp.json::<OllamaTagsResponse>().await {
                    let model_available = tags.models.iter().any(|m| {
                        m.name == self.model
                            || m.name.starts_with(&self.model.replace(":latest", ""))
                    });

                    if model_available {
                        info!("Ollama is available with model: {}", self.model);
                        true
                    } else {
                        warn!(
                            "Ollama is running but model '{}' not found. Pull with: ollama pull {}",
                            self.model, self.model
                        );
                        false
                    }
                } else {
                    info!("Ollama is available");
                    true
                }
            }
            Ok(resp) => {
                warn!("Ollama API check failed: {}", resp.status());
                false
            }
            Err(e) => {
                warn!("Ollama not available: {}. Start with: ollama serve", e);
                false
            }
        }
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaMessage {
    role: String,
    content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
    #[serde(default)]
    done_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}
