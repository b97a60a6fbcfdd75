//! Image references
//!
//! Callers hand the AI core either an http(s) URL or a `data:` URL. Some
//! providers accept URLs directly; others need the bytes inline, so remote
//! images are downloaded (bounded in time and size) and base64-encoded.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use super::ErrorClassifier;
use crate::constants::network::MAX_IMAGE_BYTES;
use crate::types::{ErrorCategory, LlmError, Result, SarmaError};

const DEFAULT_MIME: &str = "image/jpeg";

/// An image to analyze
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageInput {
    /// Remote http(s) image
    Url(String),
    /// Base64 payload with its MIME type
    Inline { mime_type: String, data: String },
}

/// Base64 image ready to embed in a request body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

impl ImageInput {
    /// Parse an http(s) URL or a `data:<mime>;base64,<payload>` URL
    pub fn parse(source: &str) -> Result<Self> {
        let source = source.trim();
        if let Some(rest) = source.strip_prefix("data:") {
            let (header, data) = rest.split_once(',').ok_or_else(|| SarmaError::Parse {
                message: "data URL has no ',' separator".to_string(),
            })?;
            let mime_type = header
                .strip_suffix(";base64")
                .ok_or_else(|| SarmaError::Parse {
                    message: "only base64 data URLs are supported".to_string(),
                })?;
            if data.is_empty() {
                return Err(SarmaError::Parse {
                    message: "data URL has an empty payload".to_string(),
                });
            }
            let mime_type = if mime_type.is_empty() {
                DEFAULT_MIME
            } else {
                mime_type
            };
            return Ok(Self::Inline {
                mime_type: mime_type.to_string(),
                data: data.to_string(),
            });
        }

        let url = url::Url::parse(source).map_err(|e| SarmaError::Parse {
            message: format!("invalid image URL '{}': {}", source, e),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SarmaError::Parse {
                message: format!("image URL must use http or https, got: {}", url.scheme()),
            });
        }
        Ok(Self::Url(url.to_string()))
    }

    /// Wrap raw bytes (e.g. a file read from disk)
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self::Inline {
            mime_type: mime_type.into(),
            data: STANDARD.encode(bytes),
        }
    }

    /// URL form accepted by providers that take image URLs
    pub fn to_url(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::Inline { mime_type, data } => format!("data:{};base64,{}", mime_type, data),
        }
    }

    /// Inline bytes, downloading remote images first
    pub async fn to_inline(
        &self,
        client: &reqwest::Client,
        timeout: Duration,
        provider: &str,
    ) -> Result<InlineImage> {
        match self {
            Self::Inline { mime_type, data } => Ok(InlineImage {
                mime_type: mime_type.clone(),
                data: data.clone(),
            }),
            Self::Url(url) => fetch_image(client, url, timeout, provider).await,
        }
    }
}

/// Best-effort MIME type from a file extension
pub fn mime_from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => DEFAULT_MIME,
    }
}

async fn fetch_image(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
    provider: &str,
) -> Result<InlineImage> {
    debug!("Fetching image for inline upload: {}", url);

    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| ErrorClassifier::classify_transport(&e, provider))?;

    if !response.status().is_success() {
        return Err(LlmError::with_provider(
            ErrorCategory::BadRequest,
            format!("Failed to fetch image ({}): {}", response.status(), url),
            provider,
        )
        .into());
    }

    if let Some(len) = response.content_length()
        && len as usize > MAX_IMAGE_BYTES
    {
        return Err(too_large(len as usize, provider));
    }

    let mime_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::trim)
        .filter(|v| v.starts_with("image/"))
        .map(String::from)
        .unwrap_or_else(|| mime_from_path(Path::new(url)).to_string());

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ErrorClassifier::classify_transport(&e, provider))?;
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(too_large(bytes.len(), provider));
    }

    Ok(InlineImage {
        mime_type,
        data: STANDARD.encode(&bytes),
    })
}

fn too_large(len: usize, provider: &str) -> SarmaError {
    LlmError::with_provider(
        ErrorCategory::TokenLimit,
        format!("Image is {} bytes; limit is {}", len, MAX_IMAGE_BYTES),
        provider,
    )
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_data_url() {
        let image = ImageInput::parse("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(
            image,
            ImageInput::Inline {
                mime_type: "image/png".to_string(),
                data: "iVBORw0KGgo=".to_string(),
            }
        );
        assert_eq!(image.to_url(), "data:image/png;base64,iVBORw0KGgo=");
    }

    #[test]
    fn test_parse_http_url() {
        let image = ImageInput::parse(" https://example.com/lunch.jpg ").unwrap();
        assert_eq!(image, ImageInput::Url("https://example.com/lunch.jpg".to_string()));
    }

    #[test]
    fn test_parse_rejects_other_schemes() {
        assert!(ImageInput::parse("ftp://example.com/a.jpg").is_err());
        assert!(ImageInput::parse("data:image/png,raw").is_err());
        assert!(ImageInput::parse("not a url").is_err());
    }

    #[test]
    fn test_from_bytes_encodes() {
        let image = ImageInput::from_bytes(b"abc", "image/gif");
        assert_eq!(image.to_url(), "data:image/gif;base64,YWJj");
    }

    #[test]
    fn test_mime_from_path() {
        assert_eq!(mime_from_path(Path::new("meal.PNG")), "image/png");
        assert_eq!(mime_from_path(Path::new("meal")), "image/jpeg");
    }

    #[tokio::test]
    async fn test_remote_image_is_inlined() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/plate.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(b"abc".to_vec()),
            )
            .mount(&server)
            .await;

        let image = ImageInput::Url(format!("{}/plate.png", server.uri()));
        let inline = image
            .to_inline(&reqwest::Client::new(), Duration::from_secs(5), "test")
            .await
            .unwrap();
        assert_eq!(inline.mime_type, "image/png");
        assert_eq!(inline.data, "YWJj");
    }

    #[tokio::test]
    async fn test_remote_image_404_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let image = ImageInput::Url(format!("{}/missing.jpg", server.uri()));
        let result = image
            .to_inline(&reqwest::Client::new(), Duration::from_secs(5), "test")
            .await;
        assert!(result.is_err());
    }
}
