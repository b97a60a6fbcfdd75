//! Error types
//!
//! `SarmaError` is the crate error. Provider failures additionally carry an
//! `ErrorCategory`, which decides whether the adapter spends its one retry:
//! rate limits, network faults and 5xx responses are retried once; auth,
//! billing, token-limit and malformed-request failures are not.
//!
//! Provider and parse failures never surface as `Err` from the AI core:
//! adapters fold them into the envelope and the parser degrades. `SarmaError`
//! reaches callers only for configuration problems and `NotConfigured`.

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Error categories for retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate limited
    RateLimit,
    /// Context/token limit exceeded
    TokenLimit,
    /// Authentication failed
    Auth,
    /// Network/connectivity issues
    Network,
    /// Provider unavailable
    Unavailable,
    /// Invalid request
    BadRequest,
    /// Provider payload could not be decoded
    ParseError,
    /// Temporary server issues
    Transient,
    /// Unknown error
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::TokenLimit => write!(f, "TOKEN_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::ParseError => write!(f, "PARSE_ERROR"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl ErrorCategory {
    /// Whether the adapter may spend its one retry on this failure
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimit | Self::Network | Self::Transient)
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// Provider failure tagged with its category
#[derive(Debug, Clone)]
pub struct LlmError {
    pub category: ErrorCategory,
    pub message: String,
    /// Provider id, when known
    pub provider: Option<String>,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.provider {
            Some(provider) => write!(f, "[{}:{}] {}", provider, self.category, self.message),
            None => write!(f, "[{}] {}", self.category, self.message),
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            provider: None,
        }
    }

    pub fn with_provider(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            provider: Some(provider.into()),
            ..Self::new(category, message)
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.category.is_retryable()
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Message fragments per category, checked in order; first match wins.
///
/// Billing failures come before rate limits: OpenAI reports an exhausted
/// balance as `insufficient_quota` with status 429, and retrying cannot help.
const MESSAGE_RULES: &[(ErrorCategory, &[&str])] = &[
    (
        ErrorCategory::Auth,
        &[
            "401",
            "403",
            "api key",
            "api_key_invalid",
            "invalid_api_key",
            "unauthorized",
            "permission denied",
            "insufficient_quota",
        ],
    ),
    (
        ErrorCategory::RateLimit,
        &[
            "rate limit",
            "429",
            "too many requests",
            "quota exceeded",
            "resource_exhausted",
            "resource has been exhausted",
        ],
    ),
    (
        ErrorCategory::TokenLimit,
        &[
            "context_length_exceeded",
            "context length",
            "maximum context",
            "too many tokens",
            "payload too large",
        ],
    ),
    (
        ErrorCategory::Network,
        &["network", "connection", "dns", "timed out", "unreachable"],
    ),
    (
        ErrorCategory::Transient,
        &["500", "502", "503", "504", "service unavailable", "overloaded", "internal error"],
    ),
    (
        ErrorCategory::Unavailable,
        &["404", "model not found", "not_found"],
    ),
    (
        ErrorCategory::BadRequest,
        &["400", "bad request", "invalid_argument", "malformed"],
    ),
    (ErrorCategory::ParseError, &["decode", "json", "parse"]),
];

/// Maps provider failures onto an `ErrorCategory`
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify a provider error message
    pub fn classify(message: &str, provider: &str) -> LlmError {
        let lower = message.to_lowercase();
        let category = MESSAGE_RULES
            .iter()
            .find(|(_, needles)| needles.iter().any(|n| lower.contains(n)))
            .map(|(category, _)| *category)
            .unwrap_or(ErrorCategory::Unknown);
        LlmError::with_provider(category, message, provider)
    }

    /// Classify by HTTP status; the body decides only where the status is
    /// ambiguous (429 quota vs. rate limit, other unmapped codes)
    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> LlmError {
        let category = match status {
            429 if message.to_lowercase().contains("insufficient_quota") => ErrorCategory::Auth,
            429 => ErrorCategory::RateLimit,
            401 | 403 => ErrorCategory::Auth,
            400 | 422 => ErrorCategory::BadRequest,
            413 => ErrorCategory::TokenLimit,
            404 => ErrorCategory::Unavailable,
            500..=599 => ErrorCategory::Transient,
            _ => return Self::classify(message, provider),
        };
        LlmError::with_provider(category, message, provider)
    }

    /// Classify a transport-level reqwest failure
    pub fn classify_transport(err: &reqwest::Error, provider: &str) -> LlmError {
        let message = err.to_string();
        if err.is_timeout() || err.is_connect() || err.is_request() {
            LlmError::with_provider(ErrorCategory::Network, message, provider)
        } else if err.is_decode() || err.is_body() {
            LlmError::with_provider(ErrorCategory::ParseError, message, provider)
        } else if let Some(status) = err.status() {
            Self::classify_http_status(status.as_u16(), &message, provider)
        } else {
            Self::classify(&message, provider)
        }
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum SarmaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Structured provider error with category and retry hints
    #[error("LLM error: {0}")]
    Llm(LlmError),

    /// Simple provider error (use Llm variant for structured errors)
    #[error("LLM API error: {0}")]
    LlmApi(String),

    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Config error: {0}")]
    Config(String),

    /// A capability whose providers lack credentials. Callers map this to a
    /// "not configured" response instead of a degraded AI answer.
    #[error("{capability} is not configured: {reason}")]
    NotConfigured { capability: String, reason: String },
}

impl From<LlmError> for SarmaError {
    fn from(err: LlmError) -> Self {
        SarmaError::Llm(err)
    }
}

pub type Result<T> = std::result::Result<T, SarmaError>;

impl SarmaError {
    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    pub fn not_configured(capability: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NotConfigured {
            capability: capability.into(),
            reason: reason.into(),
        }
    }

    /// True for the "capability unavailable" class, as opposed to a
    /// degraded-but-valid answer
    pub fn is_not_configured(&self) -> bool {
        matches!(self, Self::NotConfigured { .. })
    }

    /// Classify this error for the adapter retry decision
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Llm(e) => e.category,
            Self::Timeout { .. } => ErrorCategory::Network,
            Self::Io(_) => ErrorCategory::Network,
            Self::Json(_) | Self::Parse { .. } => ErrorCategory::ParseError,
            Self::Config(_) | Self::NotConfigured { .. } => ErrorCategory::BadRequest,
            Self::LlmApi(msg) => ErrorClassifier::classify(msg, "").category,
        }
    }

    /// Check if this error is worth the adapter's transient retry
    pub fn is_recoverable(&self) -> bool {
        match self {
            // The timeout budget covers the whole call; retrying would overrun it
            Self::Timeout { .. } => false,
            other => other.category().is_retryable(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::RateLimit.to_string(), "RATE_LIMIT");
        assert_eq!(ErrorCategory::TokenLimit.to_string(), "TOKEN_LIMIT");
        assert_eq!(ErrorCategory::Auth.to_string(), "AUTH");
    }

    #[test]
    fn test_error_category_retryable() {
        assert!(ErrorCategory::RateLimit.is_retryable());
        assert!(ErrorCategory::Network.is_retryable());
        assert!(ErrorCategory::Transient.is_retryable());
        assert!(!ErrorCategory::ParseError.is_retryable());
        assert!(!ErrorCategory::Auth.is_retryable());
        assert!(!ErrorCategory::BadRequest.is_retryable());
    }

    #[test]
    fn test_classify_rate_limit() {
        let err = ErrorClassifier::classify("Rate limit exceeded, please retry", "gemini-flash");
        assert_eq!(err.category, ErrorCategory::RateLimit);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_classify_auth() {
        let err = ErrorClassifier::classify("Invalid API key provided", "gpt4-vision");
        assert_eq!(err.category, ErrorCategory::Auth);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_classify_network() {
        let err = ErrorClassifier::classify("Connection timed out after 30s", "ollama");
        assert_eq!(err.category, ErrorCategory::Network);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_classify_unknown() {
        let err = ErrorClassifier::classify("Something weird happened", "test");
        assert_eq!(err.category, ErrorCategory::Unknown);
    }

    #[test]
    fn test_classify_http_status() {
        let rate_limit = ErrorClassifier::classify_http_status(429, "Rate limited", "test");
        assert_eq!(rate_limit.category, ErrorCategory::RateLimit);

        let auth = ErrorClassifier::classify_http_status(401, "Unauthorized", "test");
        assert_eq!(auth.category, ErrorCategory::Auth);

        let server_error = ErrorClassifier::classify_http_status(503, "Server error", "test");
        assert_eq!(server_error.category, ErrorCategory::Transient);

        let teapot = ErrorClassifier::classify_http_status(418, "connection reset", "test");
        assert_eq!(teapot.category, ErrorCategory::Network);
    }

    #[test]
    fn test_classify_provider_markers() {
        let gemini = ErrorClassifier::classify("RESOURCE_EXHAUSTED: quota", "gemini-flash");
        assert_eq!(gemini.category, ErrorCategory::RateLimit);

        let openai = ErrorClassifier::classify(
            "This model's maximum context length is 128000 tokens (context_length_exceeded)",
            "gpt4-vision",
        );
        assert_eq!(openai.category, ErrorCategory::TokenLimit);
        assert!(!openai.is_retryable());
    }

    #[test]
    fn test_insufficient_quota_not_retried() {
        let err = ErrorClassifier::classify_http_status(
            429,
            "You exceeded your current quota (insufficient_quota)",
            "gpt4-vision",
        );
        assert_eq!(err.category, ErrorCategory::Auth);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::with_provider(ErrorCategory::RateLimit, "Too many requests", "openai");
        assert_eq!(err.to_string(), "[openai:RATE_LIMIT] Too many requests");

        let err_no_provider = LlmError::new(ErrorCategory::Network, "Connection failed");
        assert_eq!(err_no_provider.to_string(), "[NETWORK] Connection failed");
    }

    #[test]
    fn test_timeout_is_not_retried() {
        let err = SarmaError::timeout("gemini-flash analyze_image", Duration::from_secs(30));
        assert_eq!(err.category(), ErrorCategory::Network);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_not_configured() {
        let err = SarmaError::not_configured("meal analyzer", "GEMINI_API_KEY not set");
        assert!(err.is_not_configured());
        assert_eq!(
            err.to_string(),
            "meal analyzer is not configured: GEMINI_API_KEY not set"
        );
    }
}
