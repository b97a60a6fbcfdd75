//! Timeout Budgets
//!
//! Every provider call runs under a fixed wall-clock budget. Image downloads
//! for inline-only providers get their own, shorter budget.
//!
//! ## Usage
//!
//! ```ignore
//! use crate::ai::timeout::{TimeoutConfig, with_timeout};
//!
//! let config = TimeoutConfig::default();
//! let result = with_timeout(
//!     config.provider_call,
//!     async { /* provider call */ },
//!     "gemini-flash analyze_image",
//! ).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use crate::constants::network as net_constants;
use crate::types::{Result, SarmaError};

/// Timeout budgets for one adapter
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Whole provider call, transient retry included (default: 30 seconds)
    pub provider_call: Duration,
    /// Downloading a remote image to inline it (default: 10 seconds)
    pub image_fetch: Duration,
    /// TCP connect (default: 10 seconds)
    pub connection: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            provider_call: Duration::from_secs(net_constants::DEFAULT_TIMEOUT_SECS),
            image_fetch: Duration::from_secs(net_constants::IMAGE_FETCH_TIMEOUT_SECS),
            connection: Duration::from_secs(net_constants::CONNECTION_TIMEOUT_SECS),
        }
    }
}

impl TimeoutConfig {
    /// Default budgets with a custom call budget
    pub fn with_call_secs(secs: u64) -> Self {
        Self {
            provider_call: Duration::from_secs(secs),
            ..Self::default()
        }
    }
}

/// Execute an async operation with a timeout
///
/// Returns `SarmaError::Timeout` if the operation doesn't complete within
/// the specified duration.
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(SarmaError::timeout(operation_name, timeout)),
    }
}
