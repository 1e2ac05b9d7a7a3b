use crate::constants::{
    DEFAULT_BACKEND_URL, DEFAULT_MAX_RETRIES, DEFAULT_QUALITY, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_RESPONSE_DEADLINE, DEFAULT_RETRY_BASE_DELAY, DEFAULT_RETRY_MAX_DELAY,
    DEFAULT_SCALE_PERCENT,
};
use std::cmp::min;
use std::time::Duration;

/// Numeric parameters sent with every submission.
///
/// Values are forwarded to the compression service untouched; the service
/// is the one deciding whether `scale_percent = 0` or `quality = 250` is
/// acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameters {
    pub scale_percent: i32,
    pub quality: i32,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            scale_percent: DEFAULT_SCALE_PERCENT,
            quality: DEFAULT_QUALITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_RETRY_BASE_DELAY,
            max_delay: DEFAULT_RETRY_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Exponential backoff capped at `max_delay`. Attempt 0 is the first try.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let factor = 2_u32.saturating_pow(attempt - 1);
        min(self.base_delay.saturating_mul(factor), self.max_delay)
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the compression service, kept as given
    pub backend_url: String,
    /// Upper bound for a single HTTP attempt
    pub request_timeout: Duration,
    /// Upper bound for a whole submission, retries included
    pub response_deadline: Duration,
    pub retry_policy: RetryPolicy,
    pub defaults: Parameters,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            response_deadline: DEFAULT_RESPONSE_DEADLINE,
            retry_policy: RetryPolicy::default(),
            defaults: Parameters::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(
        backend_url: Option<String>,
        timeout_secs: Option<u64>,
        max_retries: Option<u32>,
    ) -> Self {
        let mut config = Self::default();
        if let Some(url) = backend_url {
            config.backend_url = url;
        }
        if let Some(secs) = timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = max_retries {
            config.retry_policy.max_retries = retries;
        }
        config
    }

    pub fn with_defaults(mut self, defaults: Parameters) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_response_deadline(mut self, deadline: Duration) -> Self {
        self.response_deadline = deadline;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }
}
