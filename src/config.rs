use crate::resilience::{credentials::env_api_key, RetryPolicy};
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_ANALYSIS_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_VARIANT_COUNT: usize = 25;
pub const MAX_REFERENCE_IMAGES: usize = 5;

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub analysis_model: Option<String>,
    pub image_model: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub thinking_budget: Option<u32>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: None,
            base_url: None,
            analysis_model: None,
            image_model: None,
            request_timeout_secs: None,
            thinking_budget: None,
        }
    }
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = env_api_key();
        let base_url = env::var("GEMINI_BASE_URL").ok();
        let analysis_model = env::var("PROSHOTS_ANALYSIS_MODEL").ok();
        let image_model = env::var("PROSHOTS_IMAGE_MODEL").ok();
        let request_timeout_secs = env::var("PROSHOTS_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok());
        let thinking_budget = env::var("PROSHOTS_THINKING_BUDGET")
            .ok()
            .and_then(|s| s.parse().ok());

        GeminiConfig {
            api_key,
            base_url,
            analysis_model,
            image_model,
            request_timeout_secs,
            thinking_budget,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_models(
        mut self,
        analysis_model: impl Into<String>,
        image_model: impl Into<String>,
    ) -> Self {
        self.analysis_model = Some(analysis_model.into());
        self.image_model = Some(image_model.into());
        self
    }

    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    pub fn with_thinking_budget(mut self, budget: u32) -> Self {
        self.thinking_budget = Some(budget);
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn analysis_model(&self) -> &str {
        self.analysis_model
            .as_deref()
            .unwrap_or(DEFAULT_ANALYSIS_MODEL)
    }

    pub fn image_model(&self) -> &str {
        self.image_model.as_deref().unwrap_or(DEFAULT_IMAGE_MODEL)
    }

    /// Per-request deadline handed to the HTTP client.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(120))
    }

    pub fn thinking_budget(&self) -> u32 {
        self.thinking_budget.unwrap_or(32768)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub variant_count: usize,
    pub max_reference_images: usize,
    pub analysis_retry: RetryPolicy,
    pub generation_retry: RetryPolicy,
    pub tool_retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            gemini: GeminiConfig::default(),
            variant_count: DEFAULT_VARIANT_COUNT,
            max_reference_images: MAX_REFERENCE_IMAGES,
            analysis_retry: RetryPolicy::analysis(),
            generation_retry: RetryPolicy::generation(),
            tool_retry: RetryPolicy::tools(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let variant_count = env::var("PROSHOTS_VARIANT_COUNT")
            .ok()
            .and_then(|count| count.parse().ok())
            .filter(|count| *count > 0)
            .unwrap_or(DEFAULT_VARIANT_COUNT);

        Config {
            gemini: GeminiConfig::from_env(),
            variant_count,
            ..Default::default()
        }
    }

    pub fn with_gemini(mut self, config: GeminiConfig) -> Self {
        self.gemini = config;
        self
    }

    pub fn with_variant_count(mut self, count: usize) -> Self {
        self.variant_count = count.max(1);
        self
    }

    pub fn with_max_reference_images(mut self, max: usize) -> Self {
        self.max_reference_images = max.max(1);
        self
    }

    /// Use one policy for every kind of call.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.analysis_retry = policy.clone();
        self.generation_retry = policy.clone();
        self.tool_retry = policy;
        self
    }

    pub fn with_analysis_retry(mut self, policy: RetryPolicy) -> Self {
        self.analysis_retry = policy;
        self
    }

    pub fn with_generation_retry(mut self, policy: RetryPolicy) -> Self {
        self.generation_retry = policy;
        self
    }

    pub fn with_tool_retry(mut self, policy: RetryPolicy) -> Self {
        self.tool_retry = policy;
        self
    }
}
