pub mod image_client;
pub mod profile_client;
pub mod transport;

use crate::{
    config::Config,
    error::Result,
    resilience::{RetryController, SessionCredentials},
};
use std::sync::Arc;

pub use image_client::ImageClient;
pub use profile_client::ProfileClient;
pub use transport::{GenerativeTransport, HttpTransport};

#[derive(Clone)]
pub struct GeminiClient {
    profile_client: ProfileClient,
    image_client: ImageClient,
    credentials: Arc<SessionCredentials>,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config.gemini)?);
        let credentials = Arc::new(SessionCredentials::new(config.gemini.api_key.clone()));
        Ok(Self::with_transport(config, transport, credentials))
    }

    pub fn with_transport(
        config: &Config,
        transport: Arc<dyn GenerativeTransport>,
        credentials: Arc<SessionCredentials>,
    ) -> Self {
        let retry = RetryController::new(credentials.clone());

        let profile_client = ProfileClient::new(
            transport.clone(),
            retry.clone(),
            config.analysis_retry.clone(),
            config.gemini.analysis_model(),
            config.gemini.thinking_budget(),
            config.max_reference_images,
        );
        let image_client = ImageClient::new(
            transport,
            retry,
            config.generation_retry.clone(),
            config.tool_retry.clone(),
            config.gemini.image_model(),
        );

        Self {
            profile_client,
            image_client,
            credentials,
        }
    }

    pub fn profile(&self) -> &ProfileClient {
        &self.profile_client
    }

    pub fn image(&self) -> &ImageClient {
        &self.image_client
    }

    pub fn credentials(&self) -> &Arc<SessionCredentials> {
        &self.credentials
    }

    /// Stores a key entered during the session; it takes precedence over the environment.
    pub fn sync_credentials(&self, key: impl Into<String>) -> bool {
        let accepted = self.credentials.sync(key);
        if accepted {
            log::info!("Session credential synced");
        } else {
            log::warn!("Ignoring empty session credential");
        }
        accepted
    }
}
