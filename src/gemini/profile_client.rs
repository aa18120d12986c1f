use crate::{
    error::{ProshotsError, Result},
    models::{
        AttributeProfile, GenerateContentRequest, GenerationConfig, InlineImage, ThinkingConfig,
    },
    resilience::{RetryController, RetryPolicy},
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::transport::GenerativeTransport;

const ANALYSIS_PROMPT: &str = "Analyze these photos for professional headshot suitability. \
Perform deep anatomical analysis of facial bone structure and skin tone. \
Output JSON of characteristics.";

#[derive(Clone)]
pub struct ProfileClient {
    transport: Arc<dyn GenerativeTransport>,
    retry: RetryController,
    policy: RetryPolicy,
    model: String,
    thinking_budget: u32,
    max_images: usize,
}

impl ProfileClient {
    pub fn new(
        transport: Arc<dyn GenerativeTransport>,
        retry: RetryController,
        policy: RetryPolicy,
        model: impl Into<String>,
        thinking_budget: u32,
        max_images: usize,
    ) -> Self {
        Self {
            transport,
            retry,
            policy,
            model: model.into(),
            thinking_budget,
            max_images: max_images.max(1),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn analyze(&self, images: &[InlineImage]) -> Result<AttributeProfile> {
        self.analyze_cancellable(images, None).await
    }

    /// Extracts the attribute profile from up to `max_images` reference photos.
    pub async fn analyze_cancellable(
        &self,
        images: &[InlineImage],
        cancel: Option<&CancellationToken>,
    ) -> Result<AttributeProfile> {
        if images.is_empty() {
            return Err(ProshotsError::InvalidImage(
                "at least one reference image is required".into(),
            ));
        }

        let batch = &images[..images.len().min(self.max_images)];
        if batch.len() < images.len() {
            log::debug!(
                "Analyzing the first {} of {} reference images",
                batch.len(),
                images.len()
            );
        }

        let request = GenerateContentRequest::from_images(batch, ANALYSIS_PROMPT).with_config(
            GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(AttributeProfile::response_schema()),
                thinking_config: Some(ThinkingConfig {
                    thinking_budget: self.thinking_budget,
                }),
                ..Default::default()
            },
        );

        log::info!("Analyzing {} photos with model: {}", batch.len(), self.model);

        let response = self
            .retry
            .execute_with_policy(&self.policy, cancel, |api_key| {
                let request = &request;
                async move {
                    self.transport
                        .generate_content(&api_key, &self.model, request)
                        .await?
                        .check_blocked()
                }
            })
            .await?;

        let text = response
            .first_text()
            .ok_or_else(|| ProshotsError::ResponseError("analysis returned no text".into()))?;

        let profile = AttributeProfile::from_json(&text)?;
        log::info!("Attribute profile extracted");
        Ok(profile)
    }
}
