use crate::{
    error::{ProshotsError, Result},
    models::{
        ArtifactCategory, AttributeProfile, GenerateContentRequest, GeneratedArtifact,
        GenerationConfig, InlineImage, StyleSelection, ToolAction,
    },
    resilience::{RetryController, RetryPolicy},
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::transport::GenerativeTransport;

#[derive(Clone)]
pub struct ImageClient {
    transport: Arc<dyn GenerativeTransport>,
    retry: RetryController,
    generation_policy: RetryPolicy,
    tool_policy: RetryPolicy,
    model: String,
}

impl ImageClient {
    pub fn new(
        transport: Arc<dyn GenerativeTransport>,
        retry: RetryController,
        generation_policy: RetryPolicy,
        tool_policy: RetryPolicy,
        model: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            retry,
            generation_policy,
            tool_policy,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate_variant(
        &self,
        profile: &AttributeProfile,
        style: StyleSelection,
        reference: &InlineImage,
    ) -> Result<GeneratedArtifact> {
        self.generate_variant_cancellable(profile, style, reference, None)
            .await
    }

    /// One styled portrait conditioned on the profile and a reference photo.
    pub async fn generate_variant_cancellable(
        &self,
        profile: &AttributeProfile,
        style: StyleSelection,
        reference: &InlineImage,
        cancel: Option<&CancellationToken>,
    ) -> Result<GeneratedArtifact> {
        let prompt = format!(
            "A professional {} portrait of the person in the image. {} {} \
             High fidelity. Identity lock and anatomical accuracy is critical.",
            style.label(),
            style.description(),
            profile.prompt_context()
        );

        let image = self
            .render(reference, &prompt, &self.generation_policy, cancel)
            .await
            .map_err(|e| match e {
                ProshotsError::ResponseError(_) => {
                    ProshotsError::ResponseError("Generation failed.".into())
                }
                other => other,
            })?;

        Ok(GeneratedArtifact::new(
            &image,
            ArtifactCategory::Style(style),
            format!("Studio-quality {} result.", style.label()),
        ))
    }

    pub async fn apply_tool(
        &self,
        image: &InlineImage,
        action: &ToolAction,
    ) -> Result<GeneratedArtifact> {
        if let ToolAction::Resizer { width, height, .. } = action {
            if *width == 0 || *height == 0 {
                return Err(ProshotsError::ConfigError(
                    "resize dimensions must be positive".into(),
                ));
            }
        }

        log::info!("Applying {} with model: {}", action.kind().label(), self.model);
        let result = self
            .render(image, &action.instruction(), &self.tool_policy, None)
            .await?;

        Ok(GeneratedArtifact::new(
            &result,
            ArtifactCategory::Tool(action.kind()),
            format!("{} result.", action.kind().label()),
        ))
    }

    /// Free-text edit of an existing image.
    pub async fn edit(&self, image: &InlineImage, instruction: &str) -> Result<InlineImage> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(ProshotsError::ConfigError(
                "edit instruction must not be empty".into(),
            ));
        }

        log::info!("Editing image with model: {}", self.model);
        self.render(image, instruction, &self.tool_policy, None)
            .await
            .map_err(|e| match e {
                ProshotsError::ResponseError(_) => ProshotsError::ResponseError("Edit failed.".into()),
                other => other,
            })
    }

    async fn render(
        &self,
        image: &InlineImage,
        instruction: &str,
        policy: &RetryPolicy,
        cancel: Option<&CancellationToken>,
    ) -> Result<InlineImage> {
        let request = GenerateContentRequest::from_images(std::slice::from_ref(image), instruction)
            .with_config(GenerationConfig {
                response_modalities: Some(vec!["IMAGE".to_string()]),
                ..Default::default()
            });

        let response = self
            .retry
            .execute_with_policy(policy, cancel, |api_key| {
                let request = &request;
                async move {
                    self.transport
                        .generate_content(&api_key, &self.model, request)
                        .await?
                        .check_blocked()
                }
            })
            .await?;

        response
            .first_image()
            .ok_or_else(|| ProshotsError::ResponseError("Processing failed.".into()))
    }
}
