use crate::{models::common::InlineImage, resilience::classifier::RemoteFailure};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// One user turn: the images first, then the instruction.
    pub fn from_images(images: &[InlineImage], instruction: &str) -> Self {
        let mut parts: Vec<Part> = images.iter().cloned().map(Part::image).collect();
        parts.push(Part::text(instruction));

        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: None,
        }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineImage>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn image(image: InlineImage) -> Self {
        Self {
            text: None,
            inline_data: Some(image),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub thinking_budget: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

const BLOCKING_FINISH_REASONS: [&str; 6] = [
    "SAFETY",
    "IMAGE_SAFETY",
    "PROHIBITED_CONTENT",
    "IMAGE_PROHIBITED_CONTENT",
    "BLOCKLIST",
    "SPII",
];

fn is_blocking_reason(reason: &str) -> bool {
    BLOCKING_FINISH_REASONS.contains(&reason)
        || reason.contains("SAFETY")
        || reason.contains("PROHIBITED")
}

impl GenerateContentResponse {
    /// Turns a refused prompt or a safety-stopped candidate into a failure.
    pub fn check_blocked(self) -> Result<Self, RemoteFailure> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.clone())
        {
            return Err(RemoteFailure::Blocked {
                reason: format!("prompt blocked: {}", reason),
            });
        }

        // A refusal may still carry an explanatory text part.
        if self.first_image().is_none() {
            if let Some(reason) = self
                .candidates
                .iter()
                .filter_map(|c| c.finish_reason.as_deref())
                .find(|reason| is_blocking_reason(reason))
            {
                return Err(RemoteFailure::Blocked {
                    reason: format!("candidate stopped: {}", reason),
                });
            }
        }

        Ok(self)
    }

    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .iter()
            .filter_map(|candidate| candidate.content.as_ref())
            .flat_map(|content| content.parts.iter())
    }

    pub fn first_text(&self) -> Option<String> {
        let text: String = self
            .candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    pub fn first_image(&self) -> Option<InlineImage> {
        self.parts().find_map(|part| part.inline_data.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let image = InlineImage::from_bytes("image/png", b"abc");
        let request = GenerateContentRequest::from_images(&[image], "Upscale and sharpen.")
            .with_config(GenerationConfig {
                response_mime_type: Some("application/json".into()),
                thinking_config: Some(ThinkingConfig {
                    thinking_budget: 1024,
                }),
                ..Default::default()
            });

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(value["contents"][0]["parts"][1]["text"], "Upscale and sharpen.");
        assert_eq!(value["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(value["generationConfig"]["thinkingConfig"]["thinkingBudget"], 1024);
        assert!(value["generationConfig"].get("responseSchema").is_none());
    }

    #[test]
    fn test_extracts_image_and_text() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "Here you go" },
                        { "inlineData": { "mimeType": "image/png", "data": "aGVsbG8=" } }
                    ]
                },
                "finishReason": "STOP"
            }]
        }))
        .unwrap();

        let response = response.check_blocked().unwrap();
        assert_eq!(response.first_text().as_deref(), Some("Here you go"));
        assert_eq!(response.first_image().unwrap().data, "aGVsbG8=");
    }

    #[test]
    fn test_blocked_prompt() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }))
        .unwrap();

        assert!(matches!(
            response.check_blocked(),
            Err(RemoteFailure::Blocked { .. })
        ));
    }

    #[test]
    fn test_safety_finish_without_output() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "finishReason": "IMAGE_SAFETY" }]
        }))
        .unwrap();

        match response.check_blocked() {
            Err(RemoteFailure::Blocked { reason }) => assert!(reason.contains("IMAGE_SAFETY")),
            other => panic!("expected block, got {:?}", other),
        }
    }

    #[test]
    fn test_safety_finish_with_refusal_text() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "I can't help with that." }] },
                "finishReason": "IMAGE_SAFETY"
            }]
        }))
        .unwrap();

        match response.check_blocked() {
            Err(RemoteFailure::Blocked { reason }) => assert!(reason.contains("IMAGE_SAFETY")),
            other => panic!("expected block, got {:?}", other),
        }
    }

    #[test]
    fn test_image_prohibited_content() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "finishReason": "IMAGE_PROHIBITED_CONTENT" }]
        }))
        .unwrap();

        assert!(matches!(
            response.check_blocked(),
            Err(RemoteFailure::Blocked { .. })
        ));
    }

    #[test]
    fn test_image_output_wins_over_finish_reason() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "inlineData": { "mimeType": "image/png", "data": "aGVsbG8=" } }] },
                "finishReason": "SAFETY"
            }]
        }))
        .unwrap();

        assert!(response.check_blocked().unwrap().first_image().is_some());
    }

    #[test]
    fn test_empty_response_has_no_output() {
        let response = GenerateContentResponse::default().check_blocked().unwrap();
        assert!(response.first_text().is_none());
        assert!(response.first_image().is_none());
    }
}
