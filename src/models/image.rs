use crate::{
    error::{ProshotsError, Result},
    models::common::InlineImage,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StyleSelection {
    #[serde(rename = "Professional")]
    Professional,
    #[serde(rename = "Dating")]
    Dating,
    #[serde(rename = "Vacation")]
    Vacation,
    #[serde(rename = "Party Shots")]
    Party,
    #[serde(rename = "2D Animated Image")]
    Animation2D,
    #[serde(rename = "3D Animated Image")]
    Animation3D,
}

impl StyleSelection {
    pub const ALL: [StyleSelection; 6] = [
        StyleSelection::Professional,
        StyleSelection::Dating,
        StyleSelection::Vacation,
        StyleSelection::Party,
        StyleSelection::Animation2D,
        StyleSelection::Animation3D,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StyleSelection::Professional => "Professional",
            StyleSelection::Dating => "Dating",
            StyleSelection::Vacation => "Vacation",
            StyleSelection::Party => "Party Shots",
            StyleSelection::Animation2D => "2D Animated Image",
            StyleSelection::Animation3D => "3D Animated Image",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            StyleSelection::Professional => "professional",
            StyleSelection::Dating => "dating",
            StyleSelection::Vacation => "vacation",
            StyleSelection::Party => "party",
            StyleSelection::Animation2D => "2d",
            StyleSelection::Animation3D => "3d",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StyleSelection::Professional => {
                "Sleek office backgrounds and business attire for LinkedIn and portfolios."
            }
            StyleSelection::Dating => {
                "Warm, approachable portraits with soft lighting and stylish casual wear."
            }
            StyleSelection::Vacation => "Exotic locations, sunny beaches, and relaxed vibes.",
            StyleSelection::Party => {
                "High energy, night-out aesthetics with dynamic lighting and festive outfits."
            }
            StyleSelection::Animation2D => {
                "Anime and hand-drawn illustrated styles inspired by modern studios."
            }
            StyleSelection::Animation3D => {
                "Pixar-esque high-quality 3D renders with expressive features."
            }
        }
    }
}

impl fmt::Display for StyleSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StyleSelection {
    type Err = ProshotsError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        StyleSelection::ALL
            .into_iter()
            .find(|style| {
                style.label().eq_ignore_ascii_case(wanted) || style.slug().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| ProshotsError::ConfigError(format!("Unknown style: {}", wanted)))
    }
}

/// Single-image passthrough operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolAction {
    WatermarkRemover,
    Upscaler,
    BgRemover,
    Resizer { width: u32, height: u32, unit: String },
}

impl ToolAction {
    pub fn kind(&self) -> ToolKind {
        match self {
            ToolAction::WatermarkRemover => ToolKind::WatermarkRemover,
            ToolAction::Upscaler => ToolKind::Upscaler,
            ToolAction::BgRemover => ToolKind::BgRemover,
            ToolAction::Resizer { .. } => ToolKind::Resizer,
        }
    }

    pub fn instruction(&self) -> String {
        match self {
            ToolAction::WatermarkRemover => "Remove watermark/text. Restore background.".into(),
            ToolAction::Upscaler => "Upscale and sharpen.".into(),
            ToolAction::BgRemover => "Remove background. Subject only.".into(),
            ToolAction::Resizer {
                width,
                height,
                unit,
            } => format!("Resize to {}x{}{}.", width, height, unit),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    WatermarkRemover,
    Upscaler,
    BgRemover,
    Resizer,
}

impl ToolKind {
    pub fn label(&self) -> &'static str {
        match self {
            ToolKind::WatermarkRemover => "Watermark Remover",
            ToolKind::Upscaler => "Upscaler",
            ToolKind::BgRemover => "Background Remover",
            ToolKind::Resizer => "Resizer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArtifactCategory {
    Style(StyleSelection),
    Tool(ToolKind),
}

impl fmt::Display for ArtifactCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactCategory::Style(style) => f.write_str(style.label()),
            ArtifactCategory::Tool(tool) => f.write_str(tool.label()),
        }
    }
}

/// One image produced by a successful remote call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    pub id: String,
    pub url: String, // data URL
    pub category: ArtifactCategory,
    pub description: String,
}

impl GeneratedArtifact {
    pub fn new(image: &InlineImage, category: ArtifactCategory, description: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            url: image.to_data_url(),
            category,
            description,
        }
    }

    pub fn image(&self) -> Result<InlineImage> {
        InlineImage::from_data_url(&self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_parsing() {
        assert_eq!(
            "Party Shots".parse::<StyleSelection>().unwrap(),
            StyleSelection::Party
        );
        assert_eq!("3d".parse::<StyleSelection>().unwrap(), StyleSelection::Animation3D);
        assert_eq!(
            " professional ".parse::<StyleSelection>().unwrap(),
            StyleSelection::Professional
        );
        assert!("watercolor".parse::<StyleSelection>().is_err());
    }

    #[test]
    fn test_style_serializes_as_label() {
        let json = serde_json::to_string(&StyleSelection::Animation2D).unwrap();
        assert_eq!(json, "\"2D Animated Image\"");
    }

    #[test]
    fn test_tool_instructions() {
        assert_eq!(
            ToolAction::BgRemover.instruction(),
            "Remove background. Subject only."
        );
        let resize = ToolAction::Resizer {
            width: 1080,
            height: 1350,
            unit: "px".into(),
        };
        assert_eq!(resize.instruction(), "Resize to 1080x1350px.");
        assert_eq!(resize.kind(), ToolKind::Resizer);
    }

    #[test]
    fn test_artifact_keeps_image_recoverable() {
        let image = InlineImage::from_bytes("image/png", b"png-bytes");
        let artifact = GeneratedArtifact::new(
            &image,
            ArtifactCategory::Style(StyleSelection::Dating),
            "Studio-quality Dating result.".into(),
        );
        assert_eq!(artifact.image().unwrap(), image);
        assert_eq!(artifact.category.to_string(), "Dating");

        let other = GeneratedArtifact::new(
            &image,
            ArtifactCategory::Tool(ToolKind::Upscaler),
            String::new(),
        );
        assert_ne!(artifact.id, other.id);
    }
}
