use crate::error::{ProshotsError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Descriptive attributes extracted once from the reference photos and fed
/// into every generation call of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeProfile {
    pub facial_structure: String,
    pub body_shape: String,
    pub hairstyle: String,
    pub eye_shape_and_color: String,
    pub nose_shape: String,
    pub lip_shape_and_color: String,
    pub eyebrow_shape: String,
    pub skin_tone: String,
    pub facial_features: String,
    pub eye_details: String,
    pub skin_texture: String,
    pub body_proportions: String,
    pub hair_characteristics: String,
    pub lighting_environment: String,
    pub pose_suggestions: String,
}

impl AttributeProfile {
    pub const FIELDS: [&'static str; 15] = [
        "facialStructure",
        "bodyShape",
        "hairstyle",
        "eyeShapeAndColor",
        "noseShape",
        "lipShapeAndColor",
        "eyebrowShape",
        "skinTone",
        "facialFeatures",
        "eyeDetails",
        "skinTexture",
        "bodyProportions",
        "hairCharacteristics",
        "lightingEnvironment",
        "poseSuggestions",
    ];

    /// Structured-output schema requested from the analysis model.
    pub fn response_schema() -> Value {
        let properties: serde_json::Map<String, Value> = Self::FIELDS
            .iter()
            .map(|field| (field.to_string(), json!({ "type": "STRING" })))
            .collect();

        json!({
            "type": "OBJECT",
            "properties": properties,
            "required": Self::FIELDS,
        })
    }

    /// Strict parse: every field must be present and non-blank.
    pub fn from_json(text: &str) -> Result<Self> {
        let profile: AttributeProfile = serde_json::from_str(text.trim())
            .map_err(|e| ProshotsError::ResponseError(format!("malformed profile: {}", e)))?;

        if let Some((name, _)) = profile
            .fields()
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
        {
            return Err(ProshotsError::ResponseError(format!(
                "malformed profile: field `{}` is empty",
                name
            )));
        }

        Ok(profile)
    }

    pub fn fields(&self) -> [(&'static str, &str); 15] {
        [
            ("facialStructure", self.facial_structure.as_str()),
            ("bodyShape", self.body_shape.as_str()),
            ("hairstyle", self.hairstyle.as_str()),
            ("eyeShapeAndColor", self.eye_shape_and_color.as_str()),
            ("noseShape", self.nose_shape.as_str()),
            ("lipShapeAndColor", self.lip_shape_and_color.as_str()),
            ("eyebrowShape", self.eyebrow_shape.as_str()),
            ("skinTone", self.skin_tone.as_str()),
            ("facialFeatures", self.facial_features.as_str()),
            ("eyeDetails", self.eye_details.as_str()),
            ("skinTexture", self.skin_texture.as_str()),
            ("bodyProportions", self.body_proportions.as_str()),
            ("hairCharacteristics", self.hair_characteristics.as_str()),
            ("lightingEnvironment", self.lighting_environment.as_str()),
            ("poseSuggestions", self.pose_suggestions.as_str()),
        ]
    }

    /// Compact description used to condition image generation.
    pub fn prompt_context(&self) -> String {
        format!(
            "Subject profile - face: {}; eyes: {}; nose: {}; lips: {}; eyebrows: {}; \
             skin: {} ({}); hair: {} ({}); body: {} ({}). \
             Lighting: {}. Pose: {}.",
            self.facial_structure,
            self.eye_shape_and_color,
            self.nose_shape,
            self.lip_shape_and_color,
            self.eyebrow_shape,
            self.skin_tone,
            self.skin_texture,
            self.hairstyle,
            self.hair_characteristics,
            self.body_shape,
            self.body_proportions,
            self.lighting_environment,
            self.pose_suggestions,
        )
    }
}

#[cfg(test)]
pub(crate) fn sample_profile_json() -> String {
    let object: serde_json::Map<String, Value> = AttributeProfile::FIELDS
        .iter()
        .map(|field| (field.to_string(), json!(format!("{} value", field))))
        .collect();
    Value::Object(object).to_string()
}
