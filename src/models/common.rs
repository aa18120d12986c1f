use crate::error::{ProshotsError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// An image carried inline as base64, the form the generative API accepts and returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String, // Base64 encoded
}

impl InlineImage {
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: STANDARD.encode(bytes),
        }
    }

    /// Parses `data:<mime>;base64,<payload>`.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| ProshotsError::InvalidImage("expected a data URL".into()))?;
        let (mime_type, data) = rest.split_once(";base64,").ok_or_else(|| {
            ProshotsError::InvalidImage("data URL is not base64 encoded".into())
        })?;

        if mime_type.is_empty() || mime_type.contains(';') {
            return Err(ProshotsError::InvalidImage(format!(
                "unsupported media type '{}'",
                mime_type
            )));
        }
        if data.is_empty() {
            return Err(ProshotsError::InvalidImage("empty image payload".into()));
        }
        STANDARD
            .decode(data)
            .map_err(|e| ProshotsError::InvalidImage(format!("payload is not valid base64: {}", e)))?;

        Ok(Self {
            mime_type: mime_type.to_string(),
            data: data.to_string(),
        })
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(&self.data)
            .map_err(|e| ProshotsError::InvalidImage(e.to_string()))
    }

    /// File extension matching the media type, used when writing results to disk.
    pub fn extension(&self) -> &str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }
}
