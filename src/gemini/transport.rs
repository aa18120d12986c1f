use crate::{
    config::GeminiConfig,
    error::{ProshotsError, Result},
    models::{GenerateContentRequest, GenerateContentResponse},
    resilience::RemoteFailure,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// The remote `generateContent` capability.
#[async_trait]
pub trait GenerativeTransport: Send + Sync {
    async fn generate_content(
        &self,
        api_key: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> std::result::Result<GenerateContentResponse, RemoteFailure>;
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: Option<u16>,
    message: Option<String>,
    status: Option<String>,
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ProshotsError::ConfigError(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl GenerativeTransport for HttpTransport {
    async fn generate_content(
        &self,
        api_key: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> std::result::Result<GenerateContentResponse, RemoteFailure> {
        log::debug!("POST {}", self.endpoint(model));

        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| RemoteFailure::Network(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RemoteFailure::Network(format!("reading response failed: {}", e)))?;

        if !status.is_success() {
            log::error!("Gemini returned HTTP {}", status.as_u16());
            return Err(failure_from_body(status.as_u16(), &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| RemoteFailure::Message(format!("unreadable response body: {}", e)))
    }
}

pub(crate) fn failure_from_body(code: u16, body: &str) -> RemoteFailure {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => RemoteFailure::Status {
            code: envelope.error.code.unwrap_or(code),
            status: envelope.error.status,
            message: envelope
                .error
                .message
                .unwrap_or_else(|| format!("HTTP {}", code)),
        },
        Err(_) => RemoteFailure::Status {
            code,
            status: None,
            message: if body.trim().is_empty() {
                format!("HTTP {}", code)
            } else {
                body.trim().to_string()
            },
        },
    }
}
