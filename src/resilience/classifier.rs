use crate::error::ClassifiedError;
use std::fmt;

/// A failed remote call as reported by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteFailure {
    /// No response was received: connect error, timeout, truncated body.
    Network(String),
    /// The service answered with an error status.
    Status {
        code: u16,
        status: Option<String>,
        message: String,
    },
    /// The call succeeded but the content was refused.
    Blocked { reason: String },
    /// Untyped error text, for collaborators that only expose a message.
    Message(String),
}

impl RemoteFailure {
    pub fn message(&self) -> &str {
        match self {
            RemoteFailure::Network(message)
            | RemoteFailure::Status { message, .. }
            | RemoteFailure::Message(message) => message,
            RemoteFailure::Blocked { reason } => reason,
        }
    }
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteFailure::Network(msg) => write!(f, "network failure: {}", msg),
            RemoteFailure::Status {
                code,
                status,
                message,
            } => write!(
                f,
                "HTTP {} {}: {}",
                code,
                status.as_deref().unwrap_or("UNKNOWN"),
                message
            ),
            RemoteFailure::Blocked { reason } => write!(f, "blocked: {}", reason),
            RemoteFailure::Message(msg) => f.write_str(msg),
        }
    }
}

pub fn classify(failure: &RemoteFailure) -> ClassifiedError {
    match failure {
        RemoteFailure::Network(message) => ClassifiedError::TransientFailure {
            message: message.clone(),
        },
        RemoteFailure::Blocked { reason } => ClassifiedError::SafetyBlock {
            message: reason.clone(),
        },
        RemoteFailure::Status {
            code,
            status,
            message,
        } => classify_status(*code, status.as_deref(), message),
        RemoteFailure::Message(message) => classify_message(message),
    }
}

fn classify_status(code: u16, status: Option<&str>, message: &str) -> ClassifiedError {
    let status = status.unwrap_or_default();
    let message = message.to_string();

    if code == 404 || status == "NOT_FOUND" || is_entity_not_found(&message) {
        return ClassifiedError::AuthFailure {
            message,
            model_unavailable: true,
        };
    }
    if code == 401
        || code == 403
        || status == "UNAUTHENTICATED"
        || status == "PERMISSION_DENIED"
        || is_invalid_credential(&message)
    {
        return ClassifiedError::AuthFailure {
            message,
            model_unavailable: false,
        };
    }
    if status == "SAFETY" || is_safety_block(&message) {
        return ClassifiedError::SafetyBlock { message };
    }
    if code == 429 || status == "RESOURCE_EXHAUSTED" || is_quota(&message) {
        return ClassifiedError::QuotaExceeded { message };
    }
    if code >= 500 || matches!(status, "UNAVAILABLE" | "DEADLINE_EXCEEDED" | "INTERNAL") {
        return ClassifiedError::TransientFailure { message };
    }
    ClassifiedError::Unknown { message }
}

/// Substring fallback for errors that carry nothing but text.
pub fn classify_message(message: &str) -> ClassifiedError {
    let owned = message.to_string();
    if is_entity_not_found(message) {
        ClassifiedError::AuthFailure {
            message: owned,
            model_unavailable: true,
        }
    } else if message.contains("401") || message.contains("403") || is_invalid_credential(message)
    {
        ClassifiedError::AuthFailure {
            message: owned,
            model_unavailable: false,
        }
    } else if is_safety_block(message) {
        ClassifiedError::SafetyBlock { message: owned }
    } else if message.contains("429") || is_quota(message) {
        ClassifiedError::QuotaExceeded { message: owned }
    } else {
        ClassifiedError::Unknown { message: owned }
    }
}

fn is_entity_not_found(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("entity was not found") || lower.contains("entity not found")
}

fn is_invalid_credential(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("api key not valid")
        || lower.contains("invalid api key")
        || lower.contains("api_key_invalid")
        || lower.contains("permission denied")
        || lower.contains("permission_denied")
        || lower.contains("unauthenticated")
}

fn is_safety_block(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("safety") || lower.contains("prohibited_content") || lower.contains("content policy")
}

fn is_quota(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("resource_exhausted") || lower.contains("quota")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16, status: &str, message: &str) -> RemoteFailure {
        RemoteFailure::Status {
            code,
            status: Some(status.to_string()),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_entity_not_found_means_model_unavailable() {
        for message in [
            "Requested entity was not found.",
            "[400] requested entity was not found for this key",
            "Entity not found",
        ] {
            assert_eq!(
                classify_message(message),
                ClassifiedError::AuthFailure {
                    message: message.to_string(),
                    model_unavailable: true,
                }
            );
        }

        let failure = status(404, "NOT_FOUND", "models/foo is not found for API version v1beta");
        assert!(matches!(
            classify(&failure),
            ClassifiedError::AuthFailure {
                model_unavailable: true,
                ..
            }
        ));
    }

    #[test]
    fn test_entity_not_found_wins_over_auth_markers() {
        let classified = classify_message("403: Requested entity was not found.");
        assert!(matches!(
            classified,
            ClassifiedError::AuthFailure {
                model_unavailable: true,
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_key_is_auth_failure() {
        let failure = status(
            400,
            "INVALID_ARGUMENT",
            "API key not valid. Please pass a valid API key.",
        );
        assert_eq!(
            classify(&failure),
            ClassifiedError::AuthFailure {
                message: "API key not valid. Please pass a valid API key.".into(),
                model_unavailable: false,
            }
        );
        assert!(classify(&status(403, "PERMISSION_DENIED", "nope")).is_auth());
        assert!(classify_message("HTTP 401 Unauthorized").is_auth());
    }

    #[test]
    fn test_quota_markers() {
        for message in [
            "429 Too Many Requests",
            "RESOURCE_EXHAUSTED: try later",
            "You exceeded your current quota",
        ] {
            assert!(matches!(
                classify_message(message),
                ClassifiedError::QuotaExceeded { .. }
            ));
        }
        assert!(matches!(
            classify(&status(429, "RESOURCE_EXHAUSTED", "slow down")),
            ClassifiedError::QuotaExceeded { .. }
        ));
    }

    #[test]
    fn test_safety_block() {
        assert!(matches!(
            classify(&RemoteFailure::Blocked {
                reason: "IMAGE_SAFETY".into()
            }),
            ClassifiedError::SafetyBlock { .. }
        ));
        assert!(matches!(
            classify_message("Candidate was blocked due to SAFETY"),
            ClassifiedError::SafetyBlock { .. }
        ));
    }

    #[test]
    fn test_network_and_server_errors_are_transient() {
        assert!(matches!(
            classify(&RemoteFailure::Network("connection reset".into())),
            ClassifiedError::TransientFailure { .. }
        ));
        assert!(matches!(
            classify(&status(503, "UNAVAILABLE", "overloaded")),
            ClassifiedError::TransientFailure { .. }
        ));
    }

    #[test]
    fn test_unrecognised_is_unknown() {
        assert!(matches!(
            classify_message("Generation failed."),
            ClassifiedError::Unknown { .. }
        ));
        assert!(matches!(
            classify(&status(400, "INVALID_ARGUMENT", "bad mime type")),
            ClassifiedError::Unknown { .. }
        ));
    }
}
