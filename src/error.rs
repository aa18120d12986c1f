use std::fmt;

/// A remote failure mapped to the kind that drives retry, skip, and abort decisions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifiedError {
    #[error("Authentication failure: {message}")]
    AuthFailure {
        message: String,
        /// Set when the key is fine but the model or resource is not enabled for it.
        model_unavailable: bool,
    },
    #[error("Safety block: {message}")]
    SafetyBlock { message: String },
    #[error("Quota exceeded: {message}")]
    QuotaExceeded { message: String },
    #[error("Transient failure: {message}")]
    TransientFailure { message: String },
    #[error("Unknown failure: {message}")]
    Unknown { message: String },
}

impl ClassifiedError {
    pub fn missing_credential() -> Self {
        ClassifiedError::AuthFailure {
            message: "API_KEY_MISSING".to_string(),
            model_unavailable: false,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ClassifiedError::AuthFailure { message, .. }
            | ClassifiedError::SafetyBlock { message }
            | ClassifiedError::QuotaExceeded { message }
            | ClassifiedError::TransientFailure { message }
            | ClassifiedError::Unknown { message } => message,
        }
    }

    /// Quota and transient failures are worth another attempt after a backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClassifiedError::QuotaExceeded { .. } | ClassifiedError::TransientFailure { .. }
        )
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ClassifiedError::AuthFailure { .. })
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ClassifiedError::AuthFailure { .. } => "auth_failure",
            ClassifiedError::SafetyBlock { .. } => "safety_block",
            ClassifiedError::QuotaExceeded { .. } => "quota_exceeded",
            ClassifiedError::TransientFailure { .. } => "transient_failure",
            ClassifiedError::Unknown { .. } => "unknown",
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProshotsError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    #[error(transparent)]
    Remote(#[from] ClassifiedError),
    #[error("Response error: {0}")]
    ResponseError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("No artifacts produced after {attempted} attempts")]
    NoArtifacts { attempted: usize },
    #[error("Operation cancelled")]
    Cancelled,
}

impl ProshotsError {
    pub fn classified(&self) -> Option<&ClassifiedError> {
        match self {
            ProshotsError::Remote(classified) => Some(classified),
            _ => None,
        }
    }

    /// Auth failures end the whole session, every other failure is scoped to one call.
    pub fn is_session_fatal(&self) -> bool {
        self.classified().map_or(false, ClassifiedError::is_auth)
    }

    pub fn notice(&self) -> UserNotice {
        match self {
            ProshotsError::Remote(ClassifiedError::AuthFailure { .. }) => {
                UserNotice::NeedCredentials
            }
            ProshotsError::Remote(ClassifiedError::SafetyBlock { .. }) => {
                UserNotice::ContentBlocked
            }
            ProshotsError::Remote(ClassifiedError::QuotaExceeded { .. }) => {
                UserNotice::RateLimited
            }
            _ => UserNotice::Unexpected,
        }
    }
}

/// The distinctions a user interface must be able to show for any failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserNotice {
    NeedCredentials,
    ContentBlocked,
    RateLimited,
    Unexpected,
}

impl UserNotice {
    pub fn message(&self) -> &'static str {
        match self {
            UserNotice::NeedCredentials => {
                "An API key is required. Sync a valid key and make sure the model is enabled for it."
            }
            UserNotice::ContentBlocked => {
                "The request was blocked by the content policy. Try different photos."
            }
            UserNotice::RateLimited => "The service is rate limited. Please retry in a moment.",
            UserNotice::Unexpected => "An unexpected failure occurred.",
        }
    }
}

impl fmt::Display for UserNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

pub type Result<T> = std::result::Result<T, ProshotsError>;
