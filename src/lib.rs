//! ProShots: AI portrait generation on top of the Gemini `generateContent` API.
//!
//! A [`PortraitSession`] analyzes a handful of reference photos into an
//! [`AttributeProfile`], then generates styled variants one call at a time.
//! Every remote call goes through a [`RetryController`] that classifies
//! failures and backs off on rate limits.

pub mod config;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod models;
pub mod resilience;
pub mod workflow;

pub use config::{Config, GeminiConfig};
pub use error::{ClassifiedError, ProshotsError, Result, UserNotice};
pub use gemini::{GeminiClient, GenerativeTransport, HttpTransport, ImageClient, ProfileClient};
pub use models::{
    ArtifactCategory, AttributeProfile, GeneratedArtifact, InlineImage, StyleSelection,
    ToolAction, ToolKind,
};
pub use resilience::{
    classify, CredentialProvider, RemoteFailure, RetryController, RetryPolicy, SessionCredentials,
};
pub use workflow::{PortraitSession, SessionState, VariantBatch, VariantGenerator};

pub use tokio_util::sync::CancellationToken;
