use crate::{
    error::{ProshotsError, Result, UserNotice},
    gemini::GeminiClient,
    models::{AttributeProfile, GeneratedArtifact, InlineImage, StyleSelection},
    workflow::variants::{SkippedVariant, VariantGenerator},
};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    ProfileExtraction,
    Generating { current: usize, total: usize },
    Complete { produced: usize, total: usize },
    Failed { notice: UserNotice, message: String },
}

/// One user's pass through analyze → generate, holding the results until reset.
pub struct PortraitSession {
    client: GeminiClient,
    variant_count: usize,
    state: SessionState,
    style: Option<StyleSelection>,
    profile: Option<AttributeProfile>,
    results: Vec<GeneratedArtifact>,
    skipped: Vec<SkippedVariant>,
    last_error: Option<ProshotsError>,
}

impl PortraitSession {
    pub fn new(client: GeminiClient, variant_count: usize) -> Self {
        Self {
            client,
            variant_count: variant_count.max(1),
            state: SessionState::Idle,
            style: None,
            profile: None,
            results: Vec::new(),
            skipped: Vec::new(),
            last_error: None,
        }
    }

    pub fn client(&self) -> &GeminiClient {
        &self.client
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn style(&self) -> Option<StyleSelection> {
        self.style
    }

    pub fn profile(&self) -> Option<&AttributeProfile> {
        self.profile.as_ref()
    }

    pub fn results(&self) -> &[GeneratedArtifact] {
        &self.results
    }

    pub fn skipped(&self) -> &[SkippedVariant] {
        &self.skipped
    }

    pub fn last_error(&self) -> Option<&ProshotsError> {
        self.last_error.as_ref()
    }

    /// True when the last run failed because credentials must be (re)entered.
    pub fn needs_credentials(&self) -> bool {
        self.last_error
            .as_ref()
            .map_or(false, ProshotsError::is_session_fatal)
    }

    pub fn sync_credentials(&self, key: impl Into<String>) -> bool {
        self.client.sync_credentials(key)
    }

    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.style = None;
        self.profile = None;
        self.results.clear();
        self.skipped.clear();
        self.last_error = None;
    }

    /// Analyzes the photos, then generates the variants for `style`.
    pub async fn run<F>(
        &mut self,
        photos: &[InlineImage],
        style: StyleSelection,
        mut on_progress: F,
        cancel: Option<&CancellationToken>,
    ) -> Result<&[GeneratedArtifact]>
    where
        F: FnMut(usize, usize),
    {
        self.reset();
        self.style = Some(style);
        let total = self.variant_count;

        log::info!("Starting {} session with {} photos", style.label(), photos.len());
        self.state = SessionState::ProfileExtraction;
        let profile = match self
            .client
            .profile()
            .analyze_cancellable(photos, cancel)
            .await {
            Ok(profile) => profile,
            Err(e) => return Err(self.fail(e)),
        };

        self.state = SessionState::Generating { current: 0, total };
        on_progress(0, total);

        let outcome = {
            let state = &mut self.state;
            VariantGenerator::new(self.client.image(), total)
                .run(
                    &profile,
                    style,
                    photos,
                    |current, total| {
                        *state = SessionState::Generating { current, total };
                        on_progress(current, total);
                    },
                    cancel,
                )
                .await
        };
        self.profile = Some(profile);

        match outcome {
            Ok(batch) => {
                self.state = SessionState::Complete {
                    produced: batch.artifacts.len(),
                    total,
                };
                self.results = batch.artifacts;
                self.skipped = batch.skipped;
                Ok(self.results.as_slice())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn fail(&mut self, error: ProshotsError) -> ProshotsError {
        let notice = error.notice();
        log::error!("Session failed ({:?}): {}", notice, error);
        self.state = SessionState::Failed {
            notice,
            message: error.to_string(),
        };
        self.last_error = Some(error.clone());
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        gemini::transport::mock::{image_response, text_response, ScriptedTransport},
        models::{sample_profile_json, GenerateContentRequest, GenerateContentResponse},
        resilience::{RemoteFailure, RetryPolicy, SessionCredentials},
    };
    use std::sync::Arc;

    fn session(transport: Arc<ScriptedTransport>, key: Option<&str>, count: usize) -> PortraitSession {
        let config = Config::new()
            .with_variant_count(count)
            .with_retry_policy(RetryPolicy::immediate(2));
        let credentials = Arc::new(SessionCredentials::new(key.map(String::from)));
        PortraitSession::new(
            GeminiClient::with_transport(&config, transport, credentials),
            config.variant_count,
        )
    }

    fn photos() -> Vec<InlineImage> {
        vec![
            InlineImage::from_bytes("image/jpeg", b"one"),
            InlineImage::from_bytes("image/jpeg", b"two"),
        ]
    }

    // First call is the analysis, the rest are variants.
    fn happy_script(
        index: usize,
        _: &GenerateContentRequest,
    ) -> std::result::Result<GenerateContentResponse, RemoteFailure> {
        if index == 0 {
            Ok(text_response(&sample_profile_json()))
        } else {
            Ok(image_response("aGVsbG8="))
        }
    }

    #[tokio::test]
    async fn test_complete_run() {
        let transport = Arc::new(ScriptedTransport::new(happy_script));
        let mut session = session(transport.clone(), Some("key"), 4);
        let mut progress = Vec::new();

        let produced = session
            .run(&photos(), StyleSelection::Professional, |c, t| progress.push((c, t)), None)
            .await
            .unwrap()
            .len();

        assert_eq!(produced, 4);
        assert_eq!(
            session.state(),
            &SessionState::Complete {
                produced: 4,
                total: 4
            }
        );
        assert!(session.profile().is_some());
        assert_eq!(progress, vec![(0, 4), (1, 4), (2, 4), (3, 4), (4, 4)]);
        assert_eq!(transport.calls(), 5);
    }

    #[tokio::test]
    async fn test_missing_credentials_fails_before_any_call() {
        let transport = Arc::new(ScriptedTransport::new(happy_script));
        let mut session = session(transport.clone(), None, 4);

        let result = session
            .run(&photos(), StyleSelection::Dating, |_, _| {}, None)
            .await;

        assert!(result.is_err());
        assert!(session.needs_credentials());
        assert!(matches!(
            session.state(),
            SessionState::Failed {
                notice: UserNotice::NeedCredentials,
                ..
            }
        ));
        assert_eq!(transport.calls(), 0);

        assert!(session.sync_credentials("fresh-key"));
        session
            .run(&photos(), StyleSelection::Dating, |_, _| {}, None)
            .await
            .unwrap();
        assert!(!session.needs_credentials());
        assert_eq!(session.results().len(), 4);
    }

    #[tokio::test]
    async fn test_analysis_failure_keeps_no_profile() {
        let transport = Arc::new(ScriptedTransport::new(|_, _| {
            Ok(text_response(r#"{"facialStructure": "oval"}"#))
        }));
        let mut session = session(transport.clone(), Some("key"), 3);

        let result = session
            .run(&photos(), StyleSelection::Vacation, |_, _| {}, None)
            .await;

        assert!(matches!(result, Err(ProshotsError::ResponseError(_))));
        assert!(session.profile().is_none());
        assert!(matches!(
            session.state(),
            SessionState::Failed {
                notice: UserNotice::Unexpected,
                ..
            }
        ));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_cancel_during_analysis_returns_promptly() {
        let transport = Arc::new(ScriptedTransport::new(|_, _| {
            Err(RemoteFailure::Message("429 RESOURCE_EXHAUSTED".into()))
        }));
        let config = Config::new().with_variant_count(3).with_retry_policy(
            RetryPolicy::immediate(4).with_base_delay(std::time::Duration::from_secs(10)),
        );
        let credentials = Arc::new(SessionCredentials::new(Some("key".into())));
        let mut session = PortraitSession::new(
            GeminiClient::with_transport(&config, transport.clone(), credentials),
            config.variant_count,
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            session.run(&photos(), StyleSelection::Professional, |_, _| {}, Some(&cancel)),
        )
        .await
        .expect("analysis should stop on cancellation");

        assert!(matches!(result, Err(ProshotsError::Cancelled)));
        assert_eq!(transport.calls(), 1);
        assert!(session.profile().is_none());
    }

    #[tokio::test]
    async fn test_partial_run_records_skips() {
        let transport = Arc::new(ScriptedTransport::new(|index, request| {
            if index == 2 {
                Err(RemoteFailure::Blocked {
                    reason: "SAFETY".into(),
                })
            } else {
                happy_script(index, request)
            }
        }));
        let mut session = session(transport, Some("key"), 3);

        session
            .run(&photos(), StyleSelection::Party, |_, _| {}, None)
            .await
            .unwrap();

        assert_eq!(session.results().len(), 2);
        assert_eq!(session.skipped().len(), 1);
        assert_eq!(session.skipped()[0].index, 1);

        session.reset();
        assert_eq!(session.state(), &SessionState::Idle);
        assert!(session.results().is_empty());
    }
}
