use crate::{
    error::{ClassifiedError, ProshotsError, Result},
    gemini::ImageClient,
    logger,
    models::{AttributeProfile, GeneratedArtifact, InlineImage, StyleSelection},
};
use tokio_util::sync::CancellationToken;

/// A generation call that failed without ending the run.
#[derive(Debug, Clone)]
pub struct SkippedVariant {
    pub index: usize,
    pub error: ProshotsError,
}

#[derive(Debug, Clone)]
pub struct VariantBatch {
    pub artifacts: Vec<GeneratedArtifact>,
    pub skipped: Vec<SkippedVariant>,
}

impl VariantBatch {
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }
}

/// Issues `target_count` generation calls one after another.
pub struct VariantGenerator<'a> {
    images: &'a ImageClient,
    target_count: usize,
}

impl<'a> VariantGenerator<'a> {
    pub fn new(images: &'a ImageClient, target_count: usize) -> Self {
        Self {
            images,
            target_count,
        }
    }

    pub fn target_count(&self) -> usize {
        self.target_count
    }

    /// Runs the loop. Per-item failures are skipped; an auth failure aborts
    /// immediately. `on_progress(done, total)` fires after every item.
    pub async fn run<F>(
        &self,
        profile: &AttributeProfile,
        style: StyleSelection,
        references: &[InlineImage],
        mut on_progress: F,
        cancel: Option<&CancellationToken>,
    ) -> Result<VariantBatch>
    where
        F: FnMut(usize, usize),
    {
        if references.is_empty() {
            return Err(ProshotsError::InvalidImage(
                "at least one reference image is required".into(),
            ));
        }

        let total = self.target_count;
        let _timer = logger::timer(&format!("{} variant generation", style.label()));
        let mut artifacts = Vec::with_capacity(total);
        let mut skipped = Vec::new();

        for index in 0..total {
            if cancel.map_or(false, CancellationToken::is_cancelled) {
                log::warn!("Variant generation cancelled after {} of {}", index, total);
                return Err(ProshotsError::Cancelled);
            }

            let reference = &references[index % references.len()];
            match self
                .images
                .generate_variant_cancellable(profile, style, reference, cancel)
                .await
            {
                Ok(artifact) => {
                    log::debug!("Variant {}/{} generated ({})", index + 1, total, artifact.id);
                    artifacts.push(artifact);
                }
                Err(ProshotsError::Remote(auth @ ClassifiedError::AuthFailure { .. })) => {
                    log::error!(
                        "Aborting variant generation at {}/{}: {}",
                        index + 1,
                        total,
                        auth
                    );
                    return Err(auth.into());
                }
                Err(ProshotsError::Cancelled) => return Err(ProshotsError::Cancelled),
                Err(error) => {
                    log::warn!("Skipping variant {}/{}: {}", index + 1, total, error);
                    skipped.push(SkippedVariant { index, error });
                }
            }

            on_progress(index + 1, total);
        }

        if artifacts.is_empty() {
            log::error!("No variants produced out of {} attempts", total);
            return Err(ProshotsError::NoArtifacts { attempted: total });
        }

        log::info!(
            "Generated {} of {} {} variants",
            artifacts.len(),
            total,
            style.label()
        );
        Ok(VariantBatch { artifacts, skipped })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        gemini::transport::mock::{image_response, ScriptedTransport},
        models::sample_profile_json,
        resilience::{RemoteFailure, RetryController, RetryPolicy, SessionCredentials},
    };
    use std::sync::Arc;

    fn image_client(transport: Arc<ScriptedTransport>) -> ImageClient {
        let retry = RetryController::new(Arc::new(SessionCredentials::new(Some("key".into()))));
        ImageClient::new(
            transport,
            retry,
            RetryPolicy::immediate(3),
            RetryPolicy::immediate(2),
            "image-model",
        )
    }

    fn profile() -> AttributeProfile {
        AttributeProfile::from_json(&sample_profile_json()).unwrap()
    }

    fn references(count: usize) -> Vec<InlineImage> {
        (0..count)
            .map(|i| InlineImage::from_bytes("image/jpeg", format!("ref-{}", i).as_bytes()))
            .collect()
    }

    fn safety() -> RemoteFailure {
        RemoteFailure::Blocked {
            reason: "IMAGE_SAFETY".into(),
        }
    }

    #[tokio::test]
    async fn test_safety_failures_are_skipped() {
        let transport = Arc::new(ScriptedTransport::new(|index, _| {
            if [3, 11, 20].contains(&index) {
                Err(safety())
            } else {
                Ok(image_response("aGVsbG8="))
            }
        }));
        let images = image_client(transport.clone());
        let mut progress = Vec::new();

        let batch = VariantGenerator::new(&images, 25)
            .run(
                &profile(),
                StyleSelection::Professional,
                &references(3),
                |done, total| progress.push((done, total)),
                None,
            )
            .await
            .unwrap();

        assert_eq!(batch.artifacts.len(), 22);
        assert_eq!(
            batch.skipped.iter().map(|s| s.index).collect::<Vec<_>>(),
            vec![3, 11, 20]
        );
        assert!(batch.is_partial());
        assert_eq!(progress.len(), 25);
        assert_eq!(progress.first(), Some(&(1, 25)));
        assert_eq!(progress.last(), Some(&(25, 25)));
        assert_eq!(transport.calls(), 25);
    }

    #[tokio::test]
    async fn test_auth_failure_aborts_the_loop() {
        let transport = Arc::new(ScriptedTransport::new(|index, _| {
            if index == 4 {
                Err(RemoteFailure::Status {
                    code: 403,
                    status: Some("PERMISSION_DENIED".into()),
                    message: "API key not valid".into(),
                })
            } else {
                Ok(image_response("aGVsbG8="))
            }
        }));
        let images = image_client(transport.clone());
        let mut reports = 0;

        let result = VariantGenerator::new(&images, 25)
            .run(
                &profile(),
                StyleSelection::Party,
                &references(2),
                |_, _| reports += 1,
                None,
            )
            .await;

        assert!(result.unwrap_err().is_session_fatal());
        assert_eq!(transport.calls(), 5);
        assert_eq!(reports, 4);
    }

    #[tokio::test]
    async fn test_all_failures_is_terminal() {
        let transport = Arc::new(ScriptedTransport::new(|_, _| Err(safety())));
        let images = image_client(transport.clone());
        let mut reports = 0;

        let result = VariantGenerator::new(&images, 25)
            .run(
                &profile(),
                StyleSelection::Dating,
                &references(1),
                |_, _| reports += 1,
                None,
            )
            .await;

        assert!(matches!(
            result,
            Err(ProshotsError::NoArtifacts { attempted: 25 })
        ));
        assert_eq!(reports, 25);
    }

    #[tokio::test]
    async fn test_references_rotate() {
        let transport = Arc::new(ScriptedTransport::new(|_, _| Ok(image_response("aGVsbG8="))));
        let images = image_client(transport.clone());
        let refs = references(3);

        VariantGenerator::new(&images, 5)
            .run(&profile(), StyleSelection::Vacation, &refs, |_, _| {}, None)
            .await
            .unwrap();

        let requests = transport.requests.lock().unwrap();
        let sent: Vec<String> = requests
            .iter()
            .map(|r| r.contents[0].parts[0].inline_data.clone().unwrap().data)
            .collect();
        let expected: Vec<String> = [0, 1, 2, 0, 1].iter().map(|&i| refs[i].data.clone()).collect();
        assert_eq!(sent, expected);
    }

    #[tokio::test]
    async fn test_quota_item_is_retried_then_skipped() {
        let transport = Arc::new(ScriptedTransport::new(|index, _| {
            if index < 3 {
                Err(RemoteFailure::Message("429 Too Many Requests".into()))
            } else {
                Ok(image_response("aGVsbG8="))
            }
        }));
        let images = image_client(transport.clone());

        let batch = VariantGenerator::new(&images, 2)
            .run(&profile(), StyleSelection::Animation2D, &references(1), |_, _| {}, None)
            .await
            .unwrap();

        assert_eq!(batch.artifacts.len(), 1);
        assert_eq!(batch.skipped.len(), 1);
        assert!(matches!(
            batch.skipped[0].error,
            ProshotsError::Remote(ClassifiedError::QuotaExceeded { .. })
        ));
        assert_eq!(transport.calls(), 4);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let transport = Arc::new(ScriptedTransport::new(|_, _| Ok(image_response("aGVsbG8="))));
        let images = image_client(transport.clone());
        let token = CancellationToken::new();
        token.cancel();

        let result = VariantGenerator::new(&images, 25)
            .run(&profile(), StyleSelection::Animation3D, &references(1), |_, _| {}, Some(&token))
            .await;

        assert!(matches!(result, Err(ProshotsError::Cancelled)));
        assert_eq!(transport.calls(), 0);
    }
}
