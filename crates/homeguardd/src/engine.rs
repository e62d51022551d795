use std::sync::Arc;

use chrono::{DateTime, Utc};
use homeguard_core::{
    assess, normalize, CaptureVerdict, EnrolledIdentity, EuclideanMatcher, InvalidDescriptor,
    RecognitionSettings,
};
use homeguard_store::{
    ActivityAction, ActivityEntry, CaptureRecord, CaptureStats, FaceStore, IdentitySummary,
    NewCapture, StoreError,
};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::embedder::Embedder;
use crate::notifier::{Alert, AlertKind, AlertNotifier};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(#[from] InvalidDescriptor),
    #[error("engine task exited")]
    ChannelClosed,
}

/// Where a capture's face descriptor comes from, resolved before matching.
#[derive(Debug, Clone, PartialEq)]
pub enum DescriptorSource {
    /// Computed on the client (e.g. in the browser).
    Supplied(Vec<f32>),
    /// Encoded image to hand to the embedding service.
    Image(Vec<u8>),
    /// Motion only; nothing to match.
    Absent,
}

impl DescriptorSource {
    /// A non-empty client descriptor wins; otherwise fall back to the image.
    pub fn resolve(descriptor: Option<Vec<f32>>, image: Vec<u8>) -> Self {
        match descriptor {
            Some(d) if !d.is_empty() => DescriptorSource::Supplied(d),
            _ if !image.is_empty() => DescriptorSource::Image(image),
            _ => DescriptorSource::Absent,
        }
    }
}

/// One motion event reported by a camera client.
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub user: String,
    pub source: DescriptorSource,
    pub motion_confidence: Option<u8>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// Result of processing a capture.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureOutcome {
    pub capture_id: String,
    pub verdict: CaptureVerdict,
    /// Distance to the matched identity, for audit.
    pub match_distance: Option<f32>,
    /// The capture raised an alert (mirrors `verdict.should_alert`).
    pub alert_sent: bool,
    /// The alert reached the notifier.
    pub notified: bool,
}

/// Runtime settings for the engine.
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    pub recognition: RecognitionSettings,
    pub notifications_enabled: bool,
}

/// Messages sent from D-Bus handlers to the engine task.
enum EngineRequest {
    SubmitCapture {
        request: CaptureRequest,
        reply: oneshot::Sender<Result<CaptureOutcome, EngineError>>,
    },
    Enroll {
        user: String,
        name: String,
        descriptor: Vec<f32>,
        description: String,
        reply: oneshot::Sender<Result<EnrolledIdentity, EngineError>>,
    },
    ListIdentities {
        user: String,
        reply: oneshot::Sender<Result<Vec<IdentitySummary>, EngineError>>,
    },
    RemoveIdentity {
        user: String,
        id: String,
        reply: oneshot::Sender<Result<bool, EngineError>>,
    },
    RecentCaptures {
        user: String,
        limit: usize,
        reply: oneshot::Sender<Result<Vec<CaptureRecord>, EngineError>>,
    },
    DeleteCapture {
        user: String,
        id: String,
        reply: oneshot::Sender<Result<bool, EngineError>>,
    },
    CaptureStats {
        user: String,
        reply: oneshot::Sender<Result<CaptureStats, EngineError>>,
    },
    LatestCaptureSince {
        user: String,
        since: DateTime<Utc>,
        reply: oneshot::Sender<Result<Option<CaptureRecord>, EngineError>>,
    },
    RecentActivity {
        user: String,
        limit: usize,
        reply: oneshot::Sender<Result<Vec<ActivityEntry>, EngineError>>,
    },
}

/// Clone-safe handle to the engine task.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, EngineError>>) -> EngineRequest,
    ) -> Result<T, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)?
    }

    /// Classify a capture, log it, and alert if needed.
    pub async fn submit_capture(
        &self,
        request: CaptureRequest,
    ) -> Result<CaptureOutcome, EngineError> {
        self.request(|reply| EngineRequest::SubmitCapture { request, reply })
            .await
    }

    /// Normalize and enroll a face for `user`.
    pub async fn enroll(
        &self,
        user: &str,
        name: &str,
        descriptor: Vec<f32>,
        description: &str,
    ) -> Result<EnrolledIdentity, EngineError> {
        self.request(|reply| EngineRequest::Enroll {
            user: user.to_string(),
            name: name.to_string(),
            descriptor,
            description: description.to_string(),
            reply,
        })
        .await
    }

    pub async fn list_identities(&self, user: &str) -> Result<Vec<IdentitySummary>, EngineError> {
        self.request(|reply| EngineRequest::ListIdentities {
            user: user.to_string(),
            reply,
        })
        .await
    }

    pub async fn remove_identity(&self, user: &str, id: &str) -> Result<bool, EngineError> {
        self.request(|reply| EngineRequest::RemoveIdentity {
            user: user.to_string(),
            id: id.to_string(),
            reply,
        })
        .await
    }

    pub async fn recent_captures(
        &self,
        user: &str,
        limit: usize,
    ) -> Result<Vec<CaptureRecord>, EngineError> {
        self.request(|reply| EngineRequest::RecentCaptures {
            user: user.to_string(),
            limit,
            reply,
        })
        .await
    }

    pub async fn delete_capture(&self, user: &str, id: &str) -> Result<bool, EngineError> {
        self.request(|reply| EngineRequest::DeleteCapture {
            user: user.to_string(),
            id: id.to_string(),
            reply,
        })
        .await
    }

    /// Capture counts for `user` as of now.
    pub async fn capture_stats(&self, user: &str) -> Result<CaptureStats, EngineError> {
        self.request(|reply| EngineRequest::CaptureStats {
            user: user.to_string(),
            reply,
        })
        .await
    }

    /// Newest capture of `user` detected after `since`, for client polling.
    pub async fn latest_capture_since(
        &self,
        user: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<CaptureRecord>, EngineError> {
        self.request(|reply| EngineRequest::LatestCaptureSince {
            user: user.to_string(),
            since,
            reply,
        })
        .await
    }

    pub async fn recent_activity(
        &self,
        user: &str,
        limit: usize,
    ) -> Result<Vec<ActivityEntry>, EngineError> {
        self.request(|reply| EngineRequest::RecentActivity {
            user: user.to_string(),
            limit,
            reply,
        })
        .await
    }
}

struct Engine {
    store: FaceStore,
    embedder: Arc<dyn Embedder>,
    notifier: Arc<dyn AlertNotifier>,
    settings: EngineSettings,
}

/// Spawn the engine task on the current tokio runtime.
pub fn spawn_engine(
    store: FaceStore,
    embedder: Arc<dyn Embedder>,
    notifier: Arc<dyn AlertNotifier>,
    settings: EngineSettings,
) -> EngineHandle {
    let (tx, mut rx) = mpsc::channel::<EngineRequest>(16);
    let engine = Engine {
        store,
        embedder,
        notifier,
        settings,
    };

    tokio::spawn(async move {
        tracing::info!("engine task started");
        while let Some(req) = rx.recv().await {
            match req {
                EngineRequest::SubmitCapture { request, reply } => {
                    let _ = reply.send(engine.run_capture(request).await);
                }
                EngineRequest::Enroll {
                    user,
                    name,
                    descriptor,
                    description,
                    reply,
                } => {
                    let result = engine.run_enroll(&user, &name, &descriptor, &description).await;
                    let _ = reply.send(result);
                }
                EngineRequest::ListIdentities { user, reply } => {
                    let result = engine.store.list_identities(&user).await.map_err(Into::into);
                    let _ = reply.send(result);
                }
                EngineRequest::RemoveIdentity { user, id, reply } => {
                    let _ = reply.send(engine.run_remove(&user, &id).await);
                }
                EngineRequest::RecentCaptures { user, limit, reply } => {
                    let result = engine
                        .store
                        .recent_captures(&user, limit)
                        .await
                        .map_err(Into::into);
                    let _ = reply.send(result);
                }
                EngineRequest::DeleteCapture { user, id, reply } => {
                    let _ = reply.send(engine.run_delete_capture(&user, &id).await);
                }
                EngineRequest::CaptureStats { user, reply } => {
                    let result = engine
                        .store
                        .capture_stats(&user, Utc::now())
                        .await
                        .map_err(Into::into);
                    let _ = reply.send(result);
                }
                EngineRequest::LatestCaptureSince { user, since, reply } => {
                    let result = engine
                        .store
                        .latest_capture_since(&user, since)
                        .await
                        .map_err(Into::into);
                    let _ = reply.send(result);
                }
                EngineRequest::RecentActivity { user, limit, reply } => {
                    let result = engine
                        .store
                        .recent_activity(&user, limit)
                        .await
                        .map_err(Into::into);
                    let _ = reply.send(result);
                }
            }
        }
        tracing::info!("engine task exiting");
    });

    EngineHandle { tx }
}

impl Engine {
    /// Resolve the descriptor, match against a fresh gallery snapshot, log, alert.
    async fn run_capture(&self, request: CaptureRequest) -> Result<CaptureOutcome, EngineError> {
        let detected_at = Utc::now();
        let raw = self.resolve_descriptor(request.source).await;

        // An unreadable gallery degrades to "nobody is known"; the capture is still logged.
        let gallery = match self.store.active_gallery(&request.user).await {
            Ok(gallery) => gallery,
            Err(err) => {
                tracing::warn!(
                    user = %request.user,
                    error = %err,
                    "gallery unavailable; matching against nobody"
                );
                Vec::new()
            }
        };
        let assessment = assess(
            raw.as_deref(),
            &gallery,
            &self.settings.recognition,
            &EuclideanMatcher,
        );
        let verdict = assessment.verdict;
        let recognized_identity_id = assessment.best_match.as_ref().map(|m| m.identity.id.clone());

        let record = self
            .store
            .record_capture(
                &request.user,
                NewCapture {
                    detected_at,
                    motion_confidence: request.motion_confidence,
                    location: request.location,
                    notes: request.notes,
                    verdict: verdict.clone(),
                    recognized_identity_id: recognized_identity_id.clone(),
                },
            )
            .await?;

        tracing::info!(
            user = %request.user,
            capture = %record.id,
            class = ?verdict.classification(),
            identity = ?verdict.matched_identity_name,
            confidence = ?verdict.match_confidence_percent,
            alert = verdict.should_alert,
            "capture processed"
        );

        if let Some(id) = &recognized_identity_id {
            if let Err(err) = self.store.touch_last_seen(id, detected_at).await {
                tracing::warn!(identity = %id, error = %err, "failed to update last seen");
            }
        }

        self.record_activity(
            &record.user,
            ActivityAction::Capture,
            "New motion detected",
            serde_json::json!({
                "capture_id": record.id,
                "motion_confidence": record.motion_confidence,
                "face_detected": verdict.face_detected,
                "face_recognized": verdict.face_recognized,
            }),
        )
        .await;

        let notified = verdict.should_alert && self.dispatch_alert(&record).await;

        Ok(CaptureOutcome {
            capture_id: record.id,
            match_distance: assessment.best_match.map(|m| m.distance),
            alert_sent: verdict.should_alert,
            notified,
            verdict,
        })
    }

    async fn resolve_descriptor(&self, source: DescriptorSource) -> Option<Vec<f32>> {
        match source {
            DescriptorSource::Supplied(values) => Some(values),
            DescriptorSource::Absent => None,
            DescriptorSource::Image(image) => {
                let embedder = Arc::clone(&self.embedder);
                match tokio::task::spawn_blocking(move || embedder.embed(&image)).await {
                    Ok(Ok(descriptor)) => descriptor.filter(|d| !d.is_empty()),
                    Ok(Err(err)) => {
                        tracing::warn!(error = %err, "embedding failed; capture is faceless");
                        None
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "embedding task panicked");
                        None
                    }
                }
            }
        }
    }

    /// Hand an alert for `record` to the notifier. Returns whether it was accepted.
    async fn dispatch_alert(&self, record: &CaptureRecord) -> bool {
        if !self.settings.notifications_enabled {
            tracing::debug!(capture = %record.id, "notifications disabled; alert not dispatched");
            return false;
        }

        let alert = Alert {
            kind: AlertKind::from_verdict(&record.verdict),
            user: record.user.clone(),
            capture_id: record.id.clone(),
            detected_at: record.detected_at,
            motion_confidence: record.motion_confidence,
            matched_identity_name: record.verdict.matched_identity_name.clone(),
            match_confidence_percent: record.verdict.match_confidence_percent,
        };

        if let Err(err) = self.notifier.notify(&alert) {
            tracing::error!(capture = %record.id, error = %err, "alert notification failed");
            return false;
        }

        if let Err(err) = self.store.mark_notified(&record.id).await {
            tracing::error!(capture = %record.id, error = %err, "failed to flag alert as notified");
        }
        true
    }

    async fn run_enroll(
        &self,
        user: &str,
        name: &str,
        descriptor: &[f32],
        description: &str,
    ) -> Result<EnrolledIdentity, EngineError> {
        let descriptor = normalize(descriptor)?;
        let identity = self.store.enroll(user, name, &descriptor, description).await?;
        self.record_activity(
            user,
            ActivityAction::FaceAdd,
            "Face added to database",
            serde_json::json!({ "face_id": identity.id, "face_name": identity.display_name }),
        )
        .await;
        Ok(identity)
    }

    async fn run_remove(&self, user: &str, id: &str) -> Result<bool, EngineError> {
        let removed = self.store.deactivate(user, id).await?;
        if removed {
            tracing::info!(user = %user, identity = %id, "face removed");
            self.record_activity(
                user,
                ActivityAction::FaceDelete,
                "Face removed from database",
                serde_json::json!({ "face_id": id }),
            )
            .await;
        }
        Ok(removed)
    }

    async fn run_delete_capture(&self, user: &str, id: &str) -> Result<bool, EngineError> {
        let deleted = self.store.delete_capture(user, id).await?;
        if deleted {
            tracing::info!(user = %user, capture = %id, "capture deleted");
            self.record_activity(
                user,
                ActivityAction::CaptureDelete,
                "Capture deleted",
                serde_json::json!({ "capture_id": id }),
            )
            .await;
        }
        Ok(deleted)
    }

    /// Activity logging never fails the operation it describes.
    async fn record_activity(
        &self,
        user: &str,
        action: ActivityAction,
        details: &str,
        metadata: serde_json::Value,
    ) {
        if let Err(err) = self.store.log_activity(user, action, details, metadata).await {
            tracing::warn!(
                user = %user,
                action = action.as_str(),
                error = %err,
                "activity log failed"
            );
        }
    }
}
