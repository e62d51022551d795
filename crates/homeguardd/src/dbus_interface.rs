use chrono::{DateTime, Utc};
use homeguard_store::CaptureRecord;
use serde::Deserialize;
use zbus::interface;

use crate::engine::{CaptureRequest, DescriptorSource, EngineError, EngineHandle};

/// JSON body of a `SubmitCapture` call.
#[derive(Debug, Deserialize)]
struct CaptureSubmission {
    #[serde(default)]
    descriptor: Option<Vec<f32>>,
    #[serde(default)]
    motion_confidence: Option<u8>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

/// D-Bus interface for the Homeguard capture monitor.
///
/// Bus name: org.homeguard.Monitor1
/// Object path: /org/homeguard/Monitor1
pub struct MonitorService {
    pub engine: EngineHandle,
}

#[interface(name = "org.homeguard.Monitor1")]
impl MonitorService {
    /// Classify a capture. `request` is JSON; `image` may be empty.
    async fn submit_capture(
        &self,
        user: &str,
        request: &str,
        image: Vec<u8>,
    ) -> zbus::fdo::Result<String> {
        let submission: CaptureSubmission = serde_json::from_str(request)
            .map_err(|e| zbus::fdo::Error::InvalidArgs(format!("capture request: {e}")))?;

        let outcome = self
            .engine
            .submit_capture(CaptureRequest {
                user: user.to_string(),
                source: DescriptorSource::resolve(submission.descriptor, image),
                motion_confidence: submission.motion_confidence,
                location: submission.location,
                notes: submission.notes,
            })
            .await
            .map_err(to_fdo)?;

        to_json(&outcome)
    }

    /// Enroll a face for `user`. `descriptor` is a JSON array of numbers.
    async fn enroll(
        &self,
        user: &str,
        name: &str,
        descriptor: &str,
        description: &str,
    ) -> zbus::fdo::Result<String> {
        tracing::info!(user, name, "enroll requested");
        let values: Vec<f32> = serde_json::from_str(descriptor)
            .map_err(|e| zbus::fdo::Error::InvalidArgs(format!("descriptor: {e}")))?;
        let identity = self
            .engine
            .enroll(user, name, values, description)
            .await
            .map_err(to_fdo)?;
        Ok(identity.id)
    }

    /// List active enrolled faces for `user` as JSON.
    async fn list_identities(&self, user: &str) -> zbus::fdo::Result<String> {
        let list = self.engine.list_identities(user).await.map_err(to_fdo)?;
        to_json(&list)
    }

    /// Soft-delete an enrolled face.
    async fn remove_identity(&self, user: &str, id: &str) -> zbus::fdo::Result<bool> {
        tracing::info!(user, id, "remove_identity requested");
        self.engine.remove_identity(user, id).await.map_err(to_fdo)
    }

    /// Most recent captures for `user` as JSON, newest first.
    async fn recent_captures(&self, user: &str, limit: u32) -> zbus::fdo::Result<String> {
        let records = self
            .engine
            .recent_captures(user, limit as usize)
            .await
            .map_err(to_fdo)?;
        to_json(&records)
    }

    /// Permanently delete one of `user`'s captures.
    async fn delete_capture(&self, user: &str, id: &str) -> zbus::fdo::Result<bool> {
        tracing::info!(user, id, "delete_capture requested");
        self.engine.delete_capture(user, id).await.map_err(to_fdo)
    }

    /// Capture counts (total, today, last 7 and 30 days) for `user` as JSON.
    async fn capture_stats(&self, user: &str) -> zbus::fdo::Result<String> {
        let stats = self.engine.capture_stats(user).await.map_err(to_fdo)?;
        to_json(&stats)
    }

    /// Report whether `user` has a capture newer than `since` (RFC 3339).
    async fn check_new(&self, user: &str, since: &str) -> zbus::fdo::Result<String> {
        let since = parse_since(since)?;
        let latest = self
            .engine
            .latest_capture_since(user, since)
            .await
            .map_err(to_fdo)?;
        to_json(&new_capture_report(latest))
    }

    /// Most recent activity log entries for `user` as JSON, newest first.
    async fn recent_activity(&self, user: &str, limit: u32) -> zbus::fdo::Result<String> {
        let entries = self
            .engine
            .recent_activity(user, limit as usize)
            .await
            .map_err(to_fdo)?;
        to_json(&entries)
    }

    /// Return daemon status information.
    async fn status(&self) -> zbus::fdo::Result<String> {
        Ok(serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "engine": "running",
        })
        .to_string())
    }
}

fn to_fdo(err: EngineError) -> zbus::fdo::Error {
    match err {
        EngineError::InvalidDescriptor(e) => zbus::fdo::Error::InvalidArgs(e.to_string()),
        other => zbus::fdo::Error::Failed(other.to_string()),
    }
}

fn parse_since(raw: &str) -> zbus::fdo::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| zbus::fdo::Error::InvalidArgs(format!("since: {e}")))
}

fn new_capture_report(latest: Option<CaptureRecord>) -> serde_json::Value {
    serde_json::json!({
        "new_capture": latest.is_some(),
        "capture": latest,
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> zbus::fdo::Result<String> {
    serde_json::to_string(value).map_err(|e| zbus::fdo::Error::Failed(e.to_string()))
}
