use chrono::{DateTime, Utc};
use homeguard_core::CaptureVerdict;
use serde::{Deserialize, Serialize};

/// Display view of an enrolled face (no descriptor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentitySummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: Option<DateTime<Utc>>,
}

/// A capture event ready to be logged.
#[derive(Debug, Clone)]
pub struct NewCapture {
    pub detected_at: DateTime<Utc>,
    /// Motion detector confidence in [0, 100], if the client reported one.
    pub motion_confidence: Option<u8>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub verdict: CaptureVerdict,
    pub recognized_identity_id: Option<String>,
}

/// A logged capture event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureRecord {
    pub id: String,
    pub user: String,
    pub detected_at: DateTime<Utc>,
    pub motion_confidence: Option<u8>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub verdict: CaptureVerdict,
    pub recognized_identity_id: Option<String>,
    /// Set when the capture raised an alert, regardless of delivery.
    pub alert_sent: bool,
    /// Whether the alert notification reached the notifier successfully.
    pub notified: bool,
}

/// Capture counts for a user's dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureStats {
    pub total: u64,
    /// Since midnight UTC.
    pub today: u64,
    pub last_7_days: u64,
    pub last_30_days: u64,
}

/// Kinds of events recorded in the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Capture,
    CaptureDelete,
    FaceAdd,
    FaceDelete,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::Capture => "capture",
            ActivityAction::CaptureDelete => "capture_delete",
            ActivityAction::FaceAdd => "face_add",
            ActivityAction::FaceDelete => "face_delete",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "capture" => Some(ActivityAction::Capture),
            "capture_delete" => Some(ActivityAction::CaptureDelete),
            "face_add" => Some(ActivityAction::FaceAdd),
            "face_delete" => Some(ActivityAction::FaceDelete),
            _ => None,
        }
    }
}

/// One activity log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub user: String,
    pub action: ActivityAction,
    pub details: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
