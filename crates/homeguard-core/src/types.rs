use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::descriptor::FaceDescriptor;

/// An enrolled face with metadata, as supplied by the gallery owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrolledIdentity {
    pub id: String,
    pub display_name: String,
    /// Normalized at enrollment time.
    pub descriptor: FaceDescriptor,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub last_seen_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

/// Best gallery candidate for a query descriptor, below the match threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub identity: EnrolledIdentity,
    /// Euclidean distance between query and the matched descriptor.
    pub distance: f32,
    /// Confidence in [0, 100], derived from distance relative to the threshold.
    pub confidence_percent: u8,
}
