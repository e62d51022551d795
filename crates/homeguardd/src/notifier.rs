//! Alert notifications for suspicious captures.

use chrono::{DateTime, Utc};
use homeguard_core::{CaptureClass, CaptureVerdict};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("notification transport failed: {0}")]
    Transport(String),
}

/// Why a capture raised an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    UnknownPerson,
    MotionOnly,
    /// Only raised when the policy alerts on recognized faces too.
    RecognizedPerson,
}

impl AlertKind {
    pub fn from_verdict(verdict: &CaptureVerdict) -> Self {
        match verdict.classification() {
            CaptureClass::KnownPerson => AlertKind::RecognizedPerson,
            CaptureClass::UnknownPerson => AlertKind::UnknownPerson,
            CaptureClass::MotionOnly => AlertKind::MotionOnly,
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            AlertKind::UnknownPerson => "Unknown person detected",
            AlertKind::MotionOnly => "Motion detected (no face identified)",
            AlertKind::RecognizedPerson => "Recognized person detected",
        }
    }
}

/// A single alert, ready for delivery.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub user: String,
    pub capture_id: String,
    pub detected_at: DateTime<Utc>,
    pub motion_confidence: Option<u8>,
    pub matched_identity_name: Option<String>,
    pub match_confidence_percent: Option<u8>,
}

/// Delivers alerts to the household (email, push, ...).
pub trait AlertNotifier: Send + Sync {
    fn notify(&self, alert: &Alert) -> Result<(), NotifyError>;
}

/// Emits alerts as structured log events.
pub struct LogNotifier;

impl AlertNotifier for LogNotifier {
    fn notify(&self, alert: &Alert) -> Result<(), NotifyError> {
        tracing::warn!(
            user = %alert.user,
            capture = %alert.capture_id,
            kind = ?alert.kind,
            detected_at = %alert.detected_at,
            motion_confidence = ?alert.motion_confidence,
            identity = ?alert.matched_identity_name,
            "ALERT: {}",
            alert.kind.headline()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homeguard_core::classify;

    #[test]
    fn test_alert_kind_from_verdict() {
        assert_eq!(AlertKind::from_verdict(&classify(false, None)), AlertKind::MotionOnly);
        assert_eq!(AlertKind::from_verdict(&classify(true, None)), AlertKind::UnknownPerson);
    }

    #[test]
    fn test_headlines_distinguish_kinds() {
        assert_ne!(AlertKind::MotionOnly.headline(), AlertKind::UnknownPerson.headline());
    }
}
