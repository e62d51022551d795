//! Capture classification and alert policy.

use serde::{Deserialize, Serialize};

use crate::types::MatchResult;

/// What a single capture event turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureClass {
    /// Motion without an identifiable face.
    MotionOnly,
    KnownPerson,
    UnknownPerson,
}

/// Detection, recognition and alert status for one capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureVerdict {
    pub face_detected: bool,
    pub face_recognized: bool,
    pub matched_identity_name: Option<String>,
    pub match_confidence_percent: Option<u8>,
    pub should_alert: bool,
}

impl CaptureVerdict {
    pub fn classification(&self) -> CaptureClass {
        match (self.face_detected, self.face_recognized) {
            (_, true) => CaptureClass::KnownPerson,
            (true, false) => CaptureClass::UnknownPerson,
            (false, false) => CaptureClass::MotionOnly,
        }
    }
}

/// Alert decision rules.
///
/// With the default policy, a capture alerts exactly when the face was not
/// recognized. `alert_on_recognized` makes known faces alert as well.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertPolicy {
    #[serde(default)]
    pub alert_on_recognized: bool,
}

impl AlertPolicy {
    /// Classify a capture from face presence and the matcher's result.
    pub fn classify(&self, face_present: bool, best_match: Option<&MatchResult>) -> CaptureVerdict {
        match (face_present, best_match) {
            (false, _) => CaptureVerdict {
                face_detected: false,
                face_recognized: false,
                matched_identity_name: None,
                match_confidence_percent: None,
                should_alert: true,
            },
            (true, Some(m)) => CaptureVerdict {
                face_detected: true,
                face_recognized: true,
                matched_identity_name: Some(m.identity.display_name.clone()),
                match_confidence_percent: Some(m.confidence_percent),
                should_alert: self.alert_on_recognized,
            },
            (true, None) => CaptureVerdict {
                face_detected: true,
                face_recognized: false,
                matched_identity_name: None,
                match_confidence_percent: None,
                should_alert: true,
            },
        }
    }
}

/// Classify with the default policy.
pub fn classify(face_present: bool, best_match: Option<&MatchResult>) -> CaptureVerdict {
    AlertPolicy::default().classify(face_present, best_match)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FaceDescriptor;
    use crate::types::EnrolledIdentity;

    fn alice_match() -> MatchResult {
        MatchResult {
            identity: EnrolledIdentity {
                id: "1".into(),
                display_name: "Alice".into(),
                descriptor: FaceDescriptor::from_normalized(vec![0.6, 0.8]),
                active: true,
                last_seen_at: None,
            },
            distance: 0.12,
            confidence_percent: 80,
        }
    }

    #[test]
    fn test_no_face_alerts() {
        let v = classify(false, None);
        assert!(!v.face_detected);
        assert!(!v.face_recognized);
        assert!(v.should_alert);
        assert_eq!(v.classification(), CaptureClass::MotionOnly);
    }

    #[test]
    fn test_no_face_ignores_match() {
        // A stray match without a face present still counts as motion only.
        let m = alice_match();
        let v = classify(false, Some(&m));
        assert!(!v.face_detected);
        assert!(v.matched_identity_name.is_none());
        assert!(v.should_alert);
    }

    #[test]
    fn test_known_face_does_not_alert() {
        let m = alice_match();
        let v = classify(true, Some(&m));
        assert!(v.face_detected);
        assert!(v.face_recognized);
        assert_eq!(v.matched_identity_name.as_deref(), Some("Alice"));
        assert_eq!(v.match_confidence_percent, Some(80));
        assert!(!v.should_alert);
        assert_eq!(v.classification(), CaptureClass::KnownPerson);
    }

    #[test]
    fn test_unknown_face_alerts() {
        let v = classify(true, None);
        assert!(v.face_detected);
        assert!(!v.face_recognized);
        assert!(v.should_alert);
        assert_eq!(v.classification(), CaptureClass::UnknownPerson);
    }

    #[test]
    fn test_alert_tracks_recognition_under_default_policy() {
        let m = alice_match();
        let cases = [(false, None), (false, Some(&m)), (true, None), (true, Some(&m))];
        for (present, matched) in cases {
            let v = classify(present, matched);
            assert_eq!(v.should_alert, !v.face_recognized);
        }
    }

    #[test]
    fn test_alert_on_recognized_switch() {
        let policy = AlertPolicy { alert_on_recognized: true };
        let m = alice_match();
        let v = policy.classify(true, Some(&m));
        assert!(v.face_recognized);
        assert!(v.should_alert);
        assert!(policy.classify(true, None).should_alert);
    }
}
