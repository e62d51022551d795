//! End-to-end assessment of one capture: normalize, match, classify.

use serde::{Deserialize, Serialize};

use crate::descriptor::normalize;
use crate::matcher::{Matcher, DEFAULT_MATCH_THRESHOLD};
use crate::policy::{AlertPolicy, CaptureVerdict};
use crate::types::{EnrolledIdentity, MatchResult};

/// Tunables for recognizing captures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecognitionSettings {
    /// Maximum descriptor distance that still counts as a match.
    pub match_threshold: f32,
    pub policy: AlertPolicy,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            policy: AlertPolicy::default(),
        }
    }
}

/// Verdict for a capture plus the match that produced it (for audit logging).
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub verdict: CaptureVerdict,
    pub best_match: Option<MatchResult>,
}

/// Assess a capture given its raw descriptor (if any) and a gallery snapshot.
///
/// A descriptor that cannot be normalized is treated as no face at all.
pub fn assess(
    raw_descriptor: Option<&[f32]>,
    gallery: &[EnrolledIdentity],
    settings: &RecognitionSettings,
    matcher: &dyn Matcher,
) -> Assessment {
    let query = match raw_descriptor.map(normalize) {
        None => None,
        Some(Ok(query)) => Some(query),
        Some(Err(err)) => {
            tracing::warn!(error = %err, "unusable face descriptor; treating capture as faceless");
            None
        }
    };

    let Some(query) = query else {
        return Assessment {
            verdict: settings.policy.classify(false, None),
            best_match: None,
        };
    };

    let best_match = matcher.find_best_match(&query, gallery, settings.match_threshold);
    Assessment {
        verdict: settings.policy.classify(true, best_match.as_ref()),
        best_match,
    }
}
