//! Nearest-neighbour matching of a query descriptor against a gallery.

use crate::descriptor::FaceDescriptor;
use crate::types::{EnrolledIdentity, MatchResult};

/// Default Euclidean distance cutoff for a positive match.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.6;

/// Strategy for comparing a query descriptor against a gallery of enrolled faces.
pub trait Matcher {
    fn find_best_match(
        &self,
        query: &FaceDescriptor,
        gallery: &[EnrolledIdentity],
        threshold: f32,
    ) -> Option<MatchResult>;
}

/// Linear Euclidean nearest-neighbour matcher.
///
/// Inactive identities and entries with unusable descriptors are skipped.
/// On an exact distance tie the earlier gallery entry wins.
pub struct EuclideanMatcher;

impl Matcher for EuclideanMatcher {
    fn find_best_match(
        &self,
        query: &FaceDescriptor,
        gallery: &[EnrolledIdentity],
        threshold: f32,
    ) -> Option<MatchResult> {
        let mut min_distance = f32::INFINITY;
        let mut best_idx: Option<usize> = None;

        for (i, identity) in gallery.iter().enumerate() {
            if !identity.active || identity.descriptor.is_empty() {
                continue;
            }
            let distance = query.distance(&identity.descriptor);
            if distance < min_distance {
                min_distance = distance;
                best_idx = Some(i);
            }
        }

        let idx = best_idx?;
        // Negated so a NaN threshold never admits a match.
        if !(min_distance < threshold) {
            tracing::debug!(
                distance = min_distance,
                threshold,
                nearest = %gallery[idx].id,
                "no gallery entry within threshold"
            );
            return None;
        }

        let confidence_percent = confidence_percent(min_distance, threshold);
        tracing::debug!(
            identity = %gallery[idx].id,
            distance = min_distance,
            confidence = confidence_percent,
            "gallery match"
        );

        Some(MatchResult {
            identity: gallery[idx].clone(),
            distance: min_distance,
            confidence_percent,
        })
    }
}

/// Map a below-threshold distance to a percentage: 0 distance is 100%.
fn confidence_percent(distance: f32, threshold: f32) -> u8 {
    ((1.0 - distance / threshold) * 100.0).round().clamp(0.0, 100.0) as u8
}
