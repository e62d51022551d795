//! Face descriptors: unit-length normalization and Euclidean distance.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a raw embedding cannot be turned into a usable descriptor.
///
/// This signals malformed upstream data, not the absence of a face.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidDescriptor {
    #[error("descriptor is empty")]
    Empty,
    #[error("descriptor has zero magnitude")]
    ZeroMagnitude,
    #[error("descriptor magnitude is not finite")]
    NonFinite,
}

/// Face descriptor vector (typically 128-dim from face-api.js or 512-dim from ArcFace).
///
/// Immutable once built. Descriptors loaded from storage are taken as-is and
/// may be malformed; [`distance`] treats those as maximally dissimilar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceDescriptor {
    values: Vec<f32>,
}

impl FaceDescriptor {
    /// Wrap values that were normalized elsewhere (e.g. at enrollment time).
    pub fn from_normalized(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Euclidean distance to another descriptor. See [`distance`].
    pub fn distance(&self, other: &FaceDescriptor) -> f32 {
        distance(&self.values, &other.values)
    }
}

/// Rescale a raw embedding to unit Euclidean length.
pub fn normalize(values: &[f32]) -> Result<FaceDescriptor, InvalidDescriptor> {
    if values.is_empty() {
        return Err(InvalidDescriptor::Empty);
    }

    // f64 keeps squares of tiny or huge f32 components from under/overflowing.
    let magnitude = values
        .iter()
        .map(|&v| f64::from(v).powi(2))
        .sum::<f64>()
        .sqrt();
    if !magnitude.is_finite() {
        return Err(InvalidDescriptor::NonFinite);
    }
    if magnitude == 0.0 {
        return Err(InvalidDescriptor::ZeroMagnitude);
    }

    Ok(FaceDescriptor {
        values: values
            .iter()
            .map(|&v| (f64::from(v) / magnitude) as f32)
            .collect(),
    })
}

/// Euclidean distance between two descriptors.
///
/// Returns `f32::INFINITY` when either side is empty or the lengths differ,
/// so a malformed gallery entry can never win a match.
pub fn distance(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return f32::INFINITY;
    }

    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(values: &[f32]) -> f32 {
        values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    #[test]
    fn test_normalize_unit_length() {
        let d = normalize(&[3.0, 4.0, 12.0]).unwrap();
        assert!((norm(d.values()) - 1.0).abs() < 1e-6);
        assert!((d.values()[0] - 3.0 / 13.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_idempotent() {
        let once = normalize(&[0.2, -1.7, 5.3, 0.01]).unwrap();
        let twice = normalize(once.values()).unwrap();
        for (a, b) in once.values().iter().zip(twice.values()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_normalize_rejects_empty() {
        assert_eq!(normalize(&[]), Err(InvalidDescriptor::Empty));
    }

    #[test]
    fn test_normalize_rejects_zero_vector() {
        assert_eq!(normalize(&[0.0; 128]), Err(InvalidDescriptor::ZeroMagnitude));
    }

    #[test]
    fn test_normalize_tiny_components() {
        let d = normalize(&[1e-25, 1e-25]).unwrap();
        assert!((d.values()[0] - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
        assert!((norm(d.values()) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_huge_components() {
        let d = normalize(&[1e20, 1e20]).unwrap();
        assert!((d.values()[1] - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
        assert!((norm(d.values()) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_rejects_infinite_component() {
        assert_eq!(normalize(&[f32::INFINITY, 1.0]), Err(InvalidDescriptor::NonFinite));
    }

    #[test]
    fn test_normalize_rejects_nan() {
        assert_eq!(normalize(&[1.0, f32::NAN]), Err(InvalidDescriptor::NonFinite));
    }

    #[test]
    fn test_distance_symmetric() {
        let a = [0.1, 0.5, -0.3];
        let b = [0.4, -0.2, 0.9];
        assert_eq!(distance(&a, &b), distance(&b, &a));
        assert!(distance(&a, &b) > 0.0);
    }

    #[test]
    fn test_distance_self_zero() {
        let a = [0.6, 0.8];
        assert_eq!(distance(&a, &a), 0.0);
    }

    #[test]
    fn test_distance_known_value() {
        assert!((distance(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_distance_length_mismatch_is_infinite() {
        assert_eq!(distance(&[1.0, 2.0], &[1.0, 2.0, 3.0]), f32::INFINITY);
    }

    #[test]
    fn test_distance_empty_is_infinite() {
        assert_eq!(distance(&[], &[]), f32::INFINITY);
        assert_eq!(distance(&[1.0], &[]), f32::INFINITY);
    }

    #[test]
    fn test_descriptor_serializes_as_array() {
        let d = FaceDescriptor::from_normalized(vec![0.6, 0.8]);
        assert_eq!(serde_json::to_string(&d).unwrap(), "[0.6,0.8]");
        let back: FaceDescriptor = serde_json::from_str("[0.6,0.8]").unwrap();
        assert_eq!(back, d);
    }
}
