//! homeguard-core — Face matching and alert decisions for capture events.
//!
//! Normalizes face descriptors, finds the nearest enrolled identity in a
//! per-user gallery snapshot, and classifies each capture as a known person,
//! an unknown person, or motion only. Stateless: every call depends only on
//! its arguments.

pub mod assess;
pub mod descriptor;
pub mod matcher;
pub mod policy;
pub mod types;

pub use assess::{assess, Assessment, RecognitionSettings};
pub use descriptor::{distance, normalize, FaceDescriptor, InvalidDescriptor};
pub use matcher::{EuclideanMatcher, Matcher, DEFAULT_MATCH_THRESHOLD};
pub use policy::{classify, AlertPolicy, CaptureClass, CaptureVerdict};
pub use types::{EnrolledIdentity, MatchResult};
