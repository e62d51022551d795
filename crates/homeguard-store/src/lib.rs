//! homeguard-store — SQLite persistence for face galleries and captures.
//!
//! The store hands the core a fresh snapshot of a user's active identities on
//! every request; nothing is cached between calls.

pub mod models;
mod schema;
pub mod store;

pub use models::{
    ActivityAction, ActivityEntry, CaptureRecord, CaptureStats, IdentitySummary, NewCapture,
};
pub use store::{FaceStore, StoreError};
