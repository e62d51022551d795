//! Boundary to an external face-embedding service.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("embedding service unavailable: {0}")]
    Unavailable(String),
    #[error("embedding failed: {0}")]
    Failed(String),
}

/// Extracts a raw face descriptor from an encoded capture image.
///
/// `Ok(None)` means the service found no face in the image. Implementations
/// may block; the engine calls them off the async runtime.
pub trait Embedder: Send + Sync {
    fn embed(&self, image: &[u8]) -> Result<Option<Vec<f32>>, EmbedError>;
}

/// Used when no embedding service is configured: every image is faceless.
pub struct DisabledEmbedder;

impl Embedder for DisabledEmbedder {
    fn embed(&self, image: &[u8]) -> Result<Option<Vec<f32>>, EmbedError> {
        tracing::debug!(bytes = image.len(), "no embedding service configured; skipping image");
        Ok(None)
    }
}
