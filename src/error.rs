use thiserror::Error;

/// Failure taxonomy of the detection pipeline.
///
/// `ModelLoad` is fatal at startup; the remaining kinds are fatal to their
/// request only. Nothing here is caught and masked inside the crate — the
/// transport layer owns the mapping from error kind to user-visible status.
#[derive(Debug, Error)]
pub enum DetectError {
    /// The graph or label assets could not be loaded or are incompatible.
    #[error("failed to load model: {reason}")]
    ModelLoad { reason: String },

    /// The input could not be used as a pixel grid.
    #[error("failed to decode image: {reason}")]
    ImageDecode { reason: String },

    /// The forward pass failed or the graph outputs do not match the
    /// exported contract. A configuration bug, not bad user input.
    #[error("inference failed: {reason}")]
    Inference { reason: String },

    /// The graph emitted a class index with no corresponding tag name.
    #[error("class index {index} has no label (table holds {len} tags)")]
    LabelIndexOutOfRange { index: i64, len: usize },

    /// An image URL could not be retrieved.
    #[error("failed to fetch image: {reason}")]
    Fetch { reason: String },
}
