//! Error types for rendering.

/// Fault reported by a canvas.
///
/// Faults are sticky: once a canvas has failed it reports the same fault
/// from every later drawing call, which is why the error is `Clone`.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum CanvasError {
    /// The requested font family is not available.
    #[error("Unknown font family: {0}")]
    UnknownFont(String),
    /// Writing the output failed.
    #[error("I/O error: {0}")]
    Io(String),
    /// Any other canvas failure.
    #[error("Canvas fault: {0}")]
    Fault(String),
    /// A page header or footer failed to draw.
    #[error("Page decoration failed: {0}")]
    Decoration(String),
}

/// Error returned by [`Document`](crate::Document) rendering.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The canvas reported a fault; the partial output is invalid.
    #[error(transparent)]
    Canvas(#[from] CanvasError),
    /// The display list could not be serialized.
    #[error("Failed to serialize display list: {0}")]
    Serialize(#[from] serde_json::Error),
}
