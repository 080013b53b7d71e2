use thiserror::Error;

/// Failure of the external text-to-image backend.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct BackendError(pub String);

/// Per-node decoration failures. None of these abort a render: the visitor
/// logs them and moves on, so the worst case is one missing decoration.
#[derive(Debug, Error)]
pub enum DecorateError {
    /// Offset → position translation failed, typically a stale offset after
    /// a concurrent edit.
    #[error("offset {offset} outside document of length {len}")]
    RangeResolution { offset: usize, len: usize },

    /// The node's source text did not match the decorator's expected
    /// sub-pattern.
    #[error("node text did not match the expected pattern")]
    MalformedNode,

    /// The asynchronous render backend failed or is not ready yet.
    #[error("external render failed: {0}")]
    ExternalRender(#[from] BackendError),
}
