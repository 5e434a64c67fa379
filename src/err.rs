//! Error types shared by the whole crate.

/// Errors produced while resolving, annotating, or classifying a sequence variant.
///
/// Every variant bubbles to the top of the engine invocation unchanged. The
/// engine never downgrades a failure into a `NotPVS1` verdict.
#[derive(thiserror::Error, Debug, Clone)]
pub enum Error {
    /// Input did not match any accepted grammar and the remote normalizer also failed.
    #[error("could not parse variant: {0}")]
    ParseError(String),

    /// Coordinates violate the invariants of the variant identity model.
    #[error("invalid variant position: {0}")]
    InvalidPosition(String),

    /// A required upstream field (strand, exons, selected transcript, consequence, ...)
    /// is absent after the transcript selector and annotation client ran.
    #[error("missing required data: {0}")]
    MissingData(String),

    /// The upstream payload was present but unusable (unparseable body, missing field).
    #[error("invalid API response: {0}")]
    InvalidApiResponse(String),

    /// An internal invariant inside a predicate was violated.
    #[error("internal algorithm error: {0}")]
    AlgorithmError(String),

    /// Transport-level failure talking to an annotation or splicing-prediction collaborator.
    #[error("connection error: {0}")]
    ConnectionError(String),

    /// An upstream cancellation token fired between two predicates.
    #[error("classification was cancelled")]
    Cancelled,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
