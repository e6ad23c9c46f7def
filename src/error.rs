//! Error type shared by every numeric operation in the crate.

/// All errors returned by the compute core.
///
/// Every variant is a value-level error handed back to the immediate caller.
/// Nothing in the library panics on malformed input or exits the process.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A matrix with zero rows was passed where rows are required.
    #[error("{op}: empty input")]
    EmptyInput { op: &'static str },

    /// Incompatible vector or matrix shapes.
    #[error("{op}: dimension mismatch, expected {expected}, got {got}")]
    DimensionMismatch {
        op: &'static str,
        expected: usize,
        got: usize,
    },

    /// A row whose length differs from the first row.
    #[error("ragged matrix: row {row} has {got} columns, expected {expected}")]
    RaggedMatrix {
        row: usize,
        expected: usize,
        got: usize,
    },

    /// A class index outside `[0, classes)`.
    #[error("invalid label {label} at sample {sample} (classes: {classes})")]
    InvalidLabel {
        sample: usize,
        label: usize,
        classes: usize,
    },

    /// Layer without valid weights or biases.
    #[error("layer has no valid weights/biases")]
    UninitializedLayer,

    /// Bad input handed to a layer forward pass.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Out-of-range constructor or optimizer parameter.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// `backward` called on a layer that has never run `forward`.
    #[error("backward called before any forward pass")]
    NoForwardPass,
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid_parameter(msg: impl Into<String>) -> Self {
        Error::InvalidParameter(msg.into())
    }

    pub(crate) fn mismatch(op: &'static str, expected: usize, got: usize) -> Self {
        Error::DimensionMismatch { op, expected, got }
    }
}
