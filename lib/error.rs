//! Error types for subsystem registration and superoperator assembly.
//!
//! Every failure is a precondition violation detected before any matrix entry
//! is emitted, so an `Err` from a public call always means the matrix was left
//! untouched by that call. Failures reported by the [sparse
//! backend][crate::backend::SparseBackend] are the one exception: they are
//! passed through unchanged from wherever the backend raises them.

use thiserror::Error;
use crate::backend::BackendError;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors produced while building a Liouvillian.
#[derive(Debug, Error)]
pub enum Error {
    /// More subsystems were requested than the registry is configured to hold.
    #[error("too many subsystems: capacity is {max}")]
    CapacityExceeded { max: usize },

    /// The composite Hilbert-space dimension would not fit in a `usize`.
    #[error("composite dimension overflows: {total} × {levels} levels")]
    DimensionOverflow { total: usize, levels: usize },

    /// A subsystem was requested with fewer than two levels.
    #[error("a subsystem needs at least two levels, got {0}")]
    InvalidLevels(usize),

    /// A subsystem was added after the first Hamiltonian or Lindblad term.
    #[error("cannot add subsystems after Hamiltonian or Lindblad terms have been added")]
    FinalizedState,

    /// A Hamiltonian or Lindblad term was added before any subsystem existed.
    #[error("subsystems must be created before adding Hamiltonian or Lindblad terms")]
    UninitializedRuntime,

    /// A product mixes operator types that cannot be combined.
    #[error("invalid operator combination: {0}")]
    InvalidOperatorCombination(String),

    /// Two basis-transition operators from different subsystems were combined.
    #[error(
        "basis operators belong to different subsystems \
        (n_before = {n_before_a} vs {n_before_b})"
    )]
    CrossSubspaceMismatch { n_before_a: usize, n_before_b: usize },

    /// A three-operator product does not have a supported shape.
    #[error("unsupported operator combination: {0}")]
    UnsupportedCombination(String),

    /// Error raised by the sparse-matrix backend.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// Invalid configuration values.
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed TOML configuration.
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O failure while writing diagnostics.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure writing an `.npy` diagnostic file.
    #[error("npy error: {0}")]
    Npy(#[from] ndarray_npy::WriteNpyError),
}

impl Error {
    pub(crate) fn invalid_combination<S>(msg: S) -> Self
    where S: Into<String>
    {
        Self::InvalidOperatorCombination(msg.into())
    }

    pub(crate) fn unsupported<S>(msg: S) -> Self
    where S: Into<String>
    {
        Self::UnsupportedCombination(msg.into())
    }
}
