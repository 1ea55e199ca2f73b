//! Error types for diagonalization, configuration, and output.

use std::path::PathBuf;
use ndarray_linalg::error::LinalgError;
use thiserror::Error;

/// Reason an otherwise well-shaped diagonalization failed.
#[derive(Debug, Error)]
pub enum NumericCause {
    /// The underlying LAPACK routine reported an error.
    #[error("eigensolver did not converge: {0}")]
    NoConvergence(#[source] LinalgError),

    /// The matrix contains a NaN or infinite element.
    #[error("matrix contains non-finite elements")]
    NonFinite,

    /// The right eigenvectors do not form a basis, so no left eigenvectors
    /// exist.
    #[error("matrix is defective; right eigenvectors are not invertible: {0}")]
    Defective(#[source] LinalgError),
}

/// Returned by [`decompose`][crate::spectral::decompose] and the band sweeps
/// in [`bands`][crate::bands].
#[derive(Debug, Error)]
pub enum SpectralError {
    #[error("expected a non-empty square matrix; got shape ({rows}, {cols})")]
    Shape { rows: usize, cols: usize },

    #[error("diagonalization of {n}x{n} matrix failed: {cause}")]
    Numeric { n: usize, #[source] cause: NumericCause },

    #[error("expected a Hermitian {n}x{n} matrix for real band energies")]
    NotHermitian { n: usize },

    #[error("expected a {expected}x{expected} matrix; got {got}x{got}")]
    DimMismatch { expected: usize, got: usize },
}

pub type SpectralResult<T> = Result<T, SpectralError>;

/// Returned when loading a [`SweepConfig`][crate::config::SweepConfig].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("couldn't read config file {0:?}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("couldn't parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unrecognized key '{0}'")]
    UnknownKey(String),

    #[error("wrong type for key '{0}'")]
    BadType(String),

    #[error("bad value for key '{key}': {reason}")]
    BadValue { key: String, reason: String },
}

/// Returned when writing array data to disk.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("npz write error: {0}")]
    Npz(#[from] ndarray_npy::WriteNpzError),
}
