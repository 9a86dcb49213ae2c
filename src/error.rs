// Error kinds shared across the crate.
//
// Every fallible operation returns `Result<T>`; the binary maps any error to
// a single categorised line on stderr and a non-zero exit code.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed file, bad CLI argument, or an out-of-range parameter.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A store insertion violated position or coverage invariants.
    #[error("invalid store row: {0}")]
    InvalidRow(String),

    /// A bulk coverage operation across unequal domains.
    #[error("coverage domain mismatch: {lhs} vs {rhs}")]
    DomainMismatch { lhs: usize, rhs: usize },

    /// Binary store format mismatch or truncation.
    #[error("store corrupt: {0}")]
    StoreCorrupt(String),

    /// Driver cancellation or timeout; partial results may exist.
    #[error("search cancelled")]
    Cancelled,

    /// Should be impossible; indicates a bug.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Short category tag used by the CLI for its one-line report.
    pub fn category(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "invalid-input",
            Error::InvalidRow(_) => "invalid-row",
            Error::DomainMismatch { .. } => "domain-mismatch",
            Error::StoreCorrupt(_) => "store-corrupt",
            Error::Cancelled => "cancelled",
            Error::InternalInvariant(_) => "internal",
            Error::Io { .. } => "io",
        }
    }
}
