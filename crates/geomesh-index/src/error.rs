use std::path::PathBuf;

use geomesh_core::CoreError;
use thiserror::Error;

/// Errors raised by the lookup core. None of these are transient.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndexError {
    #[error("cannot build a point index from an empty dataset")]
    EmptyDataset,

    /// The index holds no points; callers must build from a non-empty
    /// dataset before querying.
    #[error("point index is empty; no nearest node can be resolved")]
    EmptyIndex,

    #[error("invalid coordinate for {subject}: {source}")]
    InvalidCoordinate {
        subject: String,
        #[source]
        source: CoreError,
    },
}

impl IndexError {
    pub(crate) fn invalid(subject: impl Into<String>, source: CoreError) -> Self {
        Self::InvalidCoordinate {
            subject: subject.into(),
            source,
        }
    }
}

/// Errors from reading a dataset file as a whole. Individual bad rows are
/// not errors; they are reported through [`crate::SkippedRow`].
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to open dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset is missing a {0} column")]
    MissingColumn(&'static str),
}
