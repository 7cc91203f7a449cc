use std::path::PathBuf;

use thiserror::Error;

/// Classified failure raised by [`crate::loader::load`].
///
/// Every variant names the file involved so callers can report it verbatim.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {path:?}")]
    NotFound { path: PathBuf },

    #[error("no data to parse in {path:?}")]
    EmptyData { path: PathBuf },

    #[error("malformed CSV in {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("failed to decode {path:?} as {encoding}")]
    Encoding {
        path: PathBuf,
        encoding: &'static str,
    },

    #[error("permission denied reading {path:?}")]
    PermissionDenied { path: PathBuf },

    #[error("unexpected error loading {path:?}: {message}")]
    Unexpected { path: PathBuf, message: String },
}

impl LoadError {
    pub fn path(&self) -> &PathBuf {
        match self {
            LoadError::NotFound { path }
            | LoadError::EmptyData { path }
            | LoadError::Parse { path, .. }
            | LoadError::Encoding { path, .. }
            | LoadError::PermissionDenied { path }
            | LoadError::Unexpected { path, .. } => path,
        }
    }

    /// Missing and empty inputs are tolerated by the pipeline for optional tables.
    pub fn is_absent_data(&self) -> bool {
        matches!(
            self,
            LoadError::NotFound { .. } | LoadError::EmptyData { .. }
        )
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("column '{column}' not found")]
pub struct ColumnNotFound {
    pub column: String,
}

impl ColumnNotFound {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}
