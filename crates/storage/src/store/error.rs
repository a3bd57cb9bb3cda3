#![forbid(unsafe_code)]

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("not found: {0}")]
    NotFound(&'static str),
    #[error("conflict: {0}")]
    Conflict(&'static str),
    #[error("file rename conflict at {}", destination.display())]
    FileRenameConflict { destination: PathBuf },
    /// A follow-up step failed after the primary write had committed.
    /// Logged by the caller; never returned from a public operation.
    #[error("partial failure in {step}: {source}")]
    PartialFailure {
        step: &'static str,
        #[source]
        source: Box<StoreError>,
    },
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "IO",
            Self::Sql(_) => "SQL",
            Self::InvalidArgument(message) if message.starts_with("RESET_REQUIRED") => {
                "RESET_REQUIRED"
            }
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::FileRenameConflict { .. } => "FILE_RENAME_CONFLICT",
            Self::PartialFailure { .. } => "PARTIAL_FAILURE",
        }
    }

    pub(crate) fn partial(step: &'static str, source: StoreError) -> Self {
        Self::PartialFailure {
            step,
            source: Box::new(source),
        }
    }
}

impl From<inv_core::ids::KeyError> for StoreError {
    fn from(value: inv_core::ids::KeyError) -> Self {
        Self::InvalidArgument(value.message())
    }
}
