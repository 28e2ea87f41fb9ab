//! Read side of the results tree: historical runs, stored reports and
//! zip packaging of a run's artifacts.

pub mod archive;
pub mod catalog;

pub use archive::{archive_file_name, build_archive, collect_result_files};
pub use catalog::ResultsStore;

#[derive(Debug, thiserror::Error)]
pub enum ResultsError {
    #[error("{what} not found for run `{run_id}`")]
    NotFound { run_id: String, what: &'static str },
    #[error("invalid run id `{run_id}`: {reason}")]
    InvalidRunId { run_id: String, reason: String },
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to build archive: {0}")]
    Archive(#[from] zip::result::ZipError),
}

impl ResultsError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidRunId { .. } => "validation",
            Self::Io { .. } | Self::Archive(_) => "internal",
        }
    }
}

pub(crate) fn io_error(path: &std::path::Path, source: std::io::Error) -> ResultsError {
    ResultsError::Io {
        path: path.display().to_string(),
        source,
    }
}
