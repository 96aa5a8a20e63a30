use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum FoldBenchError {
    #[error("malformed artifact {path}: {message}")]
    MalformedArtifact { path: PathBuf, message: String },

    #[error("missing sibling artifact: {0}")]
    MissingSibling(PathBuf),

    #[error("structure file not found: {0}")]
    MissingStructure(PathBuf),

    #[error("unsupported structure format: {0}")]
    UnsupportedStructureFormat(String),

    #[error("structure conversion failed: {0}")]
    Conversion(String),

    #[error("structural alignment failed: {0}")]
    Alignment(String),

    #[error("required tool not found: {0}")]
    MissingTool(String),

    #[error("failed to read table {path}: {message}")]
    #[diagnostic(help("the benchmark table must be a readable comma-separated file"))]
    TableRead { path: PathBuf, message: String },

    #[error("failed to write table {path}: {message}")]
    TableWrite { path: PathBuf, message: String },

    #[error("no .csv table found in {0}")]
    #[diagnostic(help("pass the table explicitly with --table"))]
    TableMissing(PathBuf),

    #[error("invalid table layout: {0}")]
    TableFormat(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl FoldBenchError {
    /// Errors that abort a whole run. Everything else is recorded against a
    /// single artifact and the scan moves on.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FoldBenchError::TableRead { .. }
                | FoldBenchError::TableWrite { .. }
                | FoldBenchError::TableMissing(_)
                | FoldBenchError::TableFormat(_)
                | FoldBenchError::ConfigRead(_)
                | FoldBenchError::ConfigParse(_)
                | FoldBenchError::Filesystem(_)
        )
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        FoldBenchError::MalformedArtifact {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
