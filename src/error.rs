use thiserror::Error;

/// errors raised while loading tabular files, building scripts, or talking to a database.
#[derive(Error, Debug)]
pub enum EtlError {
    /// the file extension is not accepted by the operation.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// the underlying reader failed to parse the file.
    #[error("Error reading {path}: {message}")]
    ParseFailure { path: String, message: String },

    /// a script handed to the writer does not have the expected layout.
    #[error("Malformed SQL script: {0}")]
    MalformedScript(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// column lengths or names break the dataset invariants.
    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("Unknown encoding '{0}'")]
    Encoding(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl EtlError {
    pub(crate) fn parse(path: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        EtlError::ParseFailure {
            path: path.into(),
            message: cause.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
