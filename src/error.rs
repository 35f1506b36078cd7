use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the ingestion pipeline and the query layer.
///
/// `Parse` and `Query` are recovered at file / query granularity by their
/// callers; the rest abort the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to parse {file}: {reason}")]
    Parse { file: PathBuf, reason: String },
    #[error("raw data directory {} does not exist", root.display())]
    MissingRoot { root: PathBuf },
    #[error("no processable match documents found under {}", root.display())]
    EmptyCorpus { root: PathBuf },
    #[error("failed to open store {}: {source}", path.display())]
    StoreOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to replace table '{table}': {source}")]
    StoreWrite {
        table: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("query {id} failed: {source}")]
    Query {
        id: u8,
        #[source]
        source: rusqlite::Error,
    },
    #[error("invalid settings: {0}")]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
