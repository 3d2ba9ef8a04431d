use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    /// The tree root is missing, inaccessible, trashed or not configured.
    /// Raised before any table is written.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Source error: {0}")]
    Source(String),

    #[error("Table error: {0}")]
    Table(String),

    /// A row number was used after the rows it was computed from shifted.
    #[error("Stale row index: id {id} no longer at row {row}")]
    StaleRowIndex { id: String, row: usize },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IndexError>;
