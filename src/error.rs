use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("InvalidData: {0}")]
    InvalidData(String),

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Store: {0}")]
    Store(String),

    /// A child row reached the store before its parent's identifier was
    /// known. Programming error in the write protocol, never recoverable.
    #[error("Write order violated: {0}")]
    WriteOrder(String),

    #[error("{0}")]
    General(String),
}
