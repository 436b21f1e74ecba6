use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a reference account needs at least {min} documents, got {found}")]
    TooFewDocuments { found: usize, min: usize },

    #[error("reference account not found: {0}")]
    AccountNotFound(String),

    #[error("io error on {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not replace store file: {0}")]
    Persist(#[from] tempfile::PersistError),
}
