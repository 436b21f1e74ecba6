use async_trait::async_trait;
use thiserror::Error;
use validaja_core::StructuredDocument;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("document is empty")]
    EmptyDocument,

    #[cfg(feature = "gemini")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("extraction service returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("extraction service returned no content")]
    EmptyResponse,

    #[error("extracted record is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("extraction refused by the model: {0}")]
    Blocked(String),
}

/// Anything that can read a boleto PDF into a [`StructuredDocument`].
///
/// The classifier never sees an extractor; callers extract first and only
/// classify what extracted successfully.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(&self, pdf: &[u8]) -> Result<StructuredDocument, ExtractError>;
}
