//! Document understanding: turns boleto PDFs into [`StructuredDocument`]s
//! through a multimodal LLM, and builds reference sets from batches of them.
//!
//! [`StructuredDocument`]: validaja_core::StructuredDocument

mod extractor;
mod reference;

pub use extractor::{DocumentExtractor, ExtractError};
pub use reference::{ReferenceBuildError, SourceFile, build_reference_set};

#[cfg(feature = "gemini")]
mod gemini;
#[cfg(feature = "gemini")]
pub use gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL, GeminiConfig, GeminiExtractor};
