//! Batch reference building: extract every trusted slip of an account.

use thiserror::Error;
use tracing::{info, warn};
use validaja_core::{MIN_REFERENCE_DOCUMENTS, StructuredDocument};

use crate::{DocumentExtractor, ExtractError};

/// A document to extract, with the name it was uploaded under.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

#[derive(Debug, Error)]
pub enum ReferenceBuildError {
    #[error("failed to extract {filename}: {source}")]
    Extraction {
        filename: String,
        #[source]
        source: ExtractError,
    },

    #[error("a reference set needs at least {min} documents, got {found}")]
    TooFewDocuments { found: usize, min: usize },
}

/// Extract each file in order and tag it with its filename.
///
/// All or nothing: the first extraction failure aborts the batch, so a
/// reference set is never built from a subset of what the user supplied.
pub async fn build_reference_set<E>(
    extractor: &E,
    files: &[SourceFile],
) -> Result<Vec<StructuredDocument>, ReferenceBuildError>
where
    E: DocumentExtractor + ?Sized,
{
    if files.len() < MIN_REFERENCE_DOCUMENTS {
        return Err(ReferenceBuildError::TooFewDocuments {
            found: files.len(),
            min: MIN_REFERENCE_DOCUMENTS,
        });
    }

    let mut documents = Vec::with_capacity(files.len());
    for (i, file) in files.iter().enumerate() {
        let mut doc = extractor.extract(&file.bytes).await.map_err(|source| {
            warn!(file = %file.filename, error = %source, "reference extraction failed");
            ReferenceBuildError::Extraction {
                filename: file.filename.clone(),
                source,
            }
        })?;
        doc.source_filename = Some(file.filename.clone());
        info!(file = %file.filename, n = i + 1, total = files.len(), "extracted reference slip");
        documents.push(doc);
    }
    Ok(documents)
}
