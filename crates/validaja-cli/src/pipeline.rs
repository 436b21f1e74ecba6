//! Register and verify flows: extraction, storage and classification wired
//! together.

use std::path::Path;

use anyhow::{Context, bail, ensure};
use serde::Serialize;
use tracing::info;
use validaja_ai::{DocumentExtractor, SourceFile, build_reference_set};
use validaja_core::{MIN_REFERENCE_DOCUMENTS, StructuredDocument, VerdictResult, classify};
use validaja_store::{AccountSummary, ReferenceStore};

/// A verified candidate and the verdict it received.
#[derive(Debug, Serialize)]
pub struct Verification {
    pub account: String,
    pub candidate: StructuredDocument,
    pub verdict: VerdictResult,
}

/// Extract every trusted slip and save them as a new account.
///
/// Refuses to overwrite an existing account; remove it first.
pub async fn register(
    store: &dyn ReferenceStore,
    extractor: &dyn DocumentExtractor,
    account: &str,
    files: Vec<SourceFile>,
) -> anyhow::Result<(AccountSummary, Vec<StructuredDocument>)> {
    ensure!(!account.trim().is_empty(), "account name must not be empty");
    ensure!(
        files.len() >= MIN_REFERENCE_DOCUMENTS,
        "select at least {MIN_REFERENCE_DOCUMENTS} trusted PDFs, got {}",
        files.len()
    );
    if store.exists(account)? {
        bail!("an account named '{account}' already exists; choose another name");
    }

    info!(account, files = files.len(), "registering reference account");
    let documents = build_reference_set(extractor, &files)
        .await
        .context("extracting reference slips")?;
    let summary = store
        .put(account, documents.clone())
        .context("saving reference account")?;
    Ok((summary, documents))
}

/// Extract `file` and classify it against the references of `account`.
///
/// The account is looked up first so an unknown name never costs an
/// extraction call.
pub async fn verify(
    store: &dyn ReferenceStore,
    extractor: &dyn DocumentExtractor,
    account: &str,
    file: SourceFile,
) -> anyhow::Result<Verification> {
    let references = store
        .require(account)
        .with_context(|| format!("loading references for '{account}'"))?;

    let candidate = extractor
        .extract(&file.bytes)
        .await
        .with_context(|| format!("extracting {}", file.filename))?;

    let verdict = classify(&references, &candidate).context("classifying candidate")?;
    info!(
        account,
        file = %file.filename,
        recommendation = %verdict.recommendation,
        confidence = verdict.confidence,
        "verification complete"
    );
    Ok(Verification {
        account: account.to_string(),
        candidate,
        verdict,
    })
}

pub fn read_source_file(path: &Path) -> anyhow::Result<SourceFile> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SourceFile::new(filename, bytes))
}

/// Load an already-extracted record (the JSON the extractor produces).
pub fn read_document_json(path: &Path) -> anyhow::Result<StructuredDocument> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let doc: StructuredDocument = serde_json::from_str(&text)
        .with_context(|| format!("parsing {} as a boleto record", path.display()))?;
    Ok(doc.scrubbed())
}
