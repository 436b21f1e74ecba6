//! Storage layer: named reference accounts, each holding the trusted boletos
//! of one payee.

mod error;
mod json;

pub use error::StoreError;
pub use json::JsonStore;

pub use validaja_core::MIN_REFERENCE_DOCUMENTS;

use serde::{Deserialize, Serialize};
use validaja_core::StructuredDocument;

/// Shown in summaries when the first reference lacks a field.
const NOT_AVAILABLE: &str = "N/A";

/// A stored reference account: summary fields plus every trusted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceAccount {
    #[serde(flatten)]
    pub summary: AccountSummary,
    pub reference_documents: Vec<StructuredDocument>,
}

/// Listing view of an account, without its documents.
///
/// Payee fields are copied from the first reference document at
/// registration time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub account_name: String,
    pub payee_name: String,
    pub payee_document_id: String,
    pub issuing_bank_code: String,
    pub document_count: usize,
    /// RFC 3339, UTC.
    pub created_at: String,
}

impl ReferenceAccount {
    /// Build an account from freshly extracted documents.
    pub fn new(
        account_name: &str,
        documents: Vec<StructuredDocument>,
    ) -> Result<Self, StoreError> {
        if documents.len() < MIN_REFERENCE_DOCUMENTS {
            return Err(StoreError::TooFewDocuments {
                found: documents.len(),
                min: MIN_REFERENCE_DOCUMENTS,
            });
        }
        let base = &documents[0];
        let or_na = |v: &Option<String>| v.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let summary = AccountSummary {
            account_name: account_name.to_string(),
            payee_name: or_na(&base.payee_name),
            payee_document_id: or_na(&base.payee_document_id),
            issuing_bank_code: or_na(&base.issuing_bank_code),
            document_count: documents.len(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        Ok(Self {
            summary,
            reference_documents: documents,
        })
    }
}

/// Persist and retrieve named reference sets.
pub trait ReferenceStore {
    /// Reference documents of an account, or `None` if it does not exist.
    fn get(&self, account_name: &str) -> Result<Option<Vec<StructuredDocument>>, StoreError>;

    /// Create or replace an account. Fails with fewer than
    /// [`MIN_REFERENCE_DOCUMENTS`] documents.
    fn put(
        &self,
        account_name: &str,
        documents: Vec<StructuredDocument>,
    ) -> Result<AccountSummary, StoreError>;

    /// All accounts, sorted by name.
    fn list(&self) -> Result<Vec<AccountSummary>, StoreError>;

    /// Remove an account. Returns `false` if it did not exist.
    fn delete(&self, account_name: &str) -> Result<bool, StoreError>;

    fn exists(&self, account_name: &str) -> Result<bool, StoreError> {
        Ok(self.get(account_name)?.is_some())
    }

    /// Like [`get`](Self::get), but a missing account is an error.
    fn require(&self, account_name: &str) -> Result<Vec<StructuredDocument>, StoreError> {
        self.get(account_name)?
            .ok_or_else(|| StoreError::AccountNotFound(account_name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: Option<&str>) -> StructuredDocument {
        StructuredDocument {
            payee_name: name.map(Into::into),
            issuing_bank_code: Some("341".into()),
            ..Default::default()
        }
    }

    #[test]
    fn account_needs_two_documents() {
        let err = ReferenceAccount::new("rent", vec![doc(Some("ACME"))]).unwrap_err();
        assert!(matches!(err, StoreError::TooFewDocuments { found: 1, min: 2 }));
    }

    #[test]
    fn summary_taken_from_first_document() {
        let account = ReferenceAccount::new("rent", vec![doc(Some("ACME")), doc(Some("Other"))])
            .unwrap();
        assert_eq!(account.summary.account_name, "rent");
        assert_eq!(account.summary.payee_name, "ACME");
        assert_eq!(account.summary.payee_document_id, "N/A");
        assert_eq!(account.summary.issuing_bank_code, "341");
        assert_eq!(account.summary.document_count, 2);
        assert!(chrono::DateTime::parse_from_rfc3339(&account.summary.created_at).is_ok());
    }

    #[test]
    fn account_json_is_flat() {
        let account = ReferenceAccount::new("rent", vec![doc(None), doc(None)]).unwrap();
        let value = serde_json::to_value(&account).unwrap();
        assert_eq!(value["account_name"], "rent");
        assert_eq!(value["document_count"], 2);
        assert_eq!(value["reference_documents"].as_array().unwrap().len(), 2);
    }
}
