//! JSON-file reference store.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};
use validaja_core::StructuredDocument;

use crate::{AccountSummary, ReferenceAccount, ReferenceStore, StoreError};

type Accounts = BTreeMap<String, ReferenceAccount>;

/// Reference store backed by a single pretty-printed JSON file.
///
/// The file holds one object keyed by account name. It is read on every
/// operation and rewritten atomically (temp file in the same directory, then
/// rename) on every change, so a crash mid-write never leaves a truncated
/// store behind.
///
/// A missing file reads as an empty store. A file that exists but does not
/// parse is an error rather than silently treated as empty.
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    /// Open a store at `path`. Nothing is created until the first write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Accounts, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "store file absent, starting empty");
                return Ok(Accounts::new());
            }
            Err(source) => return Err(self.io_error(source)),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Accounts::new());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn save(&self, accounts: &Accounts) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        serde_json::to_writer_pretty(&mut tmp, accounts)?;
        tmp.write_all(b"\n").map_err(|source| self.io_error(source))?;
        tmp.persist(&self.path)?;
        Ok(())
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ReferenceStore for JsonStore {
    fn get(&self, account_name: &str) -> Result<Option<Vec<StructuredDocument>>, StoreError> {
        Ok(self
            .load()?
            .remove(account_name)
            .map(|account| account.reference_documents))
    }

    fn put(
        &self,
        account_name: &str,
        documents: Vec<StructuredDocument>,
    ) -> Result<AccountSummary, StoreError> {
        let account = ReferenceAccount::new(account_name, documents)?;
        let summary = account.summary.clone();

        let mut accounts = self.load()?;
        let replaced = accounts.insert(account_name.to_string(), account).is_some();
        self.save(&accounts)?;

        info!(
            account = account_name,
            documents = summary.document_count,
            replaced,
            "saved reference account"
        );
        Ok(summary)
    }

    fn list(&self) -> Result<Vec<AccountSummary>, StoreError> {
        Ok(self
            .load()?
            .into_values()
            .map(|account| account.summary)
            .collect())
    }

    fn delete(&self, account_name: &str) -> Result<bool, StoreError> {
        let mut accounts = self.load()?;
        if accounts.remove(account_name).is_none() {
            return Ok(false);
        }
        self.save(&accounts)?;
        info!(account = account_name, "removed reference account");
        Ok(true)
    }

    fn exists(&self, account_name: &str) -> Result<bool, StoreError> {
        Ok(self.load()?.contains_key(account_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn slip(our_number: &str) -> StructuredDocument {
        StructuredDocument {
            payee_name: Some("Escola Primavera".into()),
            payee_document_id: Some("11.222.333/0001-44".into()),
            issuing_bank_code: Some("001".into()),
            digitable_line: Some("00190.00009 01234.567004 00000.001016 7 99990000045000".into()),
            our_number: Some(our_number.into()),
            ..Default::default()
        }
    }

    fn temp_store() -> (tempfile::TempDir, JsonStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("data").join("accounts.json"));
        (dir, store)
    }

    #[test]
    fn missing_file_is_empty_store() {
        let (_dir, store) = temp_store();
        assert!(store.list().unwrap().is_empty());
        assert!(store.get("school").unwrap().is_none());
        assert!(!store.exists("school").unwrap());
    }

    #[test]
    fn put_then_get_roundtrips_documents() {
        let (_dir, store) = temp_store();
        let docs = vec![slip("1/001-1"), slip("1/002-2")];
        let summary = store.put("school", docs.clone()).unwrap();
        assert_eq!(summary.document_count, 2);
        assert_eq!(summary.payee_name, "Escola Primavera");

        assert!(store.path().exists(), "parent directory should be created");
        assert_eq!(store.get("school").unwrap(), Some(docs));
        assert!(store.exists("school").unwrap());
    }

    #[test]
    fn put_rejects_single_document() {
        let (_dir, store) = temp_store();
        let err = store.put("school", vec![slip("1")]).unwrap_err();
        assert!(matches!(err, StoreError::TooFewDocuments { found: 1, .. }));
        assert!(!store.path().exists());
    }

    #[test]
    fn put_replaces_same_name() {
        let (_dir, store) = temp_store();
        store.put("school", vec![slip("1"), slip("2")]).unwrap();
        store
            .put("school", vec![slip("3"), slip("4"), slip("5")])
            .unwrap();
        let accounts = store.list().unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].document_count, 3);
    }

    #[test]
    fn list_sorted_by_name() {
        let (_dir, store) = temp_store();
        store.put("water", vec![slip("1"), slip("2")]).unwrap();
        store.put("electricity", vec![slip("1"), slip("2")]).unwrap();
        store.put("rent", vec![slip("1"), slip("2")]).unwrap();
        let names: Vec<String> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|s| s.account_name)
            .collect();
        assert_eq!(names, vec!["electricity", "rent", "water"]);
    }

    #[test]
    fn delete_reports_whether_removed() {
        let (_dir, store) = temp_store();
        store.put("school", vec![slip("1"), slip("2")]).unwrap();
        assert!(store.delete("school").unwrap());
        assert!(!store.delete("school").unwrap());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn require_missing_account_is_error() {
        let (_dir, store) = temp_store();
        let err = store.require("nope").unwrap_err();
        assert!(matches!(err, StoreError::AccountNotFound(name) if name == "nope"));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let (_dir, store) = temp_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{ not json").unwrap();
        assert!(matches!(store.list(), Err(StoreError::Json(_))));
    }

    #[test]
    fn store_survives_reopen() {
        let (dir, store) = temp_store();
        store.put("school", vec![slip("1"), slip("2")]).unwrap();
        let path = store.path().to_path_buf();
        drop(store);

        let reopened = JsonStore::open(path);
        assert!(reopened.exists("school").unwrap());
        drop(dir);
    }
}
