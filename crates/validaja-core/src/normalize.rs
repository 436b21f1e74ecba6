//! Field normalisation for reference comparison.
//!
//! Extractors reproduce whatever formatting is printed on the slip, so the
//! same payee can appear as "12.345.678/0001-90" on one boleto and
//! "12345678000190" on the next. Identity fields are canonicalised before
//! comparison so that formatting noise never reads as a mismatch.
//!
//! # Rules
//!
//! - Names and addresses: trimmed and upper-cased
//! - CPF/CNPJ and bank code: every `.`, `/` and `-` removed, then trimmed
//! - Branch/payee code: trimmed only (its punctuation is significant)
//! - Absent fields become the empty string

use chrono::NaiveDate;

use crate::document::StructuredDocument;

/// Placeholder written by [`shape`] in place of each digit.
pub const SHAPE_DIGIT: char = '#';

const ID_PUNCTUATION: [char; 3] = ['.', '/', '-'];

/// Canonical comparison form of a [`StructuredDocument`].
///
/// Derived on every comparison and never persisted. The variable fields are
/// carried through untouched for context; they are never compared for
/// equality.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedComparisonRecord {
    pub payee_name: String,
    pub payee_document_id: String,
    pub issuing_bank_code: String,
    pub payee_branch_code: String,
    pub payee_address: String,

    pub face_value: Option<f64>,
    pub our_number: Option<String>,
    pub digitable_line: Option<String>,
    pub due_date: Option<NaiveDate>,
}

/// Normalise a document into its comparison form. Never fails.
pub fn normalize(doc: &StructuredDocument) -> NormalizedComparisonRecord {
    NormalizedComparisonRecord {
        payee_name: upper(doc.payee_name.as_deref()),
        payee_document_id: strip_id_punctuation(doc.payee_document_id.as_deref()),
        issuing_bank_code: strip_id_punctuation(doc.issuing_bank_code.as_deref()),
        payee_branch_code: doc.payee_branch_code.as_deref().unwrap_or("").trim().to_string(),
        payee_address: upper(doc.payee_address.as_deref()),

        face_value: doc.face_value,
        our_number: doc.our_number.clone(),
        digitable_line: doc.digitable_line.clone(),
        due_date: doc.due_date,
    }
}

/// Structural pattern of an identifier: every decimal digit becomes
/// [`SHAPE_DIGIT`], everything else keeps its position.
///
/// "109/00012345-6" → "###/########-#"
pub fn shape(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_digit() { SHAPE_DIGIT } else { c })
        .collect()
}

fn upper(value: Option<&str>) -> String {
    value.unwrap_or("").trim().to_uppercase()
}

// Strip first so spaces between punctuation are trimmed too.
fn strip_id_punctuation(value: Option<&str>) -> String {
    let stripped: String = value
        .unwrap_or("")
        .chars()
        .filter(|c| !ID_PUNCTUATION.contains(c))
        .collect();
    stripped.trim().to_string()
}
