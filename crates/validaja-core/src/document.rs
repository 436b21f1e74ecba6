//! The extracted representation of one boleto.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::verdict::IdentityField;

/// Minimum number of trusted slips that make up a reference set.
pub const MIN_REFERENCE_DOCUMENTS: usize = 2;

/// Values an extractor writes when a field is not legible on the slip.
const PLACEHOLDERS: &[&str] = &["N/A", "NA", "-", "NULL", "NONE"];

/// One boleto as produced by the document extractor.
///
/// The extraction contract marks `payee_name`, `payee_document_id`,
/// `issuing_bank_code` and `digitable_line` as required, but every field is
/// optional here so a partial extraction can still be carried to the
/// classifier and rejected there with a typed error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredDocument {
    // Payee (cedente)
    #[serde(default)]
    pub payee_name: Option<String>,
    /// CPF/CNPJ with its original formatting.
    #[serde(default)]
    pub payee_document_id: Option<String>,
    #[serde(default)]
    pub payee_branch_code: Option<String>,
    #[serde(default)]
    pub payee_address: Option<String>,

    // Payer (sacado)
    #[serde(default)]
    pub payer_name: Option<String>,
    #[serde(default)]
    pub payer_document_id: Option<String>,
    #[serde(default)]
    pub payer_address: Option<String>,

    // Slip data
    /// Three-digit FEBRABAN bank code.
    #[serde(default)]
    pub issuing_bank_code: Option<String>,
    #[serde(default)]
    pub issuing_bank_name: Option<String>,
    #[serde(default)]
    pub digitable_line: Option<String>,
    /// 44-digit numeric barcode.
    #[serde(default)]
    pub barcode_numeric: Option<String>,
    /// Payee-assigned identifier ("nosso número").
    #[serde(default)]
    pub our_number: Option<String>,
    #[serde(default)]
    pub document_number: Option<String>,
    #[serde(default, with = "lenient_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, with = "lenient_date")]
    pub issue_date: Option<NaiveDate>,
    #[serde(default, with = "lenient_amount")]
    pub face_value: Option<f64>,
    #[serde(default, with = "lenient_amount")]
    pub charged_value: Option<f64>,

    #[serde(default)]
    pub document_kind: Option<String>,
    #[serde(default)]
    pub payment_location: Option<String>,
    #[serde(default)]
    pub statement_lines: Vec<String>,
    #[serde(default)]
    pub teller_instructions: Vec<String>,

    /// File the document was extracted from. Set by the reference builder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_filename: Option<String>,
}

impl StructuredDocument {
    /// Original, non-normalised value of an identity field.
    pub fn identity(&self, field: IdentityField) -> Option<&str> {
        match field {
            IdentityField::PayeeName => self.payee_name.as_deref(),
            IdentityField::PayeeDocumentId => self.payee_document_id.as_deref(),
            IdentityField::IssuingBankCode => self.issuing_bank_code.as_deref(),
            IdentityField::PayeeBranchCode => self.payee_branch_code.as_deref(),
        }
    }

    /// Replace extractor placeholders ("N/A", blank strings) with `None` and
    /// drop blank free-text lines.
    pub fn scrubbed(mut self) -> Self {
        for slot in [
            &mut self.payee_name,
            &mut self.payee_document_id,
            &mut self.payee_branch_code,
            &mut self.payee_address,
            &mut self.payer_name,
            &mut self.payer_document_id,
            &mut self.payer_address,
            &mut self.issuing_bank_code,
            &mut self.issuing_bank_name,
            &mut self.digitable_line,
            &mut self.barcode_numeric,
            &mut self.our_number,
            &mut self.document_number,
            &mut self.document_kind,
            &mut self.payment_location,
        ] {
            if slot.as_deref().is_some_and(is_placeholder) {
                *slot = None;
            }
        }
        self.statement_lines.retain(|l| !is_placeholder(l));
        self.teller_instructions.retain(|l| !is_placeholder(l));
        self
    }
}

fn is_placeholder(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || PLACEHOLDERS.iter().any(|p| v.eq_ignore_ascii_case(p))
}

/// Dates are written as `DD/MM/YYYY` (the format printed on boletos) and
/// read from either that or ISO `YYYY-MM-DD`. Anything else reads as `None`.
mod lenient_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const BR_FORMAT: &str = "%d/%m/%Y";

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.serialize_str(&d.format(BR_FORMAT).to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        Ok(raw.as_deref().and_then(parse))
    }

    pub(super) fn parse(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        NaiveDate::parse_from_str(raw, BR_FORMAT)
            .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
            .ok()
    }
}

/// Amounts are numbers, but extractors sometimes return them as strings,
/// possibly in Brazilian notation (`1.234,56`).
mod lenient_amount {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => s.serialize_f64(*v),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        let raw: Option<Raw> = Option::deserialize(d)?;
        Ok(match raw {
            Some(Raw::Number(n)) => Some(n),
            Some(Raw::Text(t)) => parse(&t),
            None => None,
        })
    }

    /// The last of `,` and `.` is the decimal separator; the other one groups
    /// thousands. A lone comma is decimal, repeated dots are grouping.
    pub(super) fn parse(raw: &str) -> Option<f64> {
        let cleaned = raw.trim().trim_start_matches("R$").trim();
        let cleaned = match (cleaned.rfind(','), cleaned.rfind('.')) {
            (Some(comma), Some(dot)) if dot > comma => cleaned.replace(',', ""),
            (Some(_), _) => cleaned.replace('.', "").replace(',', "."),
            (None, _) if cleaned.matches('.').count() > 1 => cleaned.replace('.', ""),
            (None, _) => cleaned.to_string(),
        };
        cleaned.parse().ok()
    }
}
