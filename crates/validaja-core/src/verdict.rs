//! Verdict types produced by the fraud classifier.
//!
//! Findings are structured values; their human-readable text comes from the
//! `Display` impls so the wording lives in one place and callers can render
//! or translate them independently.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Final recommendation attached to a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Pay,
    DoNotPay,
    VerifyManually,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pay => "PAY",
            Self::DoNotPay => "DO_NOT_PAY",
            Self::VerifyManually => "VERIFY_MANUALLY",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payee identity fields that must match the baseline reference exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityField {
    PayeeName,
    PayeeDocumentId,
    IssuingBankCode,
    PayeeBranchCode,
}

impl IdentityField {
    /// Fields every record must carry before it can be classified.
    pub const REQUIRED: [IdentityField; 3] = [
        IdentityField::PayeeName,
        IdentityField::PayeeDocumentId,
        IdentityField::IssuingBankCode,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PayeeName => "payee_name",
            Self::PayeeDocumentId => "payee_document_id",
            Self::IssuingBankCode => "issuing_bank_code",
            Self::PayeeBranchCode => "payee_branch_code",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::PayeeName => "Payee name",
            Self::PayeeDocumentId => "Payee document (CPF/CNPJ)",
            Self::IssuingBankCode => "Issuing bank",
            Self::PayeeBranchCode => "Branch/payee code",
        }
    }
}

impl fmt::Display for IdentityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields that legitimately differ between genuine slips of one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableField {
    FaceValue,
    Dates,
    OurNumber,
    DigitableLine,
}

impl VariableField {
    pub const ALL: [VariableField; 4] = [
        VariableField::FaceValue,
        VariableField::Dates,
        VariableField::OurNumber,
        VariableField::DigitableLine,
    ];
}

/// One entry in a verdict's `differences_found`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    /// An identity field differs from the baseline. Values are the original,
    /// non-normalised text of each document.
    FieldMismatch {
        field: IdentityField,
        candidate: String,
        reference: String,
    },
    /// The candidate's our-number layout departs from the layout shared by
    /// every reference.
    OurNumberFormat {
        candidate_shape: String,
        reference_shape: String,
    },
    /// Informational: this field is expected to vary.
    NormalVariation { field: VariableField },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldMismatch {
                field,
                candidate,
                reference,
            } => write!(f, "{} differs: '{candidate}' vs '{reference}'", field.label()),
            Self::OurNumberFormat {
                candidate_shape,
                reference_shape,
            } => write!(
                f,
                "Our-number format differs: {candidate_shape} vs {reference_shape}"
            ),
            Self::NormalVariation { field } => f.write_str(match field {
                VariableField::FaceValue => {
                    "Document value: expected to differ between slips from different months"
                }
                VariableField::Dates => "Dates: expected to vary between billing periods",
                VariableField::OurNumber => "Our number: always unique for each slip",
                VariableField::DigitableLine => {
                    "Digitable line: varies with the value and the our number"
                }
            }),
        }
    }
}

/// One entry in a verdict's `suspicious_points`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "field", rename_all = "snake_case")]
pub enum Suspicion {
    IdentityMismatch(IdentityField),
    MinorFormatVariation,
}

impl fmt::Display for Suspicion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdentityMismatch(field) => write!(f, "{} does not match", field.label()),
            Self::MinorFormatVariation => f.write_str("Minor format variation detected"),
        }
    }
}

/// Outcome of comparing one candidate against a reference set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictResult {
    pub is_fraudulent: bool,
    /// In `[0, 1]`.
    pub confidence: f64,
    pub summary: String,
    pub differences_found: Vec<Finding>,
    pub suspicious_points: Vec<Suspicion>,
    pub recommendation: Recommendation,
}
