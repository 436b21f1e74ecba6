//! Reference-comparison fraud classifier.
//!
//! Compares a candidate boleto against the trusted reference set of one payee
//! account in two tiers:
//!
//! 1. **Identity**: payee name, payee CPF/CNPJ, issuing bank and (when both
//!    sides carry one) branch/payee code must equal the baseline reference
//!    after normalisation. Any mismatch is conclusive fraud.
//! 2. **Pattern**: the layout ("shape") of the our-number is checked against
//!    the layout the references agree on. A departure is a minor anomaly that
//!    asks for manual verification.
//!
//! The baseline for tier 1 is always the first reference; the whole set is
//! only consulted for the tier 2 shape consensus.

use std::fmt;

use thiserror::Error;
use tracing::{debug, info};

use crate::document::StructuredDocument;
use crate::normalize::{NormalizedComparisonRecord, normalize, shape};
use crate::verdict::{
    Finding, IdentityField, Recommendation, Suspicion, VariableField, VerdictResult,
};

pub const FRAUD_CONFIDENCE: f64 = 0.95;
pub const LEGITIMATE_CONFIDENCE: f64 = 0.90;
pub const REVIEW_CONFIDENCE: f64 = 0.70;

/// Which document of a comparison a field was missing from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentSide {
    Candidate,
    BaselineReference,
}

impl DocumentSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Candidate => "candidate",
            Self::BaselineReference => "baseline reference",
        }
    }
}

impl fmt::Display for DocumentSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassificationError {
    #[error("no reference documents to compare against")]
    EmptyReferenceSet,

    #[error("{side} is missing required field {field}")]
    MissingRequiredField {
        field: IdentityField,
        side: DocumentSide,
    },
}

/// Classify `candidate` against the reference set of one payee account.
///
/// `references[0]` is the tier 1 baseline. Input contract violations are
/// reported before any comparison runs.
pub fn classify(
    references: &[StructuredDocument],
    candidate: &StructuredDocument,
) -> Result<VerdictResult, ClassificationError> {
    let baseline = references
        .first()
        .ok_or(ClassificationError::EmptyReferenceSet)?;
    require_identity(candidate, DocumentSide::Candidate)?;
    require_identity(baseline, DocumentSide::BaselineReference)?;

    let reference = normalize(baseline);
    let analysed = normalize(candidate);

    let mismatches = identity_mismatches(&reference, &analysed);
    if !mismatches.is_empty() {
        let differences: Vec<Finding> = mismatches
            .iter()
            .map(|&field| Finding::FieldMismatch {
                field,
                candidate: candidate.identity(field).unwrap_or_default().to_string(),
                reference: baseline.identity(field).unwrap_or_default().to_string(),
            })
            .collect();
        let summary = join(&differences);
        info!(mismatches = mismatches.len(), "identity mismatch, classified as fraud");
        return Ok(VerdictResult {
            is_fraudulent: true,
            confidence: FRAUD_CONFIDENCE,
            summary,
            differences_found: differences,
            suspicious_points: mismatches
                .into_iter()
                .map(Suspicion::IdentityMismatch)
                .collect(),
            recommendation: Recommendation::DoNotPay,
        });
    }

    let anomalies: Vec<Finding> = our_number_anomaly(references, candidate)
        .into_iter()
        .collect();

    if anomalies.is_empty() {
        info!("identity and layout match references, classified as legitimate");
        return Ok(VerdictResult {
            is_fraudulent: false,
            confidence: LEGITIMATE_CONFIDENCE,
            summary: "Slip validated: payee, payee document and bank match the reference \
                      slips. Value, dates and our number differ as expected between slips \
                      of the same account."
                .to_string(),
            differences_found: VariableField::ALL
                .into_iter()
                .map(|field| Finding::NormalVariation { field })
                .collect(),
            suspicious_points: Vec::new(),
            recommendation: Recommendation::Pay,
        });
    }

    info!(anomalies = anomalies.len(), "minor layout anomaly, manual verification advised");
    Ok(VerdictResult {
        is_fraudulent: false,
        confidence: REVIEW_CONFIDENCE,
        summary: format!(
            "Slip looks legitimate but shows minor variations worth checking: {}. \
             Payee, payee document and bank match the reference slips.",
            join(&anomalies)
        ),
        differences_found: anomalies,
        suspicious_points: vec![Suspicion::MinorFormatVariation],
        recommendation: Recommendation::VerifyManually,
    })
}

fn require_identity(doc: &StructuredDocument, side: DocumentSide) -> Result<(), ClassificationError> {
    match IdentityField::REQUIRED
        .into_iter()
        .find(|&field| doc.identity(field).is_none())
    {
        Some(field) => Err(ClassificationError::MissingRequiredField { field, side }),
        None => Ok(()),
    }
}

/// Tier 1 checks in fixed order. Branch code only counts when both sides
/// carry one.
fn identity_mismatches(
    reference: &NormalizedComparisonRecord,
    candidate: &NormalizedComparisonRecord,
) -> Vec<IdentityField> {
    let mut mismatches = Vec::new();
    let checks = [
        (IdentityField::PayeeName, &reference.payee_name, &candidate.payee_name),
        (
            IdentityField::PayeeDocumentId,
            &reference.payee_document_id,
            &candidate.payee_document_id,
        ),
        (
            IdentityField::IssuingBankCode,
            &reference.issuing_bank_code,
            &candidate.issuing_bank_code,
        ),
    ];
    for (field, expected, actual) in checks {
        debug!(%field, expected = %expected, actual = %actual, "identity check");
        if expected != actual {
            mismatches.push(field);
        }
    }

    let (expected, actual) = (&reference.payee_branch_code, &candidate.payee_branch_code);
    if !expected.is_empty() && !actual.is_empty() && expected != actual {
        mismatches.push(IdentityField::PayeeBranchCode);
    }
    mismatches
}

/// Tier 2: fires only when every reference our-number shares one shape and
/// the candidate's differs from it.
fn our_number_anomaly(
    references: &[StructuredDocument],
    candidate: &StructuredDocument,
) -> Option<Finding> {
    let candidate_number = candidate.our_number.as_deref().filter(|n| !n.is_empty())?;

    let mut shapes = references
        .iter()
        .filter_map(|r| r.our_number.as_deref())
        .filter(|n| !n.is_empty())
        .map(shape);
    let reference_shape = shapes.next()?;
    if shapes.any(|s| s != reference_shape) {
        debug!("references disagree on our-number shape, skipping layout check");
        return None;
    }

    let candidate_shape = shape(candidate_number);
    (candidate_shape != reference_shape).then_some(Finding::OurNumberFormat {
        candidate_shape,
        reference_shape,
    })
}

fn join(findings: &[Finding]) -> String {
    findings
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn slip(our_number: Option<&str>) -> StructuredDocument {
        StructuredDocument {
            payee_name: Some("Imobiliaria Centro Ltda".into()),
            payee_document_id: Some("12.345.678/0001-90".into()),
            payee_branch_code: Some("0123/45678-9".into()),
            issuing_bank_code: Some("341".into()),
            digitable_line: Some("34191.79001 01043.510047 91020.150008 1 96610000015000".into()),
            our_number: our_number.map(Into::into),
            face_value: Some(1500.0),
            ..Default::default()
        }
    }

    fn references(numbers: &[&str]) -> Vec<StructuredDocument> {
        numbers.iter().map(|&n| slip(Some(n))).collect()
    }

    #[test]
    fn clean_match_is_legitimate() {
        let refs = references(&["123-4", "567-8"]);
        let mut candidate = slip(Some("901-2"));
        candidate.face_value = Some(1720.35);
        candidate.due_date = chrono::NaiveDate::from_ymd_opt(2025, 4, 10);

        let verdict = classify(&refs, &candidate).unwrap();
        assert!(!verdict.is_fraudulent);
        assert_eq!(verdict.recommendation, Recommendation::Pay);
        assert_eq!(verdict.confidence, 0.90);
        assert!(verdict.suspicious_points.is_empty());
        assert_eq!(verdict.differences_found.len(), 4);
        assert!(
            verdict
                .differences_found
                .iter()
                .all(|f| matches!(f, Finding::NormalVariation { .. }))
        );
    }

    #[test]
    fn formatting_noise_is_not_a_mismatch() {
        let refs = references(&["123-4", "567-8"]);
        let mut candidate = slip(Some("901-2"));
        candidate.payee_name = Some("  IMOBILIARIA centro ltda".into());
        candidate.payee_document_id = Some("12345678000190".into());
        candidate.issuing_bank_code = Some(" 341 ".into());

        let verdict = classify(&refs, &candidate).unwrap();
        assert_eq!(verdict.recommendation, Recommendation::Pay);
    }

    #[test]
    fn trailing_dash_on_tax_id_is_not_a_mismatch() {
        let refs = references(&["123-4", "567-8"]);
        let mut candidate = slip(Some("901-2"));
        candidate.payee_document_id = Some("12.345.678/0001-90 -".into());

        let verdict = classify(&refs, &candidate).unwrap();
        assert!(!verdict.is_fraudulent);
        assert_eq!(verdict.recommendation, Recommendation::Pay);
    }

    #[test]
    fn payee_document_mismatch_is_fraud() {
        let refs = references(&["123-4", "567-8"]);
        let mut candidate = slip(Some("901-2"));
        candidate.payee_document_id = Some("98.765.432/0001-10".into());

        let verdict = classify(&refs, &candidate).unwrap();
        assert!(verdict.is_fraudulent);
        assert_eq!(verdict.recommendation, Recommendation::DoNotPay);
        assert_eq!(verdict.confidence, 0.95);
        assert_eq!(
            verdict.differences_found,
            vec![Finding::FieldMismatch {
                field: IdentityField::PayeeDocumentId,
                candidate: "98.765.432/0001-10".into(),
                reference: "12.345.678/0001-90".into(),
            }]
        );
        assert_eq!(
            verdict.suspicious_points,
            vec![Suspicion::IdentityMismatch(IdentityField::PayeeDocumentId)]
        );
    }

    #[test]
    fn mismatches_reported_in_fixed_order_and_joined() {
        let refs = references(&["123-4", "567-8"]);
        let mut candidate = slip(Some("901-2"));
        candidate.payee_branch_code = Some("9999/00000-1".into());
        candidate.issuing_bank_code = Some("237".into());
        candidate.payee_name = Some("Imobiliaria Centro".into());

        let verdict = classify(&refs, &candidate).unwrap();
        let fields: Vec<IdentityField> = verdict
            .suspicious_points
            .iter()
            .map(|s| match s {
                Suspicion::IdentityMismatch(f) => *f,
                other => panic!("unexpected suspicion {other:?}"),
            })
            .collect();
        assert_eq!(
            fields,
            vec![
                IdentityField::PayeeName,
                IdentityField::IssuingBankCode,
                IdentityField::PayeeBranchCode,
            ]
        );
        let texts: Vec<String> = verdict
            .differences_found
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(verdict.summary, texts.join("; "));
        assert!(verdict.summary.contains("'237' vs '341'"));
    }

    #[test]
    fn identity_mismatch_short_circuits_layout_check() {
        // These our-numbers alone would raise a layout anomaly.
        let refs = references(&["123-4", "567-8", "901-2"]);
        let mut candidate = slip(Some("12.345"));
        candidate.payee_name = Some("Outra Empresa SA".into());

        let verdict = classify(&refs, &candidate).unwrap();
        assert_eq!(verdict.recommendation, Recommendation::DoNotPay);
        assert_eq!(verdict.confidence, 0.95);
        assert!(
            !verdict
                .differences_found
                .iter()
                .any(|f| matches!(f, Finding::OurNumberFormat { .. }))
        );
        assert!(!verdict.suspicious_points.contains(&Suspicion::MinorFormatVariation));
    }

    #[test]
    fn our_number_shape_change_needs_review() {
        let refs = references(&["123-4", "567-8", "901-2"]);
        let candidate = slip(Some("12.345"));

        let verdict = classify(&refs, &candidate).unwrap();
        assert!(!verdict.is_fraudulent);
        assert_eq!(verdict.recommendation, Recommendation::VerifyManually);
        assert_eq!(verdict.confidence, 0.70);
        assert_eq!(
            verdict.differences_found,
            vec![Finding::OurNumberFormat {
                candidate_shape: "##.###".into(),
                reference_shape: "###-#".into(),
            }]
        );
        assert_eq!(verdict.suspicious_points, vec![Suspicion::MinorFormatVariation]);
        assert!(verdict.summary.contains("##.###"));
        assert!(verdict.summary.contains("###-#"));
    }

    #[test]
    fn disagreeing_references_skip_layout_check() {
        let refs = references(&["123-4", "56.789"]);
        let verdict = classify(&refs, &slip(Some("AB/1"))).unwrap();
        assert_eq!(verdict.recommendation, Recommendation::Pay);
    }

    #[test]
    fn missing_our_numbers_skip_layout_check() {
        let refs = vec![slip(None), slip(Some(""))];
        let verdict = classify(&refs, &slip(Some("12.345"))).unwrap();
        assert_eq!(verdict.recommendation, Recommendation::Pay);

        let refs = references(&["123-4", "567-8"]);
        let verdict = classify(&refs, &slip(None)).unwrap();
        assert_eq!(verdict.recommendation, Recommendation::Pay);
    }

    #[test]
    fn references_without_our_number_do_not_break_consensus() {
        let mut refs = references(&["123-4", "567-8"]);
        refs.push(slip(None));
        let verdict = classify(&refs, &slip(Some("1234-5"))).unwrap();
        assert_eq!(verdict.recommendation, Recommendation::VerifyManually);
    }

    #[test]
    fn branch_code_absent_on_either_side_is_lenient() {
        let mut refs = references(&["123-4", "567-8"]);
        refs[0].payee_branch_code = None;
        let verdict = classify(&refs, &slip(Some("901-2"))).unwrap();
        assert_eq!(verdict.recommendation, Recommendation::Pay);

        let refs = references(&["123-4", "567-8"]);
        let mut candidate = slip(Some("901-2"));
        candidate.payee_branch_code = Some("   ".into());
        let verdict = classify(&refs, &candidate).unwrap();
        assert_eq!(verdict.recommendation, Recommendation::Pay);
    }

    #[test]
    fn only_first_reference_is_the_identity_baseline() {
        let mut refs = references(&["123-4", "567-8"]);
        refs[1].payee_name = Some("Somebody Else".into());
        let verdict = classify(&refs, &slip(Some("901-2"))).unwrap();
        assert_eq!(verdict.recommendation, Recommendation::Pay);
    }

    #[test]
    fn empty_reference_set_is_an_error() {
        let err = classify(&[], &slip(None)).unwrap_err();
        assert_eq!(err, ClassificationError::EmptyReferenceSet);
    }

    #[test]
    fn candidate_without_bank_code_is_an_error() {
        let refs = references(&["123-4", "567-8"]);
        let mut candidate = slip(Some("901-2"));
        candidate.issuing_bank_code = None;
        let err = classify(&refs, &candidate).unwrap_err();
        assert_eq!(
            err,
            ClassificationError::MissingRequiredField {
                field: IdentityField::IssuingBankCode,
                side: DocumentSide::Candidate,
            }
        );
        assert_eq!(
            err.to_string(),
            "candidate is missing required field issuing_bank_code"
        );
    }

    #[test]
    fn baseline_without_payee_name_is_an_error() {
        let mut refs = references(&["123-4", "567-8"]);
        refs[0].payee_name = None;
        let err = classify(&refs, &slip(None)).unwrap_err();
        assert_eq!(
            err,
            ClassificationError::MissingRequiredField {
                field: IdentityField::PayeeName,
                side: DocumentSide::BaselineReference,
            }
        );
    }
}
