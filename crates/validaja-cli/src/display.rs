//! Vertical card display for boletos, verdicts and accounts.
//!
//! Everything renders into a `String` so the output can be checked in tests;
//! `main` prints it.

use validaja_core::{Recommendation, StructuredDocument, VerdictResult};
use validaja_store::AccountSummary;

const NOT_AVAILABLE: &str = "N/A";
const DATE_FORMAT: &str = "%d/%m/%Y";

pub const MANUAL_CHECK_REMINDER: &str = "This is an automated comparison. \
Before paying, confirm the payee name, CNPJ/CPF and bank in your banking app.";

// ── Documents ──

pub fn render_document(title: &str, doc: &StructuredDocument) -> String {
    let mut out = format!("=== {title} ===\n");

    out.push_str("Payee\n");
    field(&mut out, "name", doc.payee_name.as_deref());
    field(&mut out, "CPF/CNPJ", doc.payee_document_id.as_deref());
    field(&mut out, "branch/payee code", doc.payee_branch_code.as_deref());
    field(&mut out, "address", doc.payee_address.as_deref());
    out.push('\n');

    out.push_str("Payer\n");
    field(&mut out, "name", doc.payer_name.as_deref());
    field(&mut out, "CPF/CNPJ", doc.payer_document_id.as_deref());
    out.push('\n');

    out.push_str("Slip\n");
    let bank = match (&doc.issuing_bank_code, &doc.issuing_bank_name) {
        (Some(code), Some(name)) => Some(format!("{code} - {name}")),
        (Some(code), None) => Some(code.clone()),
        (None, name) => name.clone(),
    };
    field(&mut out, "bank", bank.as_deref());
    field(&mut out, "digitable line", doc.digitable_line.as_deref());
    field(&mut out, "our number", doc.our_number.as_deref());
    field(&mut out, "document number", doc.document_number.as_deref());
    let due = doc.due_date.map(|d| d.format(DATE_FORMAT).to_string());
    field(&mut out, "due date", due.as_deref());
    let value = doc.face_value.map(format_brl);
    field(&mut out, "face value", value.as_deref());
    let charged = doc.charged_value.map(format_brl);
    if charged != value {
        field(&mut out, "charged value", charged.as_deref());
    }

    if !doc.statement_lines.is_empty() {
        out.push_str("  statement:\n");
        for line in &doc.statement_lines {
            out.push_str(&format!("    {line}\n"));
        }
    }
    out.push('\n');
    out
}

// ── Verdicts ──

pub fn render_verdict(verdict: &VerdictResult) -> String {
    let banner = match verdict.recommendation {
        Recommendation::Pay => "LEGITIMATE",
        Recommendation::VerifyManually => "NEEDS REVIEW",
        Recommendation::DoNotPay => "FRAUD SUSPECTED",
    };
    let mut out = format!("=== {banner} ===\n");
    row(&mut out, "recommendation", verdict.recommendation);
    row(
        &mut out,
        "confidence",
        format!("{:.0}%", verdict.confidence * 100.0),
    );
    row(&mut out, "summary", &verdict.summary);

    if !verdict.differences_found.is_empty() {
        out.push_str(&format!(
            "  differences ({}):\n",
            verdict.differences_found.len()
        ));
        for finding in &verdict.differences_found {
            out.push_str(&format!("    - {finding}\n"));
        }
    }
    if !verdict.suspicious_points.is_empty() {
        out.push_str(&format!(
            "  suspicious ({}):\n",
            verdict.suspicious_points.len()
        ));
        for point in &verdict.suspicious_points {
            out.push_str(&format!("    ! {point}\n"));
        }
    }
    out.push('\n');
    out
}

// ── Accounts ──

pub fn render_accounts(accounts: &[AccountSummary]) -> String {
    if accounts.is_empty() {
        return "No reference accounts registered.\n".to_string();
    }
    let mut out = String::new();
    for account in accounts {
        out.push_str(&format!("{}\n", account.account_name));
        row(&mut out, "payee", &account.payee_name);
        row(&mut out, "CPF/CNPJ", &account.payee_document_id);
        row(&mut out, "bank", &account.issuing_bank_code);
        row(&mut out, "references", account.document_count);
        row(&mut out, "created", &account.created_at);
    }
    out
}

pub fn render_account_saved(summary: &AccountSummary) -> String {
    format!(
        "Account '{}' saved with {} reference documents (payee: {}).\n\n",
        summary.account_name, summary.document_count, summary.payee_name
    )
}

// ── Helpers ──

fn row(out: &mut String, label: &str, value: impl std::fmt::Display) {
    out.push_str(&format!("  {:<26} {}\n", label, value));
}

fn field(out: &mut String, label: &str, value: Option<&str>) {
    row(out, label, value.unwrap_or(NOT_AVAILABLE));
}

/// `1234.5` → `R$ 1.234,50`.
fn format_brl(value: f64) -> String {
    let cents = (value * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let units = (cents / 100).to_string();
    let mut grouped = String::new();
    for (i, c) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    format!("{sign}R$ {grouped},{:02}", cents % 100)
}
