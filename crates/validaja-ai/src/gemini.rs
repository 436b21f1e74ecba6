//! Gemini `generateContent` client that reads boleto PDFs.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};
use validaja_core::StructuredDocument;

use crate::{DocumentExtractor, ExtractError};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-001";

const EXTRACTION_PROMPT: &str = "\
Analyse this Brazilian bank payment slip (boleto bancário) and extract ALL visible information.

Rules:
1. Extract exactly what is printed on the slip.
2. Write dates as DD/MM/YYYY.
3. Write monetary values as decimal numbers (e.g. 1234.56).
4. Keep CPF/CNPJ numbers with their original formatting.
5. If a field is not visible, write \"N/A\".
6. Be precise with names, codes and numbers.

The payee is the beneficiário (cedente); the payer is the pagador (sacado). \
The our_number field is the \"Nosso Número\". \
Return the data as JSON following the response schema.";

/// Connection settings for [`GeminiExtractor`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    /// Like `https://generativelanguage.googleapis.com/v1beta` (no trailing slash needed).
    pub base_url: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Extracts boleto data by sending the PDF inline to Gemini with a JSON
/// response schema.
pub struct GeminiExtractor {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiExtractor {
    pub fn new(config: GeminiConfig) -> Result<Self, ExtractError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        let endpoint = format!(
            "{}/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );
        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key,
        })
    }

    fn request_body(pdf: &[u8]) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "text": EXTRACTION_PROMPT },
                    { "inline_data": {
                        "mime_type": "application/pdf",
                        "data": STANDARD.encode(pdf),
                    }},
                ],
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": response_schema(),
                "temperature": 0.0,
            },
        })
    }
}

#[async_trait]
impl DocumentExtractor for GeminiExtractor {
    async fn extract(&self, pdf: &[u8]) -> Result<StructuredDocument, ExtractError> {
        if pdf.is_empty() {
            return Err(ExtractError::EmptyDocument);
        }

        info!(endpoint = %self.endpoint, bytes = pdf.len(), "requesting boleto extraction");
        let resp = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(pdf))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ExtractError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let response: GenerateResponse = resp.json().await?;
        let doc = parse_response(response)?;
        debug!(payee = ?doc.payee_name, bank = ?doc.issuing_bank_code, "extraction complete");
        Ok(doc)
    }
}

fn parse_response(response: GenerateResponse) -> Result<StructuredDocument, ExtractError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ExtractError::Blocked(reason));
    }
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(ExtractError::EmptyResponse)?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(match candidate.finish_reason {
            Some(reason) if reason != "STOP" => ExtractError::Blocked(reason),
            _ => ExtractError::EmptyResponse,
        });
    }

    parse_document(&text)
}

/// Parse the model's JSON text, tolerating a markdown fence around it.
fn parse_document(text: &str) -> Result<StructuredDocument, ExtractError> {
    let trimmed = text.trim();
    let json = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);
    let doc: StructuredDocument = serde_json::from_str(json)?;
    Ok(doc.scrubbed())
}

/// Response schema mirroring [`StructuredDocument`], in Gemini's OpenAPI
/// subset.
fn response_schema() -> Value {
    fn text(description: &str) -> Value {
        json!({ "type": "STRING", "description": description })
    }
    fn optional_text(description: &str) -> Value {
        json!({ "type": "STRING", "nullable": true, "description": description })
    }
    fn optional_number(description: &str) -> Value {
        json!({ "type": "NUMBER", "nullable": true, "description": description })
    }
    fn lines(description: &str) -> Value {
        json!({ "type": "ARRAY", "items": { "type": "STRING" }, "description": description })
    }

    json!({
        "type": "OBJECT",
        "properties": {
            "payee_name": text("Full name or corporate name of the payee (beneficiário/cedente)."),
            "payee_document_id": text("CNPJ or CPF of the payee, as printed."),
            "payee_branch_code": optional_text("Branch and payee code (agência/código do beneficiário)."),
            "payee_address": optional_text("Full address of the payee."),
            "payer_name": optional_text("Full name or corporate name of the payer (pagador/sacado)."),
            "payer_document_id": optional_text("CNPJ or CPF of the payer, as printed."),
            "payer_address": optional_text("Full address of the payer."),
            "issuing_bank_code": text("Three-digit code of the issuing bank."),
            "issuing_bank_name": optional_text("Name of the issuing bank."),
            "digitable_line": text("Complete digitable line (linha digitável)."),
            "barcode_numeric": optional_text("Numeric barcode (44 digits)."),
            "our_number": optional_text("Nosso Número."),
            "document_number": optional_text("Document number (número do documento)."),
            "due_date": optional_text("Due date, DD/MM/YYYY."),
            "issue_date": optional_text("Document date, DD/MM/YYYY."),
            "face_value": optional_number("Document value."),
            "charged_value": optional_number("Final amount charged."),
            "document_kind": optional_text("Document kind (espécie do documento)."),
            "payment_location": optional_text("Place of payment (local de pagamento)."),
            "statement_lines": lines("Statement/detail lines (demonstrativo)."),
            "teller_instructions": lines("Instructions to the teller (instruções ao caixa)."),
        },
        "required": ["payee_name", "payee_document_id", "issuing_bank_code", "digitable_line"],
    })
}
