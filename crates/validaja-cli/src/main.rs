mod display;
mod pipeline;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use validaja_ai::{GeminiConfig, GeminiExtractor};
use validaja_core::{Recommendation, VerdictResult};
use validaja_store::{JsonStore, ReferenceStore};

use crate::pipeline::{read_document_json, read_source_file};

#[derive(Parser)]
#[command(name = "validaja", version, about = "Detect fraudulent boletos by comparing them with trusted slips of the same account")]
struct Cli {
    /// Reference account store.
    #[arg(long, env = "VALIDAJA_STORE", default_value = "data/reference_accounts.json", global = true)]
    store: PathBuf,

    /// Gemini API key. Only needed by commands that read PDFs.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    #[arg(long, env = "VALIDAJA_MODEL", default_value = validaja_ai::DEFAULT_MODEL, global = true)]
    model: String,

    #[arg(long, env = "VALIDAJA_API_BASE", default_value = validaja_ai::DEFAULT_BASE_URL, global = true)]
    api_base: String,

    /// Per-request timeout for the extraction service.
    #[arg(long, env = "VALIDAJA_TIMEOUT_SECS", default_value_t = 120, global = true)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a reference account from at least two trusted boleto PDFs.
    Register {
        account: String,
        #[arg(required = true, num_args = 1..)]
        pdfs: Vec<PathBuf>,
    },
    /// Check a boleto PDF against a registered account.
    Verify {
        account: String,
        pdf: PathBuf,
        /// Print the verdict as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Classify already-extracted JSON records, without calling the extractor.
    Check {
        /// Reference record; the first one is the identity baseline.
        #[arg(long = "reference", required = true)]
        references: Vec<PathBuf>,
        #[arg(long)]
        candidate: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// List registered accounts.
    Accounts,
    /// Print the reference documents of an account.
    Show { account: String },
    /// Delete a registered account.
    Remove { account: String },
}

impl Cli {
    fn extractor(&self) -> anyhow::Result<GeminiExtractor> {
        let api_key = self
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .context("GEMINI_API_KEY is not set; pass --api-key or set the environment variable")?;
        let config = GeminiConfig {
            api_key,
            model: self.model.clone(),
            base_url: self.api_base.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        };
        Ok(GeminiExtractor::new(config)?)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    tracing::debug!("validaja v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let store = JsonStore::open(&cli.store);

    match &cli.command {
        Command::Register { account, pdfs } => {
            let extractor = cli.extractor()?;
            let files = pdfs
                .iter()
                .map(|p| read_source_file(p))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let (summary, documents) =
                pipeline::register(&store, &extractor, account, files).await?;
            print!("{}", display::render_account_saved(&summary));
            for (i, doc) in documents.iter().enumerate() {
                let title = format!(
                    "Reference {} ({})",
                    i + 1,
                    doc.source_filename.as_deref().unwrap_or("?")
                );
                print!("{}", display::render_document(&title, doc));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify { account, pdf, json } => {
            let extractor = cli.extractor()?;
            let file = read_source_file(pdf)?;
            let outcome = pipeline::verify(&store, &extractor, account, file).await?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print!("{}", display::render_document("Extracted document", &outcome.candidate));
                print!("{}", display::render_verdict(&outcome.verdict));
                println!("{}", display::MANUAL_CHECK_REMINDER);
            }
            Ok(exit_code(&outcome.verdict))
        }
        Command::Check {
            references,
            candidate,
            json,
        } => {
            let references = references
                .iter()
                .map(|p| read_document_json(p))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let candidate = read_document_json(candidate)?;
            let verdict = validaja_core::classify(&references, &candidate)
                .context("classifying candidate")?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&verdict)?);
            } else {
                print!("{}", display::render_verdict(&verdict));
            }
            Ok(exit_code(&verdict))
        }
        Command::Accounts => {
            let accounts = store.list().context("listing reference accounts")?;
            print!("{}", display::render_accounts(&accounts));
            Ok(ExitCode::SUCCESS)
        }
        Command::Show { account } => {
            let documents = store
                .require(account)
                .with_context(|| format!("loading account '{account}'"))?;
            for (i, doc) in documents.iter().enumerate() {
                let title = match &doc.source_filename {
                    Some(name) => format!("Reference {} ({name})", i + 1),
                    None => format!("Reference {}", i + 1),
                };
                print!("{}", display::render_document(&title, doc));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Remove { account } => {
            if !store.delete(account).context("removing account")? {
                anyhow::bail!("no reference account named '{account}'");
            }
            println!("Account '{account}' removed.");
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// 0 for PAY, 2 for VERIFY_MANUALLY, 3 for DO_NOT_PAY. 1 is left to errors.
fn exit_code(verdict: &VerdictResult) -> ExitCode {
    match verdict.recommendation {
        Recommendation::Pay => ExitCode::SUCCESS,
        Recommendation::VerifyManually => ExitCode::from(2),
        Recommendation::DoNotPay => ExitCode::from(3),
    }
}
