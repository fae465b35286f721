//! Extract command - pull transactions out of a single statement.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use passbook_core::models::config::PassbookConfig;
use passbook_core::{
    ExtractionOrchestrator, MemoryDocument, PureOcrEngine, SchemaRegistry, TransactionRecord,
};

use super::config::load_config;

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Statement file (PDF or scanned image)
    #[arg(required = true)]
    input: PathBuf,

    /// Institution key or alias (see `passbook institutions`)
    #[arg(short, long)]
    bank: String,

    /// Password for encrypted statements
    #[arg(short, long)]
    password: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// OCR model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Do not load the OCR engine
    #[arg(long)]
    no_ocr: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON array of records
    Json,
    /// CSV with one row per record
    Csv,
    /// Aligned table with totals
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tiff", "tif", "bmp"];

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(dir) = &args.model_dir {
        config.ocr.model_dir = dir.clone();
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}")?
            .progress_chars("##-"),
    );

    pb.set_message("Loading OCR engine...");
    pb.set_position(10);
    let orchestrator = build_orchestrator(&config, args.no_ocr);

    // Fail on an unknown bank before touching the file.
    let schema = orchestrator.registry().get(&args.bank)?;
    info!("Extracting {} statement {}", schema.name, args.input.display());

    pb.set_message("Extracting transactions...");
    pb.set_position(30);
    let records = extract_file(
        &orchestrator,
        &args.input,
        &args.bank,
        args.password.as_deref(),
    )?;

    pb.set_position(100);
    pb.finish_and_clear();

    let output = format_records(&records, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} {} transactions written to {}",
            style("✓").green(),
            records.len(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if records.is_empty() {
        eprintln!(
            "{} No transactions found. Check the bank key, or run with -v for details.",
            style("ℹ").blue()
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Orchestrator over the built-in institutions, with OCR when the models load.
pub fn build_orchestrator(config: &PassbookConfig, no_ocr: bool) -> ExtractionOrchestrator {
    let orchestrator = ExtractionOrchestrator::new(SchemaRegistry::builtin(), config.clone());
    if no_ocr {
        return orchestrator;
    }

    match PureOcrEngine::from_config(&config.ocr) {
        Ok(engine) => orchestrator.with_ocr(Box::new(engine)),
        Err(e) => {
            warn!("OCR unavailable, scanned pages will be skipped: {}", e);
            orchestrator
        }
    }
}

/// Run one file through the pipeline according to its extension.
pub fn extract_file(
    orchestrator: &ExtractionOrchestrator,
    path: &Path,
    bank: &str,
    password: Option<&str>,
) -> anyhow::Result<Vec<TransactionRecord>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    if extension == "pdf" {
        let data = fs::read(path)?;
        return Ok(orchestrator.extract_from_pdf(&data, bank, password)?);
    }

    if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        if !orchestrator.has_ocr() {
            anyhow::bail!(
                "Image input needs OCR models. Place them in {} or pass --model-dir.",
                orchestrator.config().ocr.model_dir.display()
            );
        }
        let image = image::open(path)?;
        let document = MemoryDocument::from_image(image);
        return Ok(orchestrator.extract_transactions(&document, bank)?);
    }

    anyhow::bail!("Unsupported file format: {}", extension)
}

pub fn format_records(records: &[TransactionRecord], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
        OutputFormat::Csv => format_csv(records),
        OutputFormat::Text => Ok(format_text(records)),
    }
}

fn format_csv(records: &[TransactionRecord]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "transactionDate",
        "valueDate",
        "chequeOrRefNo",
        "branchOrBranchCode",
        "description",
        "debit",
        "credit",
        "balance",
        "voucherKind",
    ])?;

    for record in records {
        wtr.write_record([
            record.transaction_date.as_str(),
            record.value_date.as_str(),
            record.cheque_or_ref_no.as_str(),
            record.branch_code.as_str(),
            record.description.as_str(),
            record.debit.as_str(),
            record.credit.as_str(),
            record.balance.as_str(),
            record.voucher_kind.as_str(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

const DESCRIPTION_WIDTH: usize = 40;

fn format_text(records: &[TransactionRecord]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{:<12} {:<12} {:<16} {:<width$} {:>14} {:>14} {:>16}\n",
        "Date",
        "Value date",
        "Ref",
        "Description",
        "Debit",
        "Credit",
        "Balance",
        width = DESCRIPTION_WIDTH
    ));

    let mut total_debit = Decimal::ZERO;
    let mut total_credit = Decimal::ZERO;

    for record in records {
        total_debit += record.debit_amount().unwrap_or_default();
        total_credit += record.credit_amount().unwrap_or_default();

        output.push_str(&format!(
            "{:<12} {:<12} {:<16} {:<width$} {:>14} {:>14} {:>16}\n",
            record.transaction_date,
            record.value_date,
            truncate(&record.cheque_or_ref_no, 16),
            truncate(&record.description, DESCRIPTION_WIDTH),
            record.debit,
            record.credit,
            record.balance,
            width = DESCRIPTION_WIDTH
        ));
    }

    output.push('\n');
    output.push_str(&format!("Transactions: {}\n", records.len()));
    output.push_str(&format!("Total debit:  {}\n", total_debit));
    output.push_str(&format!("Total credit: {}\n", total_credit));

    output
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
