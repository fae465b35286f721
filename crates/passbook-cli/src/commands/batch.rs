//! Batch extraction over many statement files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use passbook_core::TransactionRecord;
use passbook_core::models::config::PassbookConfig;

use super::config::load_config;
use super::extract::{IMAGE_EXTENSIONS, OutputFormat, build_orchestrator, extract_file, format_records};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input glob pattern, e.g. "statements/*.pdf"
    #[arg(required = true)]
    input: String,

    /// Institution key or alias shared by every file
    #[arg(short, long)]
    bank: String,

    /// Password for encrypted statements
    #[arg(short, long)]
    password: Option<String>,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// OCR model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Do not load the OCR engine
    #[arg(long)]
    no_ocr: bool,
}

/// Result of processing a single file.
struct FileResult {
    path: PathBuf,
    records: Option<Vec<TransactionRecord>>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(dir) = &args.model_dir {
        config.ocr.model_dir = dir.clone();
    }

    // Reject an unknown bank once instead of once per file.
    build_orchestrator(&config, true).registry().get(&args.bank)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_statement_file(p))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    // Each task owns its pipeline; the semaphore bounds how many run at once.
    let permits = Arc::new(Semaphore::new(args.jobs.max(1)));
    let mut handles = Vec::with_capacity(files.len());

    for path in files {
        let permits = Arc::clone(&permits);
        let config = config.clone();
        let bank = args.bank.clone();
        let password = args.password.clone();
        let no_ocr = args.no_ocr;

        handles.push(tokio::spawn(async move {
            let _permit = permits.acquire_owned().await?;
            let task = tokio::task::spawn_blocking(move || {
                process_file(path, &config, &bank, password.as_deref(), no_ocr)
            });
            Ok::<FileResult, anyhow::Error>(task.await?)
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        let result = handle.await??;

        if let Some(error_msg) = &result.error {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", result.path.display(), error_msg);
            } else {
                error!("Failed to process {}: {}", result.path.display(), error_msg);
                overall_pb.abandon();
                anyhow::bail!("Processing failed for {}: {}", result.path.display(), error_msg);
            }
        }

        if let (Some(records), Some(output_dir)) = (&result.records, &args.output_dir) {
            write_output(output_dir, &result.path, records, args.format)?;
        }

        results.push(result);
        overall_pb.inc(1);
    }

    overall_pb.finish_with_message("Complete");

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();
    let transactions: usize = results
        .iter()
        .filter_map(|r| r.records.as_ref())
        .map(Vec::len)
        .sum();

    eprintln!();
    eprintln!(
        "{} Processed {} files ({} transactions) in {:?}",
        style("✓").green(),
        results.len(),
        transactions,
        start.elapsed()
    );
    eprintln!(
        "   {} successful, {} failed",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        eprintln!();
        eprintln!("{}", style("Failed files:").red());
        for result in &failed {
            eprintln!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn is_statement_file(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    ext == "pdf" || IMAGE_EXTENSIONS.contains(&ext.as_str())
}

fn process_file(
    path: PathBuf,
    config: &PassbookConfig,
    bank: &str,
    password: Option<&str>,
    no_ocr: bool,
) -> FileResult {
    let file_start = Instant::now();
    let orchestrator = build_orchestrator(config, no_ocr);
    let outcome = extract_file(&orchestrator, &path, bank, password);
    let processing_time_ms = file_start.elapsed().as_millis() as u64;

    match outcome {
        Ok(records) => {
            debug!("{}: {} transactions", path.display(), records.len());
            FileResult {
                path,
                records: Some(records),
                error: None,
                processing_time_ms,
            }
        }
        Err(e) => FileResult {
            path,
            records: None,
            error: Some(e.to_string()),
            processing_time_ms,
        },
    }
}

fn write_output(
    output_dir: &Path,
    input: &Path,
    records: &[TransactionRecord],
    format: OutputFormat,
) -> anyhow::Result<()> {
    let output_name = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("statement");

    let output_path = output_dir.join(format!("{}.{}", output_name, format.extension()));
    fs::write(&output_path, format_records(records, format)?)?;
    debug!("Wrote output to {}", output_path.display());
    Ok(())
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "transactions",
        "total_debit",
        "total_credit",
        "closing_balance",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(records) = &result.records {
            let total_debit: Decimal = records.iter().filter_map(|r| r.debit_amount()).sum();
            let total_credit: Decimal = records.iter().filter_map(|r| r.credit_amount()).sum();
            let closing_balance = records
                .last()
                .map(|r| r.balance.clone())
                .unwrap_or_default();

            wtr.write_record([
                filename,
                "success",
                &records.len().to_string(),
                &total_debit.to_string(),
                &total_credit.to_string(),
                &closing_balance,
                &result.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
