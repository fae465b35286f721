//! Config command - inspect and edit the pipeline configuration file.
//!
//! Keys are dotted paths into `PassbookConfig` (`pdf.render_dpi`,
//! `ocr.model_dir`, `extraction.drop_zero_amounts`). Every edit is
//! round-tripped through the typed config and checked before it is saved.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use serde_json::Value;

use passbook_core::models::config::PassbookConfig;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show the effective configuration and OCR model files
    Show,

    /// Write a configuration file with default values
    Init {
        /// Directory holding the OCR models
        #[arg(short, long)]
        model_dir: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// List every key with its current value
    Keys,

    /// Print one value or section, e.g. "pdf.page_ocr_threshold"
    Get { key: String },

    /// Change one value, e.g. `set ocr.keep_unk true`
    Set { key: String, value: String },

    /// Show where the configuration file lives
    Path,
}

pub async fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let path = config_file(config_path);
    match args.command {
        ConfigCommand::Show => show_config(&path),
        ConfigCommand::Init { model_dir, force } => init_config(&path, model_dir, force),
        ConfigCommand::Keys => list_keys(&path),
        ConfigCommand::Get { key } => get_config(&path, &key),
        ConfigCommand::Set { key, value } => set_config(&path, &key, &value),
        ConfigCommand::Path => show_path(&path),
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("passbook")
        .join("config.json")
}

/// `--config` when given, otherwise the per-user file.
fn config_file(config_path: Option<&str>) -> PathBuf {
    config_path.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Explicit `--config` file, else the default file when present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<PassbookConfig> {
    if let Some(path) = config_path {
        return Ok(PassbookConfig::from_file(Path::new(path))?);
    }
    load_or_default(&default_config_path())
}

fn load_or_default(path: &Path) -> anyhow::Result<PassbookConfig> {
    if path.exists() {
        Ok(PassbookConfig::from_file(path)?)
    } else {
        Ok(PassbookConfig::default())
    }
}

/// Reject values the pipeline cannot run with.
fn validate(config: &PassbookConfig) -> anyhow::Result<()> {
    if !(72..=1200).contains(&config.pdf.render_dpi) {
        anyhow::bail!("pdf.render_dpi must be between 72 and 1200");
    }
    if config.pdf.classify_pages == 0 {
        anyhow::bail!("pdf.classify_pages must be at least 1");
    }
    if config.extraction.min_table_rows == 0 {
        anyhow::bail!("extraction.min_table_rows must be at least 1");
    }
    if config.ocr.row_tolerance_px <= 0.0 {
        anyhow::bail!("ocr.row_tolerance_px must be positive");
    }
    for (key, name) in [
        ("ocr.detection_model", &config.ocr.detection_model),
        ("ocr.recognition_model", &config.ocr.recognition_model),
        ("ocr.dictionary", &config.ocr.dictionary),
    ] {
        if name.trim().is_empty() {
            anyhow::bail!("{} must name a file", key);
        }
    }
    Ok(())
}

/// `pdf.max_pages` -> `/pdf/max_pages`.
fn pointer(key: &str) -> String {
    key.split('.').map(|part| format!("/{}", part)).collect()
}

/// Dotted leaf keys in document order.
fn leaf_keys(value: &Value, prefix: &str, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(map) => {
            for (name, child) in map {
                let key = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{}.{}", prefix, name)
                };
                leaf_keys(child, &key, out);
            }
        }
        leaf => out.push((prefix.to_string(), leaf.clone())),
    }
}

/// Apply `key = raw` to a config. `raw` is read as JSON when it parses,
/// otherwise as a string, and must fit the key's type.
fn apply(config: &PassbookConfig, key: &str, raw: &str) -> anyhow::Result<PassbookConfig> {
    let mut json = serde_json::to_value(config)?;
    let slot = json
        .pointer_mut(&pointer(key))
        .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))?;
    if slot.is_object() {
        anyhow::bail!("{} is a section; set one of its keys instead", key);
    }

    *slot = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));

    let updated: PassbookConfig = serde_json::from_value(json)
        .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e))?;
    validate(&updated)?;
    Ok(updated)
}

fn show_config(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        println!(
            "{} No config file at {}, showing defaults.",
            style("ℹ").blue(),
            path.display()
        );
    }
    let config = load_or_default(path)?;

    println!("{}", serde_json::to_string_pretty(&config)?);
    println!();
    println!("OCR models:");
    for name in [
        &config.ocr.detection_model,
        &config.ocr.recognition_model,
        &config.ocr.dictionary,
    ] {
        let model = config.model_path(name);
        let status = if model.exists() {
            style("found").green()
        } else {
            style("missing").yellow()
        };
        println!("  {} ({})", model.display(), status);
    }

    Ok(())
}

fn init_config(path: &Path, model_dir: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut config = PassbookConfig::default();
    if let Some(dir) = model_dir {
        config.ocr.model_dir = dir;
    }
    config.save(path)?;

    println!(
        "{} Created configuration file at {}",
        style("✓").green(),
        path.display()
    );
    Ok(())
}

fn list_keys(path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_value(load_or_default(path)?)?;
    let mut keys = Vec::new();
    leaf_keys(&json, "", &mut keys);

    for (key, value) in keys {
        println!("{:<32} {}", key, value);
    }
    Ok(())
}

fn get_config(path: &Path, key: &str) -> anyhow::Result<()> {
    let json = serde_json::to_value(load_or_default(path)?)?;
    let value = json
        .pointer(&pointer(key))
        .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))?;

    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn set_config(path: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let config = apply(&load_or_default(path)?, key, value)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    config.save(path)?;

    let stored = serde_json::to_value(&config)?;
    println!(
        "{} Set {} = {}",
        style("✓").green(),
        key,
        stored.pointer(&pointer(key)).unwrap_or(&Value::Null)
    );
    Ok(())
}

fn show_path(path: &Path) -> anyhow::Result<()> {
    println!("Configuration file: {}", path.display());

    if path.exists() {
        println!("Status: {}", style("exists").green());
    } else {
        println!("Status: {}", style("not created").yellow());
        println!();
        println!("Run 'passbook config init' to create a configuration file.");
    }
    Ok(())
}
