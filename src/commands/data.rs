//! Whole-document commands: `export`, `import` and `clear`.

use crate::backup::PRE_CLEAR;
use crate::commands::Out;
use crate::error::{Error, ErrorType, IntoResult, Res};
use crate::model::{Document, Transaction};
use crate::store::{ImportReport, Store};
use crate::{utils, Config, Result};
use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The file format written by `export`.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// The whole document, as stored.
    #[default]
    Json,
    /// Transactions only, one row each.
    Csv,
}

serde_plain::derive_display_from_serialize!(ExportFormat);
serde_plain::derive_fromstr_from_deserialize!(ExportFormat);

#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub path: PathBuf,
    pub format: ExportFormat,
    pub records: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClearReport {
    pub removed: bool,
    pub backup: Option<PathBuf>,
}

/// Writes the document to `out`, or to `financial-dashboard-<date>.<format>` in the current
/// directory.
pub async fn export(
    config: &Config,
    out: Option<&Path>,
    format: ExportFormat,
    today: NaiveDate,
) -> Result<Out<ExportReport>> {
    let store = Store::new(config);
    let path = match out {
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(format!(
            "financial-dashboard-{}.{format}",
            today.format("%Y-%m-%d")
        )),
    };

    let (contents, records) = match format {
        ExportFormat::Json => {
            let doc = store.load().await.pub_result(ErrorType::Storage)?;
            let json = serde_json::to_string_pretty(&doc)
                .context("Unable to serialize the document")
                .pub_result(ErrorType::Internal)?;
            (json, doc_size(&doc))
        }
        ExportFormat::Csv => {
            let doc = store.load().await.pub_result(ErrorType::Storage)?;
            let csv = transactions_csv(&doc).pub_result(ErrorType::Internal)?;
            (csv, doc.transactions.len())
        }
    };
    utils::write(&path, contents)
        .await
        .pub_result(ErrorType::Storage)?;

    Ok(Out::new(
        format!("Exported {records} records to {}", path.display()),
        ExportReport {
            path,
            format,
            records,
        },
    ))
}

/// Replaces the document with the contents of `file`. The current document is backed up first.
pub async fn import(config: &Config, file: &Path) -> Result<Out<ImportReport>> {
    if file.extension().and_then(|e| e.to_str()) != Some("json") {
        return Err(Error::new(
            ErrorType::Import,
            anyhow!("Only .json files can be imported, got {}", file.display()),
        ));
    }
    let text = utils::read(file).await.pub_result(ErrorType::Import)?;
    let report = Store::new(config)
        .import(&text)
        .await
        .with_context(|| format!("Unable to import {}", file.display()))
        .pub_result(ErrorType::Import)?;

    let mut message = format!("Imported {}", file.display());
    if !report.warnings.is_empty() {
        message.push_str(&format!(", skipping {} problems", report.warnings.len()));
    }
    Ok(Out::new(message, report))
}

/// Removes the document after saving a backup of it.
pub async fn clear(config: &Config) -> Result<Out<ClearReport>> {
    let store = Store::new(config);
    let backup = if store.has_data() {
        let doc = store.load().await.pub_result(ErrorType::Storage)?;
        Some(
            config
                .backup()
                .save_json(PRE_CLEAR, &doc)
                .await
                .pub_result(ErrorType::Storage)?,
        )
    } else {
        None
    };
    let removed = store.clear().await.pub_result(ErrorType::Storage)?;
    let message = match &backup {
        Some(p) => format!("Cleared all data. A backup was saved to {}", p.display()),
        None => "There was no data to clear".to_string(),
    };
    Ok(Out::new(message, ClearReport { removed, backup }))
}

fn doc_size(doc: &Document) -> usize {
    doc.accounts.len()
        + doc.transactions.len()
        + doc.credit_cards.len()
        + doc.categories.len()
        + doc.recurring_transactions.len()
        + doc.pending_transactions.len()
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    date: NaiveDate,
    description: &'a str,
    #[serde(rename = "type")]
    flow: String,
    amount: String,
    category_id: &'a str,
    category: &'a str,
    account_id: &'a str,
    account: &'a str,
    effectivated: bool,
    notes: &'a str,
}

/// Transactions as CSV, with category and account names looked up.
fn transactions_csv(doc: &Document) -> Res<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for t in &doc.transactions {
        writer
            .serialize(csv_row(doc, t))
            .with_context(|| format!("Unable to write transaction '{}' as CSV", t.id))?;
    }
    let bytes = writer
        .into_inner()
        .context("Unable to finish writing the CSV")?;
    String::from_utf8(bytes).context("The CSV is not valid UTF-8")
}

fn csv_row<'a>(doc: &'a Document, t: &'a Transaction) -> CsvRow<'a> {
    let category_id = t.category_id.as_deref().unwrap_or_default();
    let account_id = t.account_id.as_deref().unwrap_or_default();
    CsvRow {
        id: &t.id,
        date: t.date,
        description: &t.description,
        flow: t.flow.to_string(),
        amount: t.amount.value().normalize().to_string(),
        category_id,
        category: doc
            .categories
            .iter()
            .find(|c| c.id == category_id)
            .map(|c| c.name.as_str())
            .unwrap_or_default(),
        account_id,
        account: doc
            .accounts
            .iter()
            .find(|a| a.id == account_id)
            .map(|a| a.name.as_str())
            .unwrap_or_default(),
        effectivated: t.effectivated,
        notes: t.notes.as_deref().unwrap_or_default(),
    }
}
