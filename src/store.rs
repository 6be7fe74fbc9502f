//! The local store: a single JSON file that holds the whole `Document`.

use crate::backup::{Backup, CORRUPT, PRE_IMPORT, PRE_PULL};
use crate::error::Res;
use crate::model::{Document, DOCUMENT_VERSION};
use crate::{utils, Config};
use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Reads and writes the document file. Every save rewrites the whole file.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    backup: Backup,
}

/// What an import did.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    /// Where the previous document was saved, if there was one.
    pub backup: Option<PathBuf>,
    /// Problems that were skipped over.
    pub warnings: Vec<String>,
    pub accounts: usize,
    pub transactions: usize,
    pub credit_cards: usize,
    pub categories: usize,
    pub recurring_transactions: usize,
    pub pending_transactions: usize,
}

impl Store {
    pub fn new(config: &Config) -> Self {
        Self {
            path: config.data_path(),
            backup: config.backup(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the document.
    ///
    /// A missing file is an empty document. A file that cannot be parsed is copied to the backups
    /// directory and an empty document is returned in its place, so that a damaged file never
    /// locks the user out. Records that fail to parse are dropped with a warning.
    pub async fn load(&self) -> Res<Document> {
        let Some(text) = utils::read_if_exists(&self.path).await? else {
            debug!("No data file at {}, starting empty", self.path.display());
            return Ok(Document::default());
        };

        match Document::from_json_lenient(&text) {
            Ok((doc, warnings)) => {
                if warnings.is_empty() {
                    return Ok(doc);
                }
                for warning in &warnings {
                    warn!("{}: {warning}", self.path.display());
                }
                // The skipped records are gone once the document is saved again.
                match self.backup.save_raw(CORRUPT, &text).await {
                    Ok(p) => warn!("The data file as read was saved to {}", p.display()),
                    Err(e) => error!("Unable to save a copy of the data file: {e:#}"),
                }
                Ok(doc)
            }
            Err(e) => {
                error!(
                    "Unable to parse the data file {}, starting empty: {e:#}",
                    self.path.display()
                );
                match self.backup.save_raw(CORRUPT, &text).await {
                    Ok(p) => error!("The unreadable data file was saved to {}", p.display()),
                    Err(e) => error!("Unable to save a copy of the unreadable data file: {e:#}"),
                }
                Ok(Document::default())
            }
        }
    }

    /// Stamps `doc` with the current time and version and writes it.
    pub async fn save(&self, doc: &mut Document) -> Res<()> {
        doc.last_updated = Some(Utc::now());
        doc.version = DOCUMENT_VERSION.to_string();
        let json = serde_json::to_string_pretty(doc).context("Unable to serialize the document")?;
        utils::write_replace(&self.path, json)
            .await
            .context("Unable to save the document")?;
        debug!("Saved document to {}", self.path.display());
        Ok(())
    }

    /// Removes the data file. Returns `false` if there was none.
    pub async fn clear(&self) -> Res<bool> {
        utils::remove(&self.path).await
    }

    pub fn has_data(&self) -> bool {
        self.path.is_file()
    }

    /// The current document as pretty JSON.
    pub async fn export(&self) -> Res<String> {
        let doc = self.load().await?;
        serde_json::to_string_pretty(&doc).context("Unable to serialize the document")
    }

    /// Replaces the document with the one parsed from `text`.
    ///
    /// `text` must be a JSON object. Missing collections are empty and unreadable records are
    /// skipped, see `Document::from_json_lenient`. The existing document is backed up first.
    pub async fn import(&self, text: &str) -> Res<ImportReport> {
        self.replace(text, PRE_IMPORT).await
    }

    /// Like `import`, for a document downloaded from the cloud.
    pub async fn restore(&self, text: &str) -> Res<ImportReport> {
        self.replace(text, PRE_PULL).await
    }

    async fn replace(&self, text: &str, backup_prefix: &str) -> Res<ImportReport> {
        let (mut doc, warnings) = Document::from_json_lenient(text)?;
        for warning in &warnings {
            warn!("{backup_prefix}: {warning}");
        }

        let backup = if self.has_data() {
            let current = self.load().await?;
            Some(self.backup.save_json(backup_prefix, &current).await?)
        } else {
            None
        };

        self.save(&mut doc).await?;
        info!("Replaced the data in {}", self.path.display());

        Ok(ImportReport {
            backup,
            warnings,
            accounts: doc.accounts.len(),
            transactions: doc.transactions.len(),
            credit_cards: doc.credit_cards.len(),
            categories: doc.categories.len(),
            recurring_transactions: doc.recurring_transactions.len(),
            pending_transactions: doc.pending_transactions.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_load_missing_is_default() {
        let env = TestEnv::new().await;
        let store = env.store();
        assert!(!store.has_data());
        assert_eq!(store.load().await.unwrap(), Document::default());
    }

    #[tokio::test]
    async fn test_save_stamps_and_loads() {
        let env = TestEnv::new().await;
        let store = env.store();
        let mut doc = TestEnv::seed_document();
        doc.version = "0.1".to_string();
        store.save(&mut doc).await.unwrap();
        assert!(store.has_data());
        assert_eq!(doc.version, DOCUMENT_VERSION);
        assert!(doc.last_updated.is_some());
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, doc);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_backed_up() {
        let env = TestEnv::new().await;
        let store = env.store();
        utils::write(store.path(), "{ this is not json").await.unwrap();
        let doc = store.load().await.unwrap();
        assert_eq!(doc, Document::default());
        let copies = env.config().backup().list(CORRUPT).await.unwrap();
        assert_eq!(copies.len(), 1);
        assert_eq!(
            utils::read(&copies[0]).await.unwrap(),
            "{ this is not json"
        );
    }

    #[tokio::test]
    async fn test_skipped_records_are_backed_up() {
        let env = TestEnv::new().await;
        let store = env.store();
        let text = r#"{
            "accounts": [{"id": "a1", "name": "Nubank", "type": "checking", "balance": 10}],
            "transactions": [{"id": "t1", "description": "Aluguel", "amount": 1500,
                "type": "expense", "date": ""}]
        }"#;
        utils::write(store.path(), text).await.unwrap();

        let doc = store.load().await.unwrap();
        assert_eq!(doc.accounts.len(), 1);
        assert!(doc.transactions.is_empty());
        let copies = env.config().backup().list(CORRUPT).await.unwrap();
        assert_eq!(copies.len(), 1);
        assert!(utils::read(&copies[0]).await.unwrap().contains("Aluguel"));

        let mut doc = store.load().await.unwrap();
        store.save(&mut doc).await.unwrap();
        store.load().await.unwrap();
        assert_eq!(env.config().backup().list(CORRUPT).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_export_import_round_trip() {
        let env = TestEnv::new().await;
        let store = env.store();
        let mut doc = TestEnv::seed_document();
        store.save(&mut doc).await.unwrap();

        let exported = store.export().await.unwrap();
        store.clear().await.unwrap();
        assert!(!store.has_data());

        let report = store.import(&exported).await.unwrap();
        assert!(report.backup.is_none());
        assert!(report.warnings.is_empty());
        assert_eq!(report.transactions, doc.transactions.len());

        let mut imported = store.load().await.unwrap();
        imported.last_updated = doc.last_updated;
        assert_eq!(imported, doc);
    }

    #[tokio::test]
    async fn test_import_backs_up_and_skips_bad_records() {
        let env = TestEnv::new().await;
        let store = env.store();
        store.save(&mut TestEnv::seed_document()).await.unwrap();

        let text = r#"{
            "accounts": [{"id":"x1","name":"Nova Conta","type":"savings","balance":10}],
            "transactions": [{"id":"broken"}]
        }"#;
        let report = store.import(text).await.unwrap();
        assert!(report.backup.as_ref().unwrap().is_file());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.accounts, 1);
        assert_eq!(report.transactions, 0);

        let doc = store.load().await.unwrap();
        assert_eq!(doc.accounts[0].name, "Nova Conta");
        assert!(doc.categories.is_empty());
    }

    #[tokio::test]
    async fn test_import_rejects_non_object() {
        let env = TestEnv::new().await;
        let store = env.store();
        assert!(store.import("[]").await.is_err());
        assert!(!store.has_data());
    }
}
