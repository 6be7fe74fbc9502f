//! Cloud storage for whole-document backups.
//!
//! `CloudStorage` is the seam between the sync commands and the provider. `DriveStorage` talks to
//! Google Drive; `LocalCloud` keeps the files in a directory under the findash home so that the
//! whole program can run without Google. `Mode::from_env` picks between them.

mod drive;
mod files;
mod local;
mod oauth;

use crate::error::Res;
use crate::Config;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub(crate) use drive::DriveStorage;
pub(crate) use local::LocalCloud;
pub(crate) use oauth::TokenProvider;

/// Only files created by this app are visible to it.
const OAUTH_SCOPES: &[&str] = &["https://www.googleapis.com/auth/drive.file"];

/// Set this to any non-empty value to use `LocalCloud` instead of Google Drive.
pub const TEST_MODE_ENV: &str = "FINDASH_IN_TEST_MODE";

/// Name prefix of the backups pushed to the cloud.
pub const BACKUP_PREFIX: &str = "financial-backup-";

/// A file held by the cloud provider.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// The operations the sync commands need from a file store.
#[async_trait::async_trait]
pub trait CloudStorage: Send {
    /// Creates a new file and returns its id.
    async fn upload_file(&mut self, name: &str, content: &str) -> Res<String>;

    /// Replaces the content of an existing file.
    async fn update_file(&mut self, id: &str, content: &str) -> Res<()>;

    /// Files whose name contains `filter`, most recently modified first.
    async fn list_files(&mut self, filter: &str) -> Res<Vec<RemoteFile>>;

    async fn download_file(&mut self, id: &str) -> Res<String>;

    async fn delete_file(&mut self, id: &str) -> Res<()>;
}

/// Selects the `CloudStorage` implementation.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Google,
    Test,
}

serde_plain::derive_display_from_serialize!(Mode);

impl Mode {
    /// `Test` when `FINDASH_IN_TEST_MODE` is set to a non-empty value.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.trim().is_empty() => Mode::Test,
            _ => Mode::Google,
        }
    }
}

/// Creates the cloud storage for `mode`. In `Google` mode this needs a saved OAuth token; it never
/// opens a browser.
pub(crate) async fn cloud(config: &Config, mode: Mode) -> Res<Box<dyn CloudStorage>> {
    match mode {
        Mode::Google => {
            let token_provider =
                TokenProvider::load(&config.client_secret_path(), &config.token_path()).await?;
            Ok(Box::new(DriveStorage::new(token_provider)))
        }
        Mode::Test => Ok(Box::new(LocalCloud::new(config.cloud_test_dir()).await?)),
    }
}

/// The name of the backup pushed on `date`.
pub fn backup_name(date: NaiveDate) -> String {
    format!("{BACKUP_PREFIX}{}.json", date.format("%Y-%m-%d"))
}

#[test]
fn test_backup_name() {
    let date = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
    assert_eq!(backup_name(date), "financial-backup-2025-03-12.json");
}
