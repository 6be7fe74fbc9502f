//! Cloud backup commands: `cloud push`, `cloud pull`, `cloud list` and `cloud delete`.
//!
//! A push uploads the whole document and a pull replaces the whole document. Nothing is merged.

use crate::api::{backup_name, cloud, CloudStorage, Mode, RemoteFile, BACKUP_PREFIX};
use crate::commands::Out;
use crate::error::{Error, ErrorType, IntoResult};
use crate::store::{ImportReport, Store};
use crate::{Config, Result};
use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
pub struct PushReport {
    pub id: String,
    pub name: String,
    /// `true` when an existing file from the same day was overwritten.
    pub updated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PullReport {
    pub file: RemoteFile,
    #[serde(flatten)]
    pub import: ImportReport,
}

/// Uploads the document as `financial-backup-<today>.json`, replacing the file from earlier the
/// same day if there is one.
pub async fn cloud_push(
    config: &Config,
    mode: Mode,
    today: NaiveDate,
) -> Result<Out<PushReport>> {
    let content = Store::new(config)
        .export()
        .await
        .pub_result(ErrorType::Storage)?;
    let mut storage = connect(config, mode).await?;
    let name = backup_name(today);

    let existing = storage
        .list_files(BACKUP_PREFIX)
        .await
        .context("Unable to list the cloud backups")
        .pub_result(ErrorType::Cloud)?
        .into_iter()
        .find(|f| f.name == name);

    let report = match existing {
        Some(file) => {
            debug!("Updating cloud file '{}'", file.id);
            storage
                .update_file(&file.id, &content)
                .await
                .with_context(|| format!("Unable to update {name} in the cloud"))
                .pub_result(ErrorType::Cloud)?;
            PushReport {
                id: file.id,
                name,
                updated: true,
            }
        }
        None => {
            let id = storage
                .upload_file(&name, &content)
                .await
                .with_context(|| format!("Unable to upload {name} to the cloud"))
                .pub_result(ErrorType::Cloud)?;
            PushReport {
                id,
                name,
                updated: false,
            }
        }
    };

    Ok(Out::new(format!("Pushed {} to the cloud", report.name), report))
}

/// Replaces the local document with a cloud backup: the one with `id`, or the most recent one.
/// The local document is backed up first.
pub async fn cloud_pull(
    config: &Config,
    mode: Mode,
    id: Option<&str>,
) -> Result<Out<PullReport>> {
    let mut storage = connect(config, mode).await?;
    let files = list_backups(storage.as_mut()).await?;
    let file = match id {
        Some(id) => files.into_iter().find(|f| f.id == id).ok_or_else(|| {
            Error::new(
                ErrorType::NotFound,
                anyhow!("There is no cloud backup with id '{id}'"),
            )
        })?,
        None => files.into_iter().next().ok_or_else(|| {
            Error::new(
                ErrorType::NotFound,
                anyhow!("There are no backups in the cloud"),
            )
        })?,
    };

    let content = storage
        .download_file(&file.id)
        .await
        .with_context(|| format!("Unable to download {}", file.name))
        .pub_result(ErrorType::Cloud)?;
    let import = Store::new(config)
        .restore(&content)
        .await
        .with_context(|| format!("Unable to restore {}", file.name))
        .pub_result(ErrorType::Import)?;

    let mut message = format!("Pulled {} from the cloud", file.name);
    if let Some(backup) = &import.backup {
        message.push_str(&format!(
            ". The previous data was saved to {}",
            backup.display()
        ));
    }
    Ok(Out::new(message, PullReport { file, import }))
}

/// The cloud backups, most recent first.
pub async fn cloud_list(config: &Config, mode: Mode) -> Result<Out<Vec<RemoteFile>>> {
    let mut storage = connect(config, mode).await?;
    let files = list_backups(storage.as_mut()).await?;
    Ok(Out::new(
        format!("Found {} backups in the cloud", files.len()),
        files,
    ))
}

pub async fn cloud_delete(config: &Config, mode: Mode, id: &str) -> Result<Out<()>> {
    let mut storage = connect(config, mode).await?;
    storage
        .delete_file(id)
        .await
        .with_context(|| format!("Unable to delete the cloud backup '{id}'"))
        .pub_result(ErrorType::Cloud)?;
    Ok(format!("Deleted the cloud backup '{id}'").into())
}

async fn connect(config: &Config, mode: Mode) -> Result<Box<dyn CloudStorage>> {
    debug!("Connecting to cloud storage in {mode} mode");
    cloud(config, mode)
        .await
        .context("Unable to connect to cloud storage. Have you run 'findash auth'?")
        .pub_result(ErrorType::Auth)
}

async fn list_backups(storage: &mut dyn CloudStorage) -> Result<Vec<RemoteFile>> {
    storage
        .list_files(BACKUP_PREFIX)
        .await
        .context("Unable to list the cloud backups")
        .pub_result(ErrorType::Cloud)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::PRE_PULL;
    use crate::test::{date, TestEnv};

    #[tokio::test]
    async fn test_push_twice_updates_the_same_file() {
        let env = TestEnv::with_seed().await;
        let config = env.config();

        let first = cloud_push(&config, Mode::Test, TestEnv::today()).await.unwrap();
        let first = first.structure().unwrap().clone();
        assert!(!first.updated);
        assert_eq!(first.name, "financial-backup-2025-03-12.json");

        let second = cloud_push(&config, Mode::Test, TestEnv::today()).await.unwrap();
        let second = second.structure().unwrap();
        assert!(second.updated);
        assert_eq!(second.id, first.id);

        cloud_push(&config, Mode::Test, date("2025-03-13"))
            .await
            .unwrap();
        let listed = cloud_list(&config, Mode::Test).await.unwrap();
        assert_eq!(listed.structure().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_pull_replaces_local_data() {
        let env = TestEnv::with_seed().await;
        let config = env.config();
        let pushed = cloud_push(&config, Mode::Test, TestEnv::today()).await.unwrap();
        let id = pushed.structure().unwrap().id.clone();

        let mut doc = env.store().load().await.unwrap();
        doc.transactions.clear();
        env.store().save(&mut doc).await.unwrap();

        let out = cloud_pull(&config, Mode::Test, Some(&id)).await.unwrap();
        let report = out.structure().unwrap();
        assert_eq!(report.import.transactions, 7);
        assert!(report.import.backup.is_some());
        assert_eq!(env.store().load().await.unwrap().transactions.len(), 7);
        assert_eq!(config.backup().list(PRE_PULL).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_pull_with_nothing_in_the_cloud() {
        let env = TestEnv::with_seed().await;
        let err = cloud_pull(&env.config(), Mode::Test, None)
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::NotFound);
        assert_eq!(env.store().load().await.unwrap().transactions.len(), 7);
    }

    #[tokio::test]
    async fn test_delete() {
        let env = TestEnv::with_seed().await;
        let config = env.config();
        let pushed = cloud_push(&config, Mode::Test, TestEnv::today()).await.unwrap();
        let id = pushed.structure().unwrap().id.clone();

        cloud_delete(&config, Mode::Test, &id).await.unwrap();
        let listed = cloud_list(&config, Mode::Test).await.unwrap();
        assert!(listed.structure().unwrap().is_empty());

        let err = cloud_delete(&config, Mode::Test, &id).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Cloud);
    }
}
