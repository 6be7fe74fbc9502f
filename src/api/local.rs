//! Implements `CloudStorage` over a local directory.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without using Google Drive.

use crate::api::{CloudStorage, RemoteFile};
use crate::error::Res;
use crate::utils;
use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Separates the id from the name in the stored file names, e.g. `1760612345678a1b2c3d4e--a.json`.
const SEPARATOR: &str = "--";

/// A `CloudStorage` that keeps each file in `dir`, named by its id and its name.
#[derive(Debug, Clone)]
pub(crate) struct LocalCloud {
    dir: PathBuf,
}

impl LocalCloud {
    pub(crate) async fn new(dir: impl Into<PathBuf>) -> Res<Self> {
        let dir = dir.into();
        utils::make_dir(&dir).await?;
        Ok(Self { dir })
    }

    async fn files(&self) -> Res<Vec<(RemoteFile, PathBuf)>> {
        let mut found = Vec::new();
        let mut entries = utils::read_dir(&self.dir).await?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("Unable to read an entry in {}", self.dir.display()))?
        {
            let file_name = entry.file_name().to_string_lossy().to_string();
            if file_name.starts_with('.') {
                continue;
            }
            let Some((id, name)) = file_name.split_once(SEPARATOR) else {
                continue;
            };
            let metadata = entry
                .metadata()
                .await
                .with_context(|| format!("Unable to read metadata of {file_name}"))?;
            let modified_time = metadata.modified().ok().map(DateTime::<Utc>::from);
            found.push((
                RemoteFile {
                    id: id.to_string(),
                    name: name.to_string(),
                    modified_time,
                    size: Some(metadata.len()),
                },
                entry.path(),
            ));
        }
        Ok(found)
    }

    async fn path_of(&self, id: &str) -> Res<PathBuf> {
        match self.files().await?.into_iter().find(|(f, _)| f.id == id) {
            Some((_, path)) => Ok(path),
            None => bail!("There is no file with id '{id}'"),
        }
    }
}

#[async_trait::async_trait]
impl CloudStorage for LocalCloud {
    async fn upload_file(&mut self, name: &str, content: &str) -> Res<String> {
        let id = utils::generate_id();
        let path = self.dir.join(format!("{id}{SEPARATOR}{name}"));
        utils::write(&path, content).await?;
        Ok(id)
    }

    async fn update_file(&mut self, id: &str, content: &str) -> Res<()> {
        let path = self.path_of(id).await?;
        utils::write_replace(&path, content).await
    }

    async fn list_files(&mut self, filter: &str) -> Res<Vec<RemoteFile>> {
        let mut files: Vec<RemoteFile> = self
            .files()
            .await?
            .into_iter()
            .map(|(f, _)| f)
            .filter(|f| f.name.contains(filter))
            .collect();
        // Newest first. Ids grow over time and break ties.
        files.sort_by(|a, b| {
            b.modified_time
                .cmp(&a.modified_time)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(files)
    }

    async fn download_file(&mut self, id: &str) -> Res<String> {
        let path = self.path_of(id).await?;
        utils::read(&path).await
    }

    async fn delete_file(&mut self, id: &str) -> Res<()> {
        let path = self.path_of(id).await?;
        utils::remove(&path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_cloud_round_trip() {
        let tmp = TempDir::new().unwrap();
        let mut cloud = LocalCloud::new(tmp.path().join("cloud")).await.unwrap();
        assert!(tmp.path().join("cloud").is_dir());

        let a = cloud
            .upload_file("financial-backup-2025-03-11.json", "{\"a\":1}")
            .await
            .unwrap();
        let b = cloud
            .upload_file("financial-backup-2025-03-12.json", "{\"b\":2}")
            .await
            .unwrap();
        cloud.upload_file("other.json", "{}").await.unwrap();

        let listed = cloud.list_files("financial-backup-").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().any(|f| f.id == a));
        assert!(listed.iter().any(|f| f.id == b));

        cloud.update_file(&a, "{\"a\":2}").await.unwrap();
        assert_eq!(cloud.download_file(&a).await.unwrap(), "{\"a\":2}");

        cloud.delete_file(&a).await.unwrap();
        assert!(cloud.download_file(&a).await.is_err());
        assert_eq!(cloud.list_files("").await.unwrap().len(), 2);
    }
}
