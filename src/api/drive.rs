//! Implements `CloudStorage` with the Google Drive v3 REST API.

use crate::api::{CloudStorage, RemoteFile, TokenProvider};
use crate::error::Res;
use anyhow::Context;
use chrono::{DateTime, Utc};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::trace;

const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const BOUNDARY: &str = "findash-upload-boundary";
const JSON: &str = "application/json";
const PAGE_SIZE: &str = "100";

/// Talks to Drive with the access token from a `TokenProvider`, refreshing it before each call
/// when it is about to expire.
pub(crate) struct DriveStorage {
    token_provider: TokenProvider,
    client: reqwest::Client,
}

impl DriveStorage {
    pub(crate) fn new(token_provider: TokenProvider) -> Self {
        Self {
            token_provider,
            client: reqwest::Client::new(),
        }
    }

    async fn token(&mut self) -> Res<String> {
        Ok(self.token_provider.token_with_refresh().await?.to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    /// Present when there are more results.
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    #[serde(default)]
    modified_time: Option<DateTime<Utc>>,
    /// Drive sends the size as a string.
    #[serde(default)]
    size: Option<String>,
}

impl From<DriveFile> for RemoteFile {
    fn from(f: DriveFile) -> Self {
        RemoteFile {
            id: f.id,
            name: f.name,
            modified_time: f.modified_time,
            size: f.size.and_then(|s| s.parse().ok()),
        }
    }
}

#[async_trait::async_trait]
impl CloudStorage for DriveStorage {
    async fn upload_file(&mut self, name: &str, content: &str) -> Res<String> {
        trace!("upload_file {name}");
        let token = self.token().await?;
        let metadata = serde_json::json!({ "name": name, "mimeType": JSON });
        let body = multipart_body(&metadata.to_string(), content);
        let response = self
            .client
            .post(UPLOAD_URL)
            .query(&[("uploadType", "multipart"), ("fields", "id")])
            .bearer_auth(token)
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={BOUNDARY}"),
            )
            .body(body)
            .send()
            .await
            .context("Failed to send upload request to Google Drive API")?;
        let response = check(response, "upload").await?;

        let json: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse Google Drive API response")?;
        let id = json
            .get("id")
            .and_then(|v| v.as_str())
            .context("Google Drive API response missing 'id' field")?
            .to_string();
        Ok(id)
    }

    async fn update_file(&mut self, id: &str, content: &str) -> Res<()> {
        trace!("update_file {id}");
        let token = self.token().await?;
        let response = self
            .client
            .patch(format!("{UPLOAD_URL}/{id}"))
            .query(&[("uploadType", "media")])
            .bearer_auth(token)
            .header(CONTENT_TYPE, JSON)
            .body(content.to_string())
            .send()
            .await
            .context("Failed to send update request to Google Drive API")?;
        check(response, "update").await?;
        Ok(())
    }

    async fn list_files(&mut self, filter: &str) -> Res<Vec<RemoteFile>> {
        trace!("list_files {filter}");
        let q = format!(
            "name contains '{}' and trashed = false",
            filter.replace('\\', "\\\\").replace('\'', "\\'")
        );
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let token = self.token().await?;
            let mut request = self.client.get(FILES_URL).query(&[
                ("q", q.as_str()),
                ("orderBy", "modifiedTime desc"),
                ("fields", "nextPageToken,files(id,name,modifiedTime,size)"),
                ("pageSize", PAGE_SIZE),
            ]);
            if let Some(page_token) = page_token.take() {
                request = request.query(&[("pageToken", page_token)]);
            }
            let response = request
                .bearer_auth(token)
                .send()
                .await
                .context("Failed to send list request to Google Drive API")?;
            let response = check(response, "list").await?;

            let list: FileList = response
                .json()
                .await
                .context("Failed to parse Google Drive API file list")?;
            files.extend(list.files.into_iter().map(RemoteFile::from));
            match list.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }
        trace!("list_files found {} files", files.len());
        Ok(files)
    }

    async fn download_file(&mut self, id: &str) -> Res<String> {
        trace!("download_file {id}");
        let token = self.token().await?;
        let response = self
            .client
            .get(format!("{FILES_URL}/{id}"))
            .query(&[("alt", "media")])
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to send download request to Google Drive API")?;
        let response = check(response, "download").await?;
        response
            .text()
            .await
            .context("Failed to read the downloaded file")
    }

    async fn delete_file(&mut self, id: &str) -> Res<()> {
        trace!("delete_file {id}");
        let token = self.token().await?;
        let response = self
            .client
            .delete(format!("{FILES_URL}/{id}"))
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to send delete request to Google Drive API")?;
        check(response, "delete").await?;
        Ok(())
    }
}

/// Fails with the response body when the status is not a success.
async fn check(response: reqwest::Response, action: &str) -> Res<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read response body".to_string());
    anyhow::bail!("Google Drive API {action} failed with status {status}: {body}")
}

/// A `multipart/related` body with the JSON metadata part followed by the file content.
fn multipart_body(metadata: &str, content: &str) -> String {
    format!(
        "--{BOUNDARY}\r\nContent-Type: {JSON}; charset=UTF-8\r\n\r\n{metadata}\r\n\
        --{BOUNDARY}\r\nContent-Type: {JSON}\r\n\r\n{content}\r\n--{BOUNDARY}--\r\n"
    )
}

#[test]
fn test_multipart_body() {
    let body = multipart_body(r#"{"name":"a.json"}"#, "{}");
    assert!(body.starts_with("--findash-upload-boundary\r\n"));
    assert!(body.contains("\r\n\r\n{\"name\":\"a.json\"}\r\n"));
    assert!(body.ends_with("\r\n{}\r\n--findash-upload-boundary--\r\n"));
}

#[test]
fn test_drive_file_size_is_parsed() {
    let list: FileList = serde_json::from_str(
        r#"{"files":[{"id":"1","name":"financial-backup-2025-03-12.json",
            "modifiedTime":"2025-03-12T10:00:00.000Z","size":"2048"}]}"#,
    )
    .unwrap();
    let files: Vec<RemoteFile> = list.files.into_iter().map(RemoteFile::from).collect();
    assert_eq!(files[0].size, Some(2048));
    assert!(files[0].modified_time.is_some());
}

#[test]
fn test_file_list_pages() {
    let first: FileList = serde_json::from_str(
        r#"{"nextPageToken":"abc","files":[{"id":"1","name":"financial-backup-2025-03-12.json"}]}"#,
    )
    .unwrap();
    assert_eq!(first.next_page_token.as_deref(), Some("abc"));
    assert_eq!(first.files.len(), 1);

    let last: FileList = serde_json::from_str(r#"{"files":[]}"#).unwrap();
    assert!(last.next_page_token.is_none());
}
