//! The OAuth credential files kept in the secrets directory.
//! - `client_secret.json`: OAuth 2.0 client credentials from Google Cloud Console
//! - `token.json`: the access and refresh tokens saved after signing in

use crate::api::OAUTH_SCOPES;
use crate::error::Res;
use crate::utils;
use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, Error};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// This redirect needs to be present in the OAuth credential file, or else OAuth will not work.
const REDIRECT: &str = "http://localhost";

/// Tokens are refreshed when they expire within this many minutes.
const EXPIRY_MARGIN_MINUTES: i64 = 5;

/// A JSON file together with the path it was loaded from.
#[derive(Default, Debug, Clone)]
pub(super) struct File<F>
where
    F: Serialize + DeserializeOwned + Clone + Debug,
{
    path: PathBuf,
    data: F,
}

impl<F> File<F>
where
    F: Serialize + DeserializeOwned + Clone + Debug,
{
    pub(super) async fn load(path: impl Into<PathBuf>) -> Res<Self> {
        let path = path.into();
        let data: F = utils::deserialize(&path).await?;
        Ok(Self { path, data })
    }

    pub(super) fn new(path: impl Into<PathBuf>, data: F) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }

    /// Writes the data back to the file, readable only by the owner.
    pub(super) async fn save(&self) -> Res<()> {
        let json =
            serde_json::to_string_pretty(&self.data).context("Failed to serialize data to JSON")?;
        utils::write(&self.path, json).await?;

        #[cfg(unix)]
        {
            use std::fs::Permissions;
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, Permissions::from_mode(0o600))
                .context("Failed to set file permissions")?;
        }

        Ok(())
    }

    pub(super) fn data(&self) -> &F {
        &self.data
    }

    pub(super) fn data_mut(&mut self) -> &mut F {
        &mut self.data
    }
}

/// Represents the structure of the `client_secret.json` file downloaded from Google Cloud Console.
///
/// This file contains OAuth 2.0 Desktop Application credentials. The standard format from Google
/// has an "installed" wrapper around the actual credentials.
///
/// Example:
/// ```json
/// {
///   "installed": {
///     "client_id": "YOUR_CLIENT_ID.apps.googleusercontent.com",
///     "client_secret": "YOUR_CLIENT_SECRET",
///     "redirect_uris": ["http://localhost"],
///     "auth_uri": "https://accounts.google.com/o/oauth2/auth",
///     "token_uri": "https://oauth2.googleapis.com/token"
///   }
/// }
/// ```
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) struct SecretFile {
    installed: InstalledCredentials,
}

impl SecretFile {
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or has no usable redirect.
    pub(crate) async fn load(path: &Path) -> Res<SecretFile> {
        utils::deserialize(path).await.with_context(|| {
            format!(
                "Unable to read the OAuth client secret file {}. Download it from Google Cloud \
                Console and pass it to 'findash init --client-secret'",
                path.display()
            )
        })
    }

    pub(super) fn client_id(&self) -> &str {
        &self.installed.client_id
    }

    pub(super) fn client_secret(&self) -> &str {
        &self.installed.client_secret
    }

    pub(super) fn auth_uri(&self) -> &str {
        &self.installed.auth_uri
    }

    pub(super) fn token_uri(&self) -> &str {
        &self.installed.token_uri
    }

    /// The loopback address the consent page redirects to, with the callback port.
    pub(super) fn redirect_uri(&self, port: u16) -> String {
        format!("{REDIRECT}:{port}")
    }
}

/// The actual OAuth credentials nested within the `client_secret.json` file.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) struct InstalledCredentials {
    client_id: String,
    client_secret: String,
    /// Must contain "http://localhost" (without a port number).
    redirect_uris: RedirectUris,
    auth_uri: String,
    token_uri: String,
}

#[derive(Default, Debug, Clone)]
struct RedirectUris(Vec<String>);

impl Serialize for RedirectUris {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RedirectUris {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let vec = Vec::<String>::deserialize(deserializer)?;
        if !vec.iter().any(|s| is_valid_redirect(s)) {
            return Err(D::Error::custom(format!(
                "At least one of the redirects needs to be {REDIRECT}, but this was not found. \
                When creating the OAuth client in Google Cloud Console, choose 'Desktop app' so \
                that '{REDIRECT}' is included"
            )));
        }
        Ok(RedirectUris(vec))
    }
}

fn is_valid_redirect(s: &str) -> bool {
    s == REDIRECT || s == "http://127.0.0.1"
}

/// The tokens saved after signing in. Our own format rather than Google's response so that the
/// expiry is an absolute time.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(super) struct TokenFile {
    scopes: Vec<String>,
    access_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl TokenFile {
    pub(super) fn new(
        scopes: Vec<String>,
        access_token: String,
        refresh_token: String,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            scopes,
            access_token,
            refresh_token,
            expires_at,
        }
    }

    /// Fails when a scope in `OAUTH_SCOPES` was not granted.
    pub(super) fn validate_scopes(&self) -> Res<()> {
        let found_scopes: HashSet<&str> = self.scopes.iter().map(|s| s.as_str()).collect();
        for &required_scope in OAUTH_SCOPES {
            if !found_scopes.contains(required_scope) {
                bail!("OAuth scope '{required_scope}' is missing.");
            }
        }
        Ok(())
    }

    pub(super) fn access_token(&self) -> &str {
        &self.access_token
    }

    pub(super) fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub(super) fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// True when the token has expired or will within five minutes.
    pub(super) fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now() + chrono::Duration::minutes(EXPIRY_MARGIN_MINUTES)
    }

    /// Google only sends a new refresh token sometimes; the old one stays valid otherwise.
    pub(super) fn update(
        &mut self,
        access_token: String,
        expires_at: DateTime<Utc>,
        refresh_token: Option<String>,
    ) {
        self.access_token = access_token;
        self.expires_at = expires_at;
        if let Some(rt) = refresh_token {
            self.refresh_token = rt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn write_temp(json: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file.json");
        utils::write(&path, json).await.unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn test_client_secret_good_redirect() {
        let (_dir, p) = write_temp(crate::test::CLIENT_SECRET).await;
        let secret_file = SecretFile::load(&p).await.unwrap();
        assert_eq!(secret_file.client_id(), "test-client-id");
        assert_eq!(secret_file.redirect_uri(3030), "http://localhost:3030");
    }

    #[tokio::test]
    async fn test_client_secret_bad_redirect() {
        let (_dir, p) = write_temp(
            r#"{
                "installed": {
                    "client_id": "id",
                    "client_secret": "secret",
                    "redirect_uris": ["http://localhost:9900", "https://example.com:4040/whatever"],
                    "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                    "token_uri": "https://oauth2.googleapis.com/token"
                }
            }"#,
        )
        .await;
        let parse_error = SecretFile::load(&p).await.unwrap_err();
        let message = format!("{parse_error:?}");
        assert!(message.contains("At least one of the redirects needs to be http://localhost"));
    }

    #[tokio::test]
    async fn test_token_file_scopes() {
        let (_dir, p) = write_temp(
            r#"{
                "scopes": ["https://www.googleapis.com/auth/spreadsheets"],
                "access_token": "abc12",
                "refresh_token": "xyz89",
                "expires_at": "2025-01-01T00:00:00Z"
            }"#,
        )
        .await;
        let file: File<TokenFile> = File::load(&p).await.unwrap();
        let message = file.data().validate_scopes().unwrap_err().to_string();
        assert!(message.contains("https://www.googleapis.com/auth/drive.file"));
        assert!(file.data().is_expired());
    }

    #[tokio::test]
    async fn test_token_file_save_and_update() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        let expires_at = Utc::now() + chrono::Duration::hours(1);
        let mut file = File::new(
            &path,
            TokenFile::new(
                OAUTH_SCOPES.iter().map(|s| s.to_string()).collect(),
                "a1".to_string(),
                "r1".to_string(),
                expires_at,
            ),
        );
        file.save().await.unwrap();
        assert!(!file.data().is_expired());

        file.data_mut().update("a2".to_string(), expires_at, None);
        file.save().await.unwrap();
        let reloaded: File<TokenFile> = File::load(&path).await.unwrap();
        reloaded.data().validate_scopes().unwrap();
        assert_eq!(reloaded.data().access_token(), "a2");
        assert_eq!(reloaded.data().refresh_token(), "r1");
    }
}
