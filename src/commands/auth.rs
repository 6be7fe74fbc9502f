//! Authentication command handlers for the OAuth flow.
//!
//! This module implements the CLI commands for:
//! - `findash auth` - Initial OAuth consent flow
//! - `findash auth --verify` - Verify and refresh authentication
//! - `findash auth --status` - Check for saved tokens
//! - `findash sign-out` - Forget the saved tokens

use crate::api::TokenProvider;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{utils, Config, Result};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
pub struct AuthStatus {
    pub signed_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Handles the `findash auth` command - runs the OAuth consent flow.
///
/// This is the ONLY command that waits for a browser. It prints the consent URL, listens on
/// localhost for Google's redirect and saves the tokens to `token.json`.
///
/// # Errors
/// Returns an error if the OAuth flow fails or if `client_secret.json` is missing.
pub async fn auth(config: &Config) -> Result<Out<AuthStatus>> {
    let token_provider =
        TokenProvider::initialize(&config.client_secret_path(), &config.token_path())
            .await
            .pub_result(ErrorType::Auth)?;
    Ok(Out::new(
        "Signed in to Google Drive",
        AuthStatus {
            signed_in: true,
            expires_at: Some(token_provider.expires_at()),
        },
    ))
}

/// Handles the `findash auth --verify` command - verifies authentication.
///
/// This command NEVER opens a browser. It loads the saved tokens, checks their scopes and
/// refreshes the access token, which proves that the refresh token still works.
///
/// # Errors
/// Returns an error, telling the user to run `findash auth`, when the tokens are missing or
/// unusable.
pub async fn auth_verify(config: &Config) -> Result<Out<AuthStatus>> {
    let mut token_provider =
        TokenProvider::load(&config.client_secret_path(), &config.token_path())
            .await
            .context(
                "Unable to use the existing tokens found in the token JSON file. \n\n\
                You should run 'findash auth' (without the --verify flag).",
            )
            .pub_result(ErrorType::Auth)?;
    token_provider
        .refresh()
        .await
        .context("Unable to refresh the token")
        .pub_result(ErrorType::Auth)?;
    Ok(Out::new(
        "Your OAuth token is valid!",
        AuthStatus {
            signed_in: true,
            expires_at: Some(token_provider.expires_at()),
        },
    ))
}

/// Handles the `findash auth --status` command. Reports whether usable tokens are saved, without
/// contacting Google.
pub async fn auth_status(config: &Config) -> Result<Out<AuthStatus>> {
    match TokenProvider::load(&config.client_secret_path(), &config.token_path()).await {
        Ok(token_provider) => Ok(Out::new(
            "You are signed in to Google Drive",
            AuthStatus {
                signed_in: true,
                expires_at: Some(token_provider.expires_at()),
            },
        )),
        Err(e) => {
            debug!("Not signed in: {e:#}");
            Ok(Out::new(
                "You are not signed in. Run 'findash auth' to sign in",
                AuthStatus {
                    signed_in: false,
                    expires_at: None,
                },
            ))
        }
    }
}

/// Handles the `findash sign-out` command by deleting the saved tokens.
pub async fn sign_out(config: &Config) -> Result<Out<AuthStatus>> {
    let removed = utils::remove(config.token_path())
        .await
        .pub_result(ErrorType::Auth)?;
    let message = if removed {
        "Signed out of Google Drive"
    } else {
        "You were not signed in"
    };
    Ok(Out::new(
        message,
        AuthStatus {
            signed_in: false,
            expires_at: None,
        },
    ))
}

#[tokio::test]
async fn test_sign_out_and_verify_without_token() {
    let env = crate::test::TestEnv::new().await;
    let config = env.config();

    let out = auth_status(&config).await.unwrap();
    assert!(!out.structure().unwrap().signed_in);

    let err = auth_verify(&config).await.unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Auth);
    assert!(err.to_string().contains("findash auth"));

    let out = sign_out(&config).await.unwrap();
    assert_eq!(out.message(), "You were not signed in");

    utils::write(config.token_path(), "{}").await.unwrap();
    let out = sign_out(&config).await.unwrap();
    assert_eq!(out.message(), "Signed out of Google Drive");
    assert!(!config.token_path().exists());
}
