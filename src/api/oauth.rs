//! OAuth 2.0 for Google Drive.
//!
//! `TokenProvider::initialize` runs the installed-app consent flow: the user opens the consent
//! page, Google redirects to a one-shot HTTP listener on localhost and the code is exchanged for
//! tokens (with PKCE). Every other command uses `TokenProvider::load`, which never opens a browser
//! and refreshes the access token when it is about to expire.

use crate::api::files::{File, SecretFile, TokenFile};
use crate::api::OAUTH_SCOPES;
use crate::error::Res;
use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, Utc};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use oauth2::basic::{BasicClient, BasicErrorResponse};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, RedirectUrl, RefreshToken, RequestTokenError, Scope, TokenResponse,
    TokenUrl,
};
use std::convert::Infallible;
use std::path::Path;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info};

const OAUTH_CALLBACK_PORT: u16 = 3030;
const CALLBACK_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Used when Google does not say how long an access token lives.
const DEFAULT_EXPIRY: Duration = Duration::from_secs(60 * 60);

type GoogleClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Holds the client credentials and the saved tokens, and keeps the access token fresh.
#[derive(Debug)]
pub(crate) struct TokenProvider {
    client: GoogleClient,
    token: File<TokenFile>,
    http: reqwest::Client,
}

impl TokenProvider {
    /// Runs the consent flow and saves the tokens to `token_path`.
    ///
    /// # Errors
    /// - The client secret file is missing or invalid.
    /// - The callback port is in use.
    /// - The user denies access or does not finish within five minutes.
    pub(crate) async fn initialize(secret_path: &Path, token_path: &Path) -> Res<Self> {
        let secret = SecretFile::load(secret_path).await?;
        let client = oauth_client(&secret, OAUTH_CALLBACK_PORT)?;
        let http = http_client()?;

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let (auth_url, csrf_token) = client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(OAUTH_SCOPES.iter().map(|s| Scope::new(s.to_string())))
            // Without these Google only returns a refresh token the first time.
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .set_pkce_challenge(pkce_challenge)
            .url();

        let listener = TcpListener::bind(("127.0.0.1", OAUTH_CALLBACK_PORT))
            .await
            .with_context(|| {
                format!("Unable to listen for the OAuth callback on port {OAUTH_CALLBACK_PORT}")
            })?;
        info!("Open this URL in your browser to authorize findash:\n\n{auth_url}\n");
        info!("Waiting for the authorization on http://localhost:{OAUTH_CALLBACK_PORT}");

        let code = wait_for_code(listener, csrf_token.secret().clone()).await?;
        debug!("Received the authorization code, exchanging it for tokens");

        let response = client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(pkce_verifier)
            .request_async(&http)
            .await
            .map_err(token_error)
            .context("Unable to exchange the authorization code for tokens")?;

        let refresh_token = response
            .refresh_token()
            .map(|t| t.secret().clone())
            .context("Google did not return a refresh token")?;
        let scopes = match response.scopes() {
            Some(scopes) => scopes.iter().map(|s| String::clone(s)).collect(),
            None => OAUTH_SCOPES.iter().map(|s| s.to_string()).collect(),
        };
        let token = File::new(
            token_path,
            TokenFile::new(
                scopes,
                response.access_token().secret().clone(),
                refresh_token,
                expiry(response.expires_in()),
            ),
        );
        token.data().validate_scopes()?;
        token.save().await?;
        info!("Authorization successful, tokens saved to {}", token_path.display());

        Ok(Self {
            client,
            token,
            http,
        })
    }

    /// Loads saved tokens. Never opens a browser.
    pub(crate) async fn load(secret_path: &Path, token_path: &Path) -> Res<Self> {
        let secret = SecretFile::load(secret_path).await?;
        let token: File<TokenFile> = File::load(token_path)
            .await
            .context("You are not signed in. Run 'findash auth' first")?;
        token.data().validate_scopes().context(
            "The saved token does not grant access to Google Drive. Run 'findash auth' again",
        )?;
        Ok(Self {
            client: oauth_client(&secret, OAUTH_CALLBACK_PORT)?,
            token,
            http: http_client()?,
        })
    }

    /// The current access token, which may have expired.
    pub(crate) fn token(&self) -> &str {
        self.token.data().access_token()
    }

    pub(crate) fn expires_at(&self) -> DateTime<Utc> {
        self.token.data().expires_at()
    }

    /// A valid access token, refreshed first when it expires within five minutes.
    pub(crate) async fn token_with_refresh(&mut self) -> Res<&str> {
        if self.token.data().is_expired() {
            self.refresh().await?;
        }
        Ok(self.token())
    }

    /// Exchanges the refresh token for a new access token and saves it.
    pub(crate) async fn refresh(&mut self) -> Res<()> {
        debug!("Refreshing the OAuth access token");
        let refresh_token = RefreshToken::new(self.token.data().refresh_token().to_string());
        let response = self
            .client
            .exchange_refresh_token(&refresh_token)
            .request_async(&self.http)
            .await
            .map_err(token_error)
            .context("Unable to refresh the access token. Run 'findash auth' to sign in again")?;

        self.token.data_mut().update(
            response.access_token().secret().clone(),
            expiry(response.expires_in()),
            response.refresh_token().map(|t| t.secret().clone()),
        );
        self.token.save().await?;
        debug!("Token valid until {}", self.expires_at());
        Ok(())
    }
}

fn oauth_client(secret: &SecretFile, port: u16) -> Res<GoogleClient> {
    Ok(BasicClient::new(ClientId::new(secret.client_id().to_string()))
        .set_client_secret(ClientSecret::new(secret.client_secret().to_string()))
        .set_auth_uri(AuthUrl::new(secret.auth_uri().to_string()).context("Invalid auth_uri")?)
        .set_token_uri(
            TokenUrl::new(secret.token_uri().to_string()).context("Invalid token_uri")?,
        )
        .set_redirect_uri(
            RedirectUrl::new(secret.redirect_uri(port)).context("Invalid redirect URI")?,
        ))
}

/// Token requests must not follow redirects.
fn http_client() -> Res<reqwest::Client> {
    reqwest::ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .context("Unable to create the HTTP client")
}

fn expiry(expires_in: Option<Duration>) -> DateTime<Utc> {
    let expires_in = expires_in.unwrap_or(DEFAULT_EXPIRY);
    Utc::now() + chrono::Duration::from_std(expires_in).unwrap_or(chrono::Duration::hours(1))
}

fn token_error<RE>(e: RequestTokenError<RE, BasicErrorResponse>) -> anyhow::Error
where
    RE: std::error::Error + 'static,
{
    match e {
        RequestTokenError::ServerResponse(response) => {
            anyhow!("Google rejected the request: {response}")
        }
        other => anyhow!("{other}"),
    }
}

/// Serves the redirect from the consent page until it arrives or the timeout passes, and returns
/// the authorization code.
async fn wait_for_code(listener: TcpListener, expected_state: String) -> Res<String> {
    let (tx, mut rx) = mpsc::channel::<Res<String>>(1);

    let server = tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let tx = tx.clone();
            let expected_state = expected_state.clone();
            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let outcome = callback_outcome(&req, &expected_state);
                    let response = callback_response(&outcome);
                    if let Some(outcome) = outcome {
                        let _ = tx.try_send(outcome);
                    }
                    async move { Ok::<_, Infallible>(response) }
                });
                if let Err(e) = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await
                {
                    debug!("OAuth callback connection failed: {e}");
                }
            });
        }
    });

    let received = tokio::time::timeout(CALLBACK_TIMEOUT, rx.recv()).await;
    server.abort();
    match received {
        Ok(Some(outcome)) => outcome,
        Ok(None) => bail!("The OAuth callback listener stopped unexpectedly"),
        Err(_) => bail!(
            "Timed out after {} minutes waiting for the authorization",
            CALLBACK_TIMEOUT.as_secs() / 60
        ),
    }
}

/// `None` for requests that are not the redirect, such as a browser asking for a favicon.
fn callback_outcome(req: &Request<Incoming>, expected_state: &str) -> Option<Res<String>> {
    let url = url::Url::parse(&format!("http://localhost{}", req.uri())).ok()?;
    let query = |key: &str| {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    };

    if let Some(error) = query("error") {
        return Some(Err(anyhow!("Authorization was denied: {error}")));
    }
    let code = query("code")?;
    if query("state").as_deref() != Some(expected_state) {
        return Some(Err(anyhow!(
            "The OAuth callback had an unexpected state parameter"
        )));
    }
    Some(Ok(code))
}

fn callback_response(outcome: &Option<Res<String>>) -> Response<String> {
    let (status, body) = match outcome {
        Some(Ok(_)) => (
            StatusCode::OK,
            "findash is authorized. You can close this window.".to_string(),
        ),
        Some(Err(e)) => (StatusCode::BAD_REQUEST, format!("Authorization failed: {e}")),
        None => (StatusCode::NOT_FOUND, String::new()),
    };
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
}

#[test]
fn test_expiry_defaults_to_an_hour() {
    let at = expiry(None);
    let minutes = (at - Utc::now()).num_minutes();
    assert!((58..=60).contains(&minutes));
}
