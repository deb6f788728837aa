use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{timeout, Duration as WaitDuration};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;
use yup_oauth2::ApplicationSecret;

use super::auth::OAuthFlow;
use super::credentials::Credential;
use crate::error::AuthError;

const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;
const MAX_CALLBACK_REQUEST: usize = 16 * 1024;
const CALLBACK_TIMEOUT: WaitDuration = WaitDuration::from_secs(5 * 60);
const REQUEST_READ_TIMEOUT: WaitDuration = WaitDuration::from_secs(10);

const CALLBACK_OK_PAGE: &str = "<html><body><h1>Authorization complete</h1>\
    <p>You can close this window and return to My Mails.</p></body></html>";
const CALLBACK_FAILED_PAGE: &str = "<html><body><h1>Authorization failed</h1>\
    <p>Return to My Mails for details.</p></body></html>";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Installed-app flow: the browser redirects back to a listener on an
/// ephemeral loopback port.
///
/// Consent URLs go to `prompts` when set, so a running terminal UI can show
/// them; otherwise they are printed to stderr.
pub struct LoopbackFlow {
    http: reqwest::Client,
    prompts: Option<UnboundedSender<String>>,
}

impl LoopbackFlow {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            prompts: None,
        }
    }

    pub fn with_prompts(mut self, prompts: UnboundedSender<String>) -> Self {
        self.prompts = Some(prompts);
        self
    }

    fn announce(&self, auth_url: &Url) {
        info!(url = %auth_url, "Authorization required");
        let undelivered = match &self.prompts {
            Some(prompts) => prompts.send(auth_url.to_string()).is_err(),
            None => true,
        };
        if undelivered {
            eprintln!("Please visit this URL to authorize My Mails:\n\n{auth_url}\n");
        }
    }

    async fn exchange_code(
        &self,
        secret: &ApplicationSecret,
        code: &str,
        redirect_uri: &str,
        requested_scopes: &[String],
    ) -> Result<Credential, AuthError> {
        let response = self
            .http
            .post(&secret.token_uri)
            .form(&[
                ("code", code),
                ("client_id", secret.client_id.as_str()),
                ("client_secret", secret.client_secret.as_str()),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let reason = token_error_text(response).await;
            return Err(AuthError::Authorization(format!(
                "code exchange rejected: {reason}"
            )));
        }

        let token: TokenResponse = response.json().await?;
        Ok(Credential {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expiry: expiry_from(token.expires_in),
            scopes: granted_scopes(token.scope.as_deref(), requested_scopes),
            client_id: secret.client_id.clone(),
            client_secret: secret.client_secret.clone(),
            token_uri: secret.token_uri.clone(),
        })
    }
}

#[async_trait]
impl OAuthFlow for LoopbackFlow {
    async fn authorize(
        &self,
        secret: ApplicationSecret,
        scopes: Vec<String>,
    ) -> Result<Credential, AuthError> {
        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .map_err(|e| AuthError::Authorization(format!("cannot open callback listener: {e}")))?;
        let port = listener
            .local_addr()
            .map_err(|e| AuthError::Authorization(format!("cannot open callback listener: {e}")))?
            .port();
        let redirect_uri = format!("http://127.0.0.1:{port}/");
        let state = Uuid::new_v4().to_string();

        let auth_url = authorization_url(&secret, &redirect_uri, &scopes, &state)?;
        info!(port, "Waiting for OAuth redirect");

        self.announce(&auth_url);
        if let Err(e) = opener::open(auth_url.as_str()) {
            warn!(error = %e, "Could not open a browser automatically");
        }

        let code = await_callback(&listener, &state, CALLBACK_TIMEOUT).await?;
        debug!("Authorization code received");

        self.exchange_code(&secret, &code, &redirect_uri, &scopes)
            .await
    }

    async fn refresh(&self, credential: Credential) -> Result<Credential, AuthError> {
        let refresh_token = credential
            .refresh_token
            .clone()
            .ok_or_else(|| AuthError::RefreshRejected("no refresh token".to_string()))?;

        let response = self
            .http
            .post(&credential.token_uri)
            .form(&[
                ("client_id", credential.client_id.as_str()),
                ("client_secret", credential.client_secret.as_str()),
                ("refresh_token", refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AuthError::RefreshRejected(
                token_error_text(response).await,
            ));
        }

        let token: TokenResponse = response.json().await?;
        info!("Access token refreshed");
        Ok(refreshed(credential, token))
    }
}

/// Applies a refresh response; the refresh token survives when the
/// provider does not rotate it.
fn refreshed(previous: Credential, token: TokenResponse) -> Credential {
    let scopes = granted_scopes(token.scope.as_deref(), &previous.scopes);
    Credential {
        access_token: token.access_token,
        refresh_token: token.refresh_token.or(previous.refresh_token),
        expiry: expiry_from(token.expires_in),
        scopes,
        ..previous
    }
}

fn expiry_from(expires_in: Option<i64>) -> chrono::DateTime<Utc> {
    Utc::now() + Duration::seconds(expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS))
}

fn granted_scopes(granted: Option<&str>, requested: &[String]) -> Vec<String> {
    match granted {
        Some(scope) if !scope.trim().is_empty() => {
            scope.split_whitespace().map(str::to_string).collect()
        }
        _ => requested.to_vec(),
    }
}

async fn token_error_text(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    match serde_json::from_str::<TokenErrorResponse>(&body) {
        Ok(err) => match err.error_description {
            Some(description) if !description.is_empty() => {
                format!("{} ({description})", err.error)
            }
            _ => err.error,
        },
        Err(_) => format!("{status}: {body}"),
    }
}

/// Builds the consent URL. `access_type=offline` plus `prompt=consent`
/// makes Google issue a refresh token every time.
pub fn authorization_url(
    secret: &ApplicationSecret,
    redirect_uri: &str,
    scopes: &[String],
    state: &str,
) -> Result<Url, AuthError> {
    let mut url = Url::parse(&secret.auth_uri).map_err(|e| {
        AuthError::configuration("credentials.json", format!("invalid auth_uri: {e}"))
    })?;
    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", &secret.client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("scope", &scopes.join(" "))
        .append_pair("state", state)
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent");
    Ok(url)
}

/// Extracts the authorization code from the redirect's request line.
pub fn parse_callback(request: &str, expected_state: &str) -> Result<String, AuthError> {
    let target = request
        .lines()
        .next()
        .and_then(|line| {
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some("GET"), Some(target)) => Some(target),
                _ => None,
            }
        })
        .ok_or_else(|| AuthError::Authorization("malformed callback request".to_string()))?;

    let url = Url::parse("http://127.0.0.1")
        .and_then(|base| base.join(target))
        .map_err(|e| AuthError::Authorization(format!("malformed callback request: {e}")))?;

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Err(AuthError::Authorization(error));
    }
    if state.as_deref() != Some(expected_state) {
        return Err(AuthError::Authorization(
            "state mismatch in callback".to_string(),
        ));
    }
    code.filter(|c| !c.is_empty())
        .ok_or_else(|| AuthError::Authorization("callback carried no code".to_string()))
}

/// `wait_for_code` bounded by `limit`; the credential lock is held meanwhile.
async fn await_callback(
    listener: &TcpListener,
    expected_state: &str,
    limit: WaitDuration,
) -> Result<String, AuthError> {
    timeout(limit, wait_for_code(listener, expected_state))
        .await
        .map_err(|_| {
            AuthError::Authorization(format!(
                "no browser redirect within {} seconds",
                limit.as_secs()
            ))
        })?
}

async fn wait_for_code(listener: &TcpListener, expected_state: &str) -> Result<String, AuthError> {
    loop {
        let (mut stream, peer) = listener
            .accept()
            .await
            .map_err(|e| AuthError::Authorization(format!("callback listener failed: {e}")))?;
        debug!(%peer, "Callback connection");

        let request = match timeout(REQUEST_READ_TIMEOUT, read_request_head(&mut stream)).await {
            Ok(Ok(request)) => request,
            Ok(Err(e)) => {
                warn!(error = %e, "Dropping unreadable callback connection");
                continue;
            }
            Err(_) => {
                warn!(%peer, "Dropping silent callback connection");
                continue;
            }
        };

        // Browsers probe for a favicon; only the redirect carries a query.
        if request.starts_with("GET /favicon") {
            let _ = respond(&mut stream, "404 Not Found", "").await;
            continue;
        }

        let result = parse_callback(&request, expected_state);
        let page = if result.is_ok() {
            CALLBACK_OK_PAGE
        } else {
            CALLBACK_FAILED_PAGE
        };
        let _ = respond(&mut stream, "200 OK", page).await;
        return result;
    }
}

async fn read_request_head(stream: &mut TcpStream) -> std::io::Result<String> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
        if buffer.windows(4).any(|w| w == b"\r\n\r\n") || buffer.len() >= MAX_CALLBACK_REQUEST {
            break;
        }
    }
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

async fn respond(stream: &mut TcpStream, status: &str, body: &str) -> std::io::Result<()> {
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.flush().await
}
