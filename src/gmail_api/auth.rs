use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use yup_oauth2::ApplicationSecret;

use super::credentials::{Credential, FileTokenStore, PersistedToken, TokenStore};
use super::oauth::LoopbackFlow;
use crate::config::MailConfig;
use crate::error::AuthError;

// Define a trait for OAuth flow operations to allow mocking
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OAuthFlow: Send + Sync {
    /// Runs the interactive consent flow and exchanges the returned code.
    async fn authorize(
        &self,
        secret: ApplicationSecret,
        scopes: Vec<String>,
    ) -> Result<Credential, AuthError>;

    /// Trades the credential's refresh token for a new bearer token.
    async fn refresh(&self, credential: Credential) -> Result<Credential, AuthError>;
}

/// Anything that can hand out a currently valid credential.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn ensure_credential(&self) -> Result<Credential, AuthError>;
}

/// Owns the process-wide credential slot.
///
/// The slot is locked for the whole acquisition so that concurrent callers
/// wait for one refresh or one browser prompt instead of racing each other
/// and the token file.
pub struct CredentialStore<S: TokenStore, F: OAuthFlow> {
    token_store: S,
    oauth_flow: F,
    credentials_path: PathBuf,
    scopes: Vec<String>,
    slot: Mutex<Option<Credential>>,
}

impl CredentialStore<FileTokenStore, LoopbackFlow> {
    /// `prompts` receives consent URLs whenever interactive authorization starts.
    pub fn from_config(
        config: &MailConfig,
        http: reqwest::Client,
        prompts: UnboundedSender<String>,
    ) -> Self {
        Self::new(
            FileTokenStore::new(&config.token_path),
            LoopbackFlow::new(http).with_prompts(prompts),
            &config.credentials_path,
            config.scopes.clone(),
        )
    }
}

impl<S: TokenStore, F: OAuthFlow> CredentialStore<S, F> {
    pub fn new(
        token_store: S,
        oauth_flow: F,
        credentials_path: impl Into<PathBuf>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            token_store,
            oauth_flow,
            credentials_path: credentials_path.into(),
            scopes,
            slot: Mutex::new(None),
        }
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub async fn ensure_credential(&self) -> Result<Credential, AuthError> {
        let mut slot = self.slot.lock().await;

        if let Some(cached) = slot.as_ref() {
            if cached.is_valid(&self.scopes) {
                return Ok(cached.clone());
            }
        }

        // A persisted record wins over a stale in-memory one.
        let candidate = self.load_persisted().or_else(|| slot.take());

        let credential = match candidate {
            Some(candidate) if candidate.is_valid(&self.scopes) => {
                debug!("Using persisted credential");
                *slot = Some(candidate.clone());
                return Ok(candidate);
            }
            Some(candidate) if candidate.can_refresh() && candidate.covers(&self.scopes) => {
                info!("Access token expired, refreshing");
                match self.oauth_flow.refresh(candidate).await {
                    Ok(fresh) => fresh,
                    Err(AuthError::RefreshRejected(reason)) => {
                        warn!(%reason, "Refresh rejected, falling back to interactive authorization");
                        self.authorize().await?
                    }
                    Err(e) => return Err(e),
                }
            }
            _ => self.authorize().await?,
        };

        if let Err(e) = self.token_store.save(&PersistedToken::from(&credential)) {
            // The credential in hand is still good for this session.
            warn!(error = %e, "Failed to persist token");
        }

        *slot = Some(credential.clone());
        Ok(credential)
    }

    /// Forgets the cached credential and deletes the persisted record.
    pub async fn clear(&self) -> Result<(), AuthError> {
        let mut slot = self.slot.lock().await;
        *slot = None;
        self.token_store.clear()
    }

    fn load_persisted(&self) -> Option<Credential> {
        match self.token_store.load() {
            Ok(Some(record)) => {
                let credential = Credential::from(record);
                if credential.covers(&self.scopes) {
                    Some(credential)
                } else {
                    info!("Persisted token lacks required scopes, ignoring it");
                    None
                }
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Could not read persisted token");
                None
            }
        }
    }

    async fn authorize(&self) -> Result<Credential, AuthError> {
        let path = self.credentials_path.display().to_string();
        let secret = yup_oauth2::read_application_secret(&self.credentials_path)
            .await
            .map_err(|e| AuthError::configuration(&path, e))?;

        info!(client_id = %secret.client_id, "Starting interactive authorization");
        self.oauth_flow.authorize(secret, self.scopes.clone()).await
    }
}

#[async_trait]
impl<S: TokenStore, F: OAuthFlow> CredentialProvider for CredentialStore<S, F> {
    async fn ensure_credential(&self) -> Result<Credential, AuthError> {
        CredentialStore::ensure_credential(self).await
    }
}
