use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::AuthError;

/// Tokens this close to expiry are treated as already expired.
const EXPIRY_SKEW_SECS: i64 = 60;

pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// An OAuth2 credential plus the client identity needed to refresh it.
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expiry: DateTime<Utc>,
    pub scopes: Vec<String>,
    pub client_id: String,
    pub client_secret: String,
    pub token_uri: String,
}

impl Credential {
    pub fn is_expired(&self) -> bool {
        Utc::now() + Duration::seconds(EXPIRY_SKEW_SECS) >= self.expiry
    }

    /// True when every required scope was granted.
    pub fn covers(&self, required: &[String]) -> bool {
        required.iter().all(|scope| self.scopes.contains(scope))
    }

    pub fn is_valid(&self, required: &[String]) -> bool {
        !self.is_expired() && self.covers(required)
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|token| !token.is_empty())
    }
}

/// On-disk form of a [`Credential`], in Google's authorized-user layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedToken {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

impl From<&Credential> for PersistedToken {
    fn from(credential: &Credential) -> Self {
        Self {
            token: credential.access_token.clone(),
            refresh_token: credential.refresh_token.clone(),
            token_uri: credential.token_uri.clone(),
            client_id: credential.client_id.clone(),
            client_secret: credential.client_secret.clone(),
            scopes: credential.scopes.clone(),
            expiry: Some(credential.expiry),
        }
    }
}

impl From<PersistedToken> for Credential {
    fn from(record: PersistedToken) -> Self {
        Self {
            access_token: record.token,
            refresh_token: record.refresh_token,
            // No recorded expiry means we cannot trust the bearer token.
            expiry: record.expiry.unwrap_or(DateTime::<Utc>::MIN_UTC),
            scopes: record.scopes,
            client_id: record.client_id,
            client_secret: record.client_secret,
            token_uri: record.token_uri,
        }
    }
}

// Persistence seam so the credential store can be tested without a disk
#[cfg_attr(test, mockall::automock)]
pub trait TokenStore: Send + Sync {
    /// `Ok(None)` when no usable record exists.
    fn load(&self) -> Result<Option<PersistedToken>, AuthError>;
    fn save(&self, record: &PersistedToken) -> Result<(), AuthError>;
    fn clear(&self) -> Result<(), AuthError>;
}

/// Stores the token record as JSON at a fixed path.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<PersistedToken>, AuthError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.display_path(), "No persisted token");
                return Ok(None);
            }
            Err(e) => return Err(AuthError::persistence(self.display_path(), e)),
        };

        match serde_json::from_str::<PersistedToken>(&contents) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(path = %self.display_path(), error = %e, "Ignoring unreadable token file");
                Ok(None)
            }
        }
    }

    fn save(&self, record: &PersistedToken) -> Result<(), AuthError> {
        let to_err = |e: std::io::Error| AuthError::persistence(self.display_path(), e);

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(to_err)?;
        }

        let json = serde_json::to_string_pretty(record)
            .map_err(|e| to_err(std::io::Error::from(e)))?;

        // Write beside the target and rename so readers never see half a file.
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, json).map_err(to_err)?;
        fs::rename(&staging, &self.path).map_err(to_err)?;

        debug!(path = %self.display_path(), "Token persisted");
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::persistence(self.display_path(), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scopes() -> Vec<String> {
        vec![
            "https://www.googleapis.com/auth/gmail.send".to_string(),
            "https://www.googleapis.com/auth/gmail.readonly".to_string(),
        ]
    }

    fn credential(expiry: DateTime<Utc>) -> Credential {
        Credential {
            access_token: "ya29.access".to_string(),
            refresh_token: Some("1//refresh".to_string()),
            expiry,
            scopes: scopes(),
            client_id: "client.apps.googleusercontent.com".to_string(),
            client_secret: "shh".to_string(),
            token_uri: GOOGLE_TOKEN_URI.to_string(),
        }
    }

    #[test]
    fn test_validity_window() {
        let fresh = credential(Utc::now() + Duration::hours(1));
        assert!(fresh.is_valid(&scopes()));

        let nearly_expired = credential(Utc::now() + Duration::seconds(30));
        assert!(nearly_expired.is_expired());

        let expired = credential(Utc::now() - Duration::minutes(5));
        assert!(!expired.is_valid(&scopes()));
        assert!(expired.can_refresh());
    }

    #[test]
    fn test_missing_scope_is_invalid() {
        let mut narrow = credential(Utc::now() + Duration::hours(1));
        narrow.scopes.truncate(1);
        assert!(!narrow.covers(&scopes()));
        assert!(!narrow.is_valid(&scopes()));
    }

    #[test]
    fn test_record_without_expiry_counts_as_expired() {
        let record: PersistedToken = serde_json::from_str(
            r#"{"token": "abc", "refresh_token": "r", "client_id": "id", "client_secret": "s", "scopes": []}"#,
        )
        .unwrap();
        let credential = Credential::from(record);
        assert!(credential.is_expired());
        assert_eq!(credential.token_uri, GOOGLE_TOKEN_URI);
    }

    #[test]
    fn test_empty_refresh_token_cannot_refresh() {
        let mut c = credential(Utc::now());
        c.refresh_token = Some(String::new());
        assert!(!c.can_refresh());
        c.refresh_token = None;
        assert!(!c.can_refresh());
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("Tokens").join("token.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "{not json").unwrap();
        let store = FileTokenStore::new(&path);
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_creates_directory_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Tokens").join("token.json");
        let store = FileTokenStore::new(&path);

        let first = credential(Utc::now() + Duration::hours(1));
        store.save(&PersistedToken::from(&first)).unwrap();
        assert!(path.exists());

        let mut second = first.clone();
        second.access_token = "ya29.second".to_string();
        store.save(&PersistedToken::from(&second)).unwrap();

        let loaded = Credential::from(store.load().unwrap().unwrap());
        assert_eq!(loaded.access_token, "ya29.second");
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_clear_removes_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("token.json"));
        store
            .save(&PersistedToken::from(&credential(Utc::now())))
            .unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        // Clearing twice is fine
        store.clear().unwrap();
    }
}
