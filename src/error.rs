use thiserror::Error;

/// Failures while obtaining a usable credential.
#[derive(Debug, Error)]
pub enum AuthError {
    /// `credentials.json` is missing or not a valid client secret.
    #[error("Client secret could not be loaded from {path}: {reason}")]
    Configuration { path: String, reason: String },

    /// The interactive flow was abandoned or the code exchange was refused.
    #[error("Authorization failed: {0}")]
    Authorization(String),

    /// The token endpoint refused the refresh token.
    #[error("Refresh rejected: {0}")]
    RefreshRejected(String),

    /// The persisted token record could not be read or written.
    #[error("Token file error at {path}: {source}")]
    Persistence {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Token endpoint unreachable: {0}")]
    Http(#[from] reqwest::Error),
}

/// A Gmail API call that did not succeed.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Gmail API error ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Gmail API request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl AuthError {
    pub fn configuration(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::Configuration {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn persistence(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }
}
