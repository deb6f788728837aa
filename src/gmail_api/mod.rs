//! Gmail API module split into logical submodules
//!
//! - credentials: the credential record and its on-disk store
//! - auth: the credential store (cache, refresh, re-authorization)
//! - oauth: the installed-app loopback flow against Google's endpoints
//! - client: the Gmail REST calls
//! - operations: sending mail
//! - messages: listing the inbox

pub mod auth;
pub mod client;
pub mod credentials;
pub mod messages;
pub mod oauth;
pub mod operations;

pub use auth::{CredentialProvider, CredentialStore, OAuthFlow};
pub use client::{GmailClient, MailProvider};
pub use credentials::{Credential, FileTokenStore, PersistedToken, TokenStore};
pub use messages::INBOX_LABEL;
pub use oauth::LoopbackFlow;
pub use operations::{Mailer, OutboundMessage, SendOutcome};

/// The production wiring: file-backed tokens, loopback OAuth, Gmail REST.
pub type GmailMailer = Mailer<CredentialStore<FileTokenStore, LoopbackFlow>, GmailClient>;
