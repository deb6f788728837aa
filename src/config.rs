use std::path::PathBuf;

pub const CREDENTIALS_PATH: &str = "credentials.json";
pub const TOKEN_DIR: &str = "Tokens";
pub const TOKEN_FILE: &str = "token.json";
pub const LOG_FILE: &str = "mymails.log";

pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

pub const GMAIL_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/gmail.send",
    "https://www.googleapis.com/auth/gmail.readonly",
];

pub const DEFAULT_INBOX_LIMIT: u32 = 20;

/// Paths and knobs shared by the credential store and the front end.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub credentials_path: PathBuf,
    pub token_path: PathBuf,
    pub scopes: Vec<String>,
    pub api_base: String,
    pub inbox_limit: u32,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            credentials_path: PathBuf::from(CREDENTIALS_PATH),
            token_path: PathBuf::from(TOKEN_DIR).join(TOKEN_FILE),
            scopes: GMAIL_SCOPES.iter().map(|s| s.to_string()).collect(),
            api_base: GMAIL_API_BASE.to_string(),
            inbox_limit: DEFAULT_INBOX_LIMIT,
        }
    }
}

impl MailConfig {
    pub fn with_inbox_limit(mut self, limit: u32) -> Self {
        self.inbox_limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let config = MailConfig::default();
        assert_eq!(config.credentials_path, PathBuf::from("credentials.json"));
        assert_eq!(config.token_path, PathBuf::from("Tokens").join("token.json"));
        assert_eq!(config.scopes.len(), 2);
        assert_eq!(config.inbox_limit, 20);
    }
}
