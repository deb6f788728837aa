use async_trait::async_trait;
use tracing::debug;

use crate::error::ProviderError;
use crate::types::{ApiErrorBody, Message, MessagesResponse};

/// The three Gmail calls the mail operations rely on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Submits a base64url encoded RFC 5322 message.
    async fn send_raw(&self, access_token: String, raw: String) -> Result<(), ProviderError>;

    /// Ids in `label`, newest first, at most `limit` of them.
    async fn list_message_ids(
        &self,
        access_token: String,
        label: String,
        limit: u32,
    ) -> Result<Vec<String>, ProviderError>;

    /// From/Subject/Date headers and the snippet of one message.
    async fn get_metadata(&self, access_token: String, id: String)
        -> Result<Message, ProviderError>;
}

/// `MailProvider` over the Gmail REST API.
#[derive(Clone)]
pub struct GmailClient {
    http: reqwest::Client,
    base_url: String,
}

impl GmailClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(rejection(status.as_u16(), &body))
    }
}

/// Turns an error response into a `ProviderError`, preferring Google's
/// `error.message` over the raw body.
pub fn rejection(status: u16, body: &str) -> ProviderError {
    let message = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) if !parsed.error.message.is_empty() => parsed.error.message,
        Ok(parsed) => parsed
            .error
            .status
            .unwrap_or_else(|| "Unknown error".to_string()),
        Err(_) if body.trim().is_empty() => "Unknown error".to_string(),
        Err(_) => body.trim().to_string(),
    };
    ProviderError::Rejected { status, message }
}

#[async_trait]
impl MailProvider for GmailClient {
    async fn send_raw(&self, access_token: String, raw: String) -> Result<(), ProviderError> {
        let request_body = serde_json::json!({ "raw": raw });
        let response = self
            .http
            .post(format!("{}/messages/send", self.base_url))
            .bearer_auth(&access_token)
            .json(&request_body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn list_message_ids(
        &self,
        access_token: String,
        label: String,
        limit: u32,
    ) -> Result<Vec<String>, ProviderError> {
        let response = self
            .http
            .get(format!("{}/messages", self.base_url))
            .bearer_auth(&access_token)
            .query(&[("labelIds", label), ("maxResults", limit.to_string())])
            .send()
            .await?;
        let listing: MessagesResponse = Self::check(response).await?.json().await?;

        let ids: Vec<String> = listing
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| m.id)
            .collect();
        debug!(count = ids.len(), "Listed message ids");
        Ok(ids)
    }

    async fn get_metadata(
        &self,
        access_token: String,
        id: String,
    ) -> Result<Message, ProviderError> {
        let response = self
            .http
            .get(format!("{}/messages/{}", self.base_url, id))
            .bearer_auth(&access_token)
            .query(&[
                ("format", "metadata"),
                ("metadataHeaders", "From"),
                ("metadataHeaders", "Subject"),
                ("metadataHeaders", "Date"),
            ])
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_uses_google_message() {
        let body = r#"{"error": {"code": 400, "message": "Invalid To header", "status": "INVALID_ARGUMENT"}}"#;
        match rejection(400, body) {
            ProviderError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid To header");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rejection_falls_back_to_status_then_body() {
        let status_only = r#"{"error": {"status": "UNAUTHENTICATED"}}"#;
        assert_eq!(
            rejection(401, status_only).to_string(),
            "Gmail API error (401): UNAUTHENTICATED"
        );
        assert_eq!(
            rejection(502, "Bad Gateway\n").to_string(),
            "Gmail API error (502): Bad Gateway"
        );
        assert_eq!(
            rejection(500, "").to_string(),
            "Gmail API error (500): Unknown error"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = GmailClient::new(reqwest::Client::new(), "https://example.test/v1/");
        assert_eq!(client.base_url, "https://example.test/v1");
    }
}
