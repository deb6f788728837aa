use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::engine::Engine;
use tracing::{error, info, warn};

use super::auth::CredentialProvider;
use super::client::MailProvider;
use crate::error::AuthError;

/// Result of a send attempt that got past credential acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    /// Rejected locally or by Gmail; carries the text to show the user.
    Failed(String),
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, SendOutcome::Sent)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutboundMessage {
    /// Checks the local preconditions: a recipient and a body.
    pub fn new(to: &str, subject: &str, body: &str) -> Result<Self, String> {
        if to.trim().is_empty() {
            return Err("Please enter a recipient email address.".to_string());
        }
        if body.trim().is_empty() {
            return Err("Please enter an email message.".to_string());
        }
        Ok(Self {
            to: to.trim().to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        })
    }

    /// Renders the message as RFC 5322 text with CRLF line endings.
    pub fn to_rfc5322(&self) -> String {
        let transfer_encoding = if self.body.is_ascii() { "7bit" } else { "8bit" };

        let mut email_content = String::new();
        email_content.push_str(&format!("To: {}\r\n", header_value(&self.to)));
        email_content.push_str(&format!("Subject: {}\r\n", encode_subject(&self.subject)));
        email_content.push_str("MIME-Version: 1.0\r\n");
        email_content.push_str("Content-Type: text/plain; charset=\"utf-8\"\r\n");
        email_content.push_str(&format!("Content-Transfer-Encoding: {transfer_encoding}\r\n"));
        email_content.push_str("\r\n");
        email_content.push_str(&normalize_newlines(&self.body));
        if !email_content.ends_with("\r\n") {
            email_content.push_str("\r\n");
        }
        email_content
    }

    /// The `raw` field Gmail expects.
    pub fn encode_raw(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.to_rfc5322().as_bytes())
    }
}

// Header values must stay on one line
fn header_value(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

fn encode_subject(subject: &str) -> String {
    let subject = header_value(subject);
    if subject.is_ascii() {
        subject
    } else {
        format!("=?utf-8?B?{}?=", STANDARD.encode(subject.as_bytes()))
    }
}

fn normalize_newlines(body: &str) -> String {
    body.replace("\r\n", "\n").replace('\r', "\n").replace('\n', "\r\n")
}

/// Send and list over one credential source and one provider.
pub struct Mailer<C: CredentialProvider, P: MailProvider> {
    pub(crate) credentials: C,
    pub(crate) provider: P,
}

impl<C: CredentialProvider, P: MailProvider> Mailer<C, P> {
    pub fn new(credentials: C, provider: P) -> Self {
        Self {
            credentials,
            provider,
        }
    }

    pub fn credentials(&self) -> &C {
        &self.credentials
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Sends a plain text message.
    ///
    /// Provider rejections and transport failures come back as
    /// `SendOutcome::Failed`; only credential acquisition errors are `Err`.
    pub async fn send(
        &self,
        to: &str,
        subject: &str,
        content: &str,
    ) -> Result<SendOutcome, AuthError> {
        let message = match OutboundMessage::new(to, subject, content) {
            Ok(message) => message,
            Err(reason) => {
                warn!(%reason, "Send refused locally");
                return Ok(SendOutcome::Failed(reason));
            }
        };

        let credential = self.credentials.ensure_credential().await?;

        match self
            .provider
            .send_raw(credential.access_token, message.encode_raw())
            .await
        {
            Ok(()) => {
                info!(to = %message.to, "Message sent");
                Ok(SendOutcome::Sent)
            }
            Err(e) => {
                error!(error = %e, "Gmail API error (send)");
                Ok(SendOutcome::Failed(e.to_string()))
            }
        }
    }
}
