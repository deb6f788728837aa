use tracing::{debug, error};

use super::auth::CredentialProvider;
use super::client::MailProvider;
use super::operations::Mailer;
use crate::error::{AuthError, MailError};
use crate::types::InboxEntry;

pub const INBOX_LABEL: &str = "INBOX";

impl<C: CredentialProvider, P: MailProvider> Mailer<C, P> {
    /// Latest inbox messages, newest first.
    ///
    /// All or nothing: any Gmail error yields an empty list, which is
    /// indistinguishable from an empty inbox. Use [`Mailer::try_list_recent`]
    /// to tell the two apart.
    pub async fn list_recent(&self, limit: u32) -> Result<Vec<InboxEntry>, AuthError> {
        match self.try_list_recent(limit).await {
            Ok(entries) => Ok(entries),
            Err(MailError::Auth(e)) => Err(e),
            Err(MailError::Provider(e)) => {
                error!(error = %e, "Gmail API error (list/get)");
                Ok(Vec::new())
            }
        }
    }

    /// One list call, then one metadata call per id, sequentially.
    pub async fn try_list_recent(&self, limit: u32) -> Result<Vec<InboxEntry>, MailError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let credential = self.credentials.ensure_credential().await?;
        let token = credential.access_token;

        let ids = self
            .provider
            .list_message_ids(token.clone(), INBOX_LABEL.to_string(), limit)
            .await?;

        let mut entries = Vec::with_capacity(ids.len());
        for id in ids {
            let message = self.provider.get_metadata(token.clone(), id.clone()).await?;
            entries.push(InboxEntry::from_metadata(&id, &message));
        }

        debug!(count = entries.len(), "Fetched inbox metadata");
        Ok(entries)
    }
}
