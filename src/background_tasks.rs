use crate::gmail_api::{CredentialProvider, MailProvider, Mailer, OutboundMessage, SendOutcome};
use crate::state::{AppState, Notice};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::error;

// Inbox loading is N+1 blocking round trips, so it never runs on the UI loop
pub fn spawn_inbox_fetch<C, P>(
    state_arc: Arc<RwLock<AppState>>,
    mailer: Arc<Mailer<C, P>>,
) -> JoinHandle<()>
where
    C: CredentialProvider + 'static,
    P: MailProvider + 'static,
{
    tokio::spawn(async move {
        let limit = state_arc.read().await.inbox_limit;
        let result = mailer.list_recent(limit).await;

        let mut state_guard = state_arc.write().await;
        match result {
            Ok(entries) => state_guard.apply_inbox(entries),
            Err(e) => {
                error!(error = %e, "Could not obtain credentials for inbox");
                state_guard.apply_inbox(Vec::new());
                state_guard.set_notice(Notice::Error(format!("Failed to load inbox:\n{e}")));
            }
        }
    })
}

pub fn spawn_send<C, P>(
    state_arc: Arc<RwLock<AppState>>,
    mailer: Arc<Mailer<C, P>>,
    message: OutboundMessage,
) -> JoinHandle<()>
where
    C: CredentialProvider + 'static,
    P: MailProvider + 'static,
{
    tokio::spawn(async move {
        let result = mailer
            .send(&message.to, &message.subject, &message.body)
            .await;

        let outcome = match result {
            Ok(SendOutcome::Sent) => Ok(()),
            Ok(SendOutcome::Failed(reason)) => Err(reason),
            Err(e) => {
                error!(error = %e, "Could not obtain credentials for send");
                Err(e.to_string())
            }
        };
        state_arc.write().await.finish_sending(outcome);
    })
}
