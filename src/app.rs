use crate::background_tasks::{spawn_inbox_fetch, spawn_send};
use crate::event_handler::{handle_key_event, AppAction};
use crate::gmail_api::{CredentialProvider, MailProvider, Mailer};
use crate::state::AppState;
use crate::terminal::Tui;
use crate::ui::draw_ui;
use crossterm::event::{self, Event, KeyEventKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Redraw cadence; also drives the home page clock.
const TICK: Duration = Duration::from_millis(100);

/// Moves consent URLs raised by background authorization into a notice.
pub fn apply_consent_prompts(state: &mut AppState, prompts: &mut UnboundedReceiver<String>) {
    while let Ok(url) = prompts.try_recv() {
        info!("Showing sign-in prompt");
        state.show_consent_prompt(&url);
    }
}

pub async fn run_app_loop<C, P>(
    terminal: &mut Tui,
    state_arc: Arc<RwLock<AppState>>,
    mailer: Arc<Mailer<C, P>>,
    mut prompts: UnboundedReceiver<String>,
) -> Result<(), Box<dyn std::error::Error>>
where
    C: CredentialProvider + 'static,
    P: MailProvider + 'static,
{
    info!("Entering main loop");

    loop {
        {
            let mut state_guard = state_arc.write().await;
            apply_consent_prompts(&mut state_guard, &mut prompts);
            terminal.draw(|f| draw_ui(f, &mut state_guard))?;
        }

        if !event::poll(TICK)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match handle_key_event(key, state_arc.clone()).await {
            AppAction::Quit => break,
            AppAction::RefreshInbox => {
                debug!("Inbox refresh requested");
                spawn_inbox_fetch(state_arc.clone(), mailer.clone());
            }
            AppAction::Send(message) => {
                debug!(to = %message.to, "Send requested");
                spawn_send(state_arc.clone(), mailer.clone(), message);
            }
            AppAction::None => {}
        }
    }

    info!("Leaving main loop");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Notice;

    #[test]
    fn test_consent_prompt_becomes_notice() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut state = AppState::new(20);

        apply_consent_prompts(&mut state, &mut rx);
        assert!(state.notice.is_none());

        tx.send("https://accounts.google.com/o/oauth2/auth?state=abc".to_string())
            .unwrap();
        apply_consent_prompts(&mut state, &mut rx);

        match &state.notice {
            Some(Notice::Info(text)) => {
                assert!(text.starts_with("Sign-in required."));
                assert!(text.ends_with("https://accounts.google.com/o/oauth2/auth?state=abc"));
            }
            other => panic!("unexpected notice: {other:?}"),
        }
    }
}
