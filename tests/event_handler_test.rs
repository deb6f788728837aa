use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use tokio::sync::RwLock;

use mymails::event_handler::{handle_key_event, AppAction};
use mymails::state::{AppState, ComposeField, Notice, Page};
use mymails::types::InboxEntry;

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

fn entry(id: &str) -> InboxEntry {
    InboxEntry {
        id: id.to_string(),
        from: format!("{id}@example.com"),
        subject: format!("Subject {id}"),
        date: "Mon, 2 Jun 2025 10:00:00 +0000".to_string(),
        snippet: String::new(),
    }
}

fn new_state() -> Arc<RwLock<AppState>> {
    Arc::new(RwLock::new(AppState::new(20)))
}

async fn type_text(state_arc: &Arc<RwLock<AppState>>, text: &str) {
    for c in text.chars() {
        handle_key_event(key(KeyCode::Char(c)), state_arc.clone()).await;
    }
}

#[tokio::test]
async fn test_home_menu_opens_inbox_and_requests_load() {
    let state_arc = new_state();

    handle_key_event(key(KeyCode::Char('j')), state_arc.clone()).await;
    let action = handle_key_event(key(KeyCode::Enter), state_arc.clone()).await;

    assert_eq!(action, AppAction::RefreshInbox);
    let state_guard = state_arc.read().await;
    assert_eq!(state_guard.page, Page::Inbox);
    assert!(state_guard.loading_inbox);
    assert_eq!(state_guard.inbox_status, "Loading emails...");
}

#[tokio::test]
async fn test_home_quit_keys() {
    let state_arc = new_state();
    assert_eq!(
        handle_key_event(key(KeyCode::Char('q')), state_arc.clone()).await,
        AppAction::Quit
    );
    assert_eq!(handle_key_event(ctrl('c'), state_arc.clone()).await, AppAction::Quit);
}

#[tokio::test]
async fn test_refresh_is_not_requested_twice_while_loading() {
    let state_arc = new_state();

    let first = handle_key_event(key(KeyCode::Char('i')), state_arc.clone()).await;
    let second = handle_key_event(key(KeyCode::Char('r')), state_arc.clone()).await;

    assert_eq!(first, AppAction::RefreshInbox);
    assert_eq!(second, AppAction::None);
}

#[tokio::test]
async fn test_compose_and_send() {
    let state_arc = new_state();
    handle_key_event(key(KeyCode::Char('c')), state_arc.clone()).await;

    type_text(&state_arc, "bob@example.com").await;
    handle_key_event(key(KeyCode::Tab), state_arc.clone()).await;
    type_text(&state_arc, "Hi").await;
    handle_key_event(key(KeyCode::Tab), state_arc.clone()).await;
    type_text(&state_arc, "line one").await;
    handle_key_event(key(KeyCode::Enter), state_arc.clone()).await;
    type_text(&state_arc, "line two").await;

    let action = handle_key_event(ctrl('s'), state_arc.clone()).await;

    match action {
        AppAction::Send(message) => {
            assert_eq!(message.to, "bob@example.com");
            assert_eq!(message.subject, "Hi");
            assert_eq!(message.body, "line one\nline two");
        }
        other => panic!("expected a send action, got {other:?}"),
    }
    assert!(state_arc.read().await.compose_state.sending);

    // A second send while the first is in flight is ignored
    assert_eq!(handle_key_event(ctrl('s'), state_arc.clone()).await, AppAction::None);
}

#[tokio::test]
async fn test_send_without_recipient_shows_notice() {
    let state_arc = new_state();
    handle_key_event(key(KeyCode::Char('c')), state_arc.clone()).await;
    {
        let mut state_guard = state_arc.write().await;
        state_guard.compose_state.focused_field = ComposeField::Body;
    }
    type_text(&state_arc, "body only").await;

    let action = handle_key_event(ctrl('s'), state_arc.clone()).await;

    assert_eq!(action, AppAction::None);
    let state_guard = state_arc.read().await;
    assert!(!state_guard.compose_state.sending);
    assert_eq!(
        state_guard.notice,
        Some(Notice::Error("Please enter a recipient email address.".to_string()))
    );
}

#[tokio::test]
async fn test_notice_swallows_the_dismissing_key() {
    let state_arc = new_state();
    state_arc
        .write()
        .await
        .set_notice(Notice::Info("Email sent successfully.".to_string()));

    let action = handle_key_event(key(KeyCode::Char('q')), state_arc.clone()).await;

    assert_eq!(action, AppAction::None);
    let state_guard = state_arc.read().await;
    assert!(state_guard.notice.is_none());
    assert_eq!(state_guard.page, Page::Home);
}

#[tokio::test]
async fn test_inbox_navigation_and_detail() {
    let state_arc = new_state();
    handle_key_event(key(KeyCode::Char('i')), state_arc.clone()).await;
    state_arc
        .write()
        .await
        .apply_inbox(vec![entry("a"), entry("b"), entry("c")]);

    handle_key_event(key(KeyCode::Char('j')), state_arc.clone()).await;
    handle_key_event(key(KeyCode::Char('j')), state_arc.clone()).await;
    handle_key_event(key(KeyCode::Char('j')), state_arc.clone()).await;
    {
        let state_guard = state_arc.read().await;
        assert_eq!(state_guard.selected_message, 2);
        assert_eq!(state_guard.message_state.selected(), Some(2));
    }

    handle_key_event(key(KeyCode::Enter), state_arc.clone()).await;
    assert!(state_arc.read().await.show_detail);

    // 'q' closes the detail view first, then leaves the inbox
    handle_key_event(key(KeyCode::Char('q')), state_arc.clone()).await;
    assert!(!state_arc.read().await.show_detail);
    assert_eq!(state_arc.read().await.page, Page::Inbox);

    handle_key_event(key(KeyCode::Char('q')), state_arc.clone()).await;
    assert_eq!(state_arc.read().await.page, Page::Home);
}

#[tokio::test]
async fn test_enter_on_empty_inbox_opens_nothing() {
    let state_arc = new_state();
    handle_key_event(key(KeyCode::Char('i')), state_arc.clone()).await;
    state_arc.write().await.apply_inbox(Vec::new());

    handle_key_event(key(KeyCode::Enter), state_arc.clone()).await;

    let state_guard = state_arc.read().await;
    assert!(!state_guard.show_detail);
    assert_eq!(
        state_guard.inbox_status,
        "No messages found (or failed to load)."
    );
}
