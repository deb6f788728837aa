use crate::gmail_api::OutboundMessage;
use crate::state::{AppState, ComposeField, Page, HOME_MENU};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Work the main loop has to start after a key press.
#[derive(Debug, PartialEq, Eq)]
pub enum AppAction {
    None,
    Quit,
    RefreshInbox,
    Send(OutboundMessage),
}

fn refresh_if(needed: bool) -> AppAction {
    if needed {
        AppAction::RefreshInbox
    } else {
        AppAction::None
    }
}

pub async fn handle_key_event(key: KeyEvent, state_arc: Arc<RwLock<AppState>>) -> AppAction {
    let mut state_guard = state_arc.write().await;

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return AppAction::Quit;
    }

    // A notice is modal: the key that dismisses it does nothing else.
    if state_guard.notice.is_some() {
        state_guard.clear_notice();
        return AppAction::None;
    }

    match state_guard.page {
        Page::Home => handle_home_input(key, &mut state_guard),
        Page::Compose => handle_compose_input(key, &mut state_guard),
        Page::Inbox => handle_inbox_input(key, &mut state_guard),
    }
}

fn handle_home_input(key: KeyEvent, state: &mut AppState) -> AppAction {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => AppAction::Quit,
        KeyCode::Char('j') | KeyCode::Down => {
            state.move_down();
            AppAction::None
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.move_up();
            AppAction::None
        }
        KeyCode::Enter => {
            let (_, page) = HOME_MENU[state.home_selection];
            refresh_if(state.show_page(page))
        }
        KeyCode::Char('c') => refresh_if(state.show_page(Page::Compose)),
        KeyCode::Char('i') => refresh_if(state.show_page(Page::Inbox)),
        _ => AppAction::None,
    }
}

fn handle_compose_input(key: KeyEvent, state: &mut AppState) -> AppAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Esc => {
            state.show_page(Page::Home);
            AppAction::None
        }
        KeyCode::Tab => {
            state.compose_state.next_field();
            AppAction::None
        }
        KeyCode::BackTab => {
            state.compose_state.prev_field();
            AppAction::None
        }
        KeyCode::Char('s') if ctrl => send_action(state),
        KeyCode::Char('l') if ctrl => refresh_if(state.show_page(Page::Inbox)),
        KeyCode::Enter => match state.compose_state.focused_field {
            ComposeField::Send => send_action(state),
            ComposeField::Body => {
                state.compose_state.body.insert('\n');
                AppAction::None
            }
            ComposeField::To | ComposeField::Subject => {
                state.compose_state.next_field();
                AppAction::None
            }
        },
        KeyCode::Char(c) if !ctrl => {
            if let Some(field) = state.compose_state.focused_input() {
                field.insert(c);
            }
            AppAction::None
        }
        KeyCode::Backspace => {
            if let Some(field) = state.compose_state.focused_input() {
                field.backspace();
            }
            AppAction::None
        }
        KeyCode::Left => {
            if let Some(field) = state.compose_state.focused_input() {
                field.left();
            }
            AppAction::None
        }
        KeyCode::Right => {
            if let Some(field) = state.compose_state.focused_input() {
                field.right();
            }
            AppAction::None
        }
        _ => AppAction::None,
    }
}

fn send_action(state: &mut AppState) -> AppAction {
    match state.start_sending() {
        Some(message) => AppAction::Send(message),
        None => AppAction::None,
    }
}

fn handle_inbox_input(key: KeyEvent, state: &mut AppState) -> AppAction {
    if state.show_detail {
        // Any of these close the detail view
        if matches!(
            key.code,
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('b')
        ) {
            state.show_detail = false;
        }
        return AppAction::None;
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('b') | KeyCode::Char('q') => {
            state.show_page(Page::Home);
            AppAction::None
        }
        KeyCode::Char('j') | KeyCode::Down => {
            state.move_down();
            AppAction::None
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.move_up();
            AppAction::None
        }
        KeyCode::Char('r') | KeyCode::F(5) => refresh_if(state.begin_inbox_refresh()),
        KeyCode::Char('c') => {
            state.show_page(Page::Compose);
            AppAction::None
        }
        KeyCode::Enter => {
            state.show_detail = state.selected_entry().is_some();
            AppAction::None
        }
        _ => AppAction::None,
    }
}
