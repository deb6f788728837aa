use ratatui::backend::TestBackend;
use ratatui::Terminal;

use mymails::state::{AppState, Notice, Page};
use mymails::types::InboxEntry;
use mymails::ui::draw_ui;

fn render(state: &mut AppState) -> String {
    let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
    terminal.draw(|f| draw_ui(f, state)).unwrap();

    let buffer = terminal.backend().buffer();
    let width = buffer.area.width as usize;
    buffer
        .content
        .chunks(width)
        .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_home_page_lists_menu() {
    let mut state = AppState::new(20);
    let screen = render(&mut state);

    assert!(screen.contains("My Mails"));
    assert!(screen.contains("Create Mail"));
    assert!(screen.contains("Inbox"));
}

#[test]
fn test_inbox_page_shows_entries_and_status() {
    let mut state = AppState::new(20);
    state.page = Page::Inbox;
    state.apply_inbox(vec![InboxEntry {
        id: "m1".to_string(),
        from: "Alice <alice@example.com>".to_string(),
        subject: "Quarterly numbers".to_string(),
        date: String::new(),
        snippet: "See attached".to_string(),
    }]);

    let screen = render(&mut state);

    assert!(screen.contains("Showing 1 messages"));
    assert!(screen.contains("Alice <alice@example.com>"));
    assert!(screen.contains("Quarterly numbers"));
}

#[test]
fn test_notice_popup_is_drawn_over_page() {
    let mut state = AppState::new(20);
    state.page = Page::Compose;
    state.set_notice(Notice::Error("Please enter an email message.".to_string()));

    let screen = render(&mut state);

    assert!(screen.contains("Error"));
    assert!(screen.contains("Please enter an email message."));
    assert!(screen.contains("Press any key to continue"));
}
