use crate::gmail_api::OutboundMessage;
use crate::types::InboxEntry;
use ratatui::widgets::ListState;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Page {
    Home,
    Compose,
    Inbox,
}

/// Entries of the home page menu, top to bottom.
pub const HOME_MENU: [(&str, Page); 2] = [("Create Mail", Page::Compose), ("Inbox", Page::Inbox)];

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ComposeField {
    To,
    Subject,
    Body,
    Send,
}

/// A single-line or multi-line input with a cursor counted in chars.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TextField {
    value: String,
    cursor: usize,
}

impl TextField {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map_or(self.value.len(), |(i, _)| i)
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.value.remove(at);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        if self.cursor < self.value.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// (column, line) of the cursor, for placing the terminal caret.
    pub fn cursor_line_col(&self) -> (usize, usize) {
        let before: String = self.value.chars().take(self.cursor).collect();
        let line = before.matches('\n').count();
        let col = before
            .rsplit('\n')
            .next()
            .map_or(0, |tail| tail.chars().count());
        (col, line)
    }
}

#[derive(Debug)]
pub struct ComposeState {
    pub to: TextField,
    pub subject: TextField,
    pub body: TextField,
    pub focused_field: ComposeField,
    pub sending: bool,
}

impl ComposeState {
    pub fn new() -> Self {
        Self {
            to: TextField::default(),
            subject: TextField::default(),
            body: TextField::default(),
            focused_field: ComposeField::To,
            sending: false,
        }
    }

    pub fn clear(&mut self) {
        self.to.clear();
        self.subject.clear();
        self.body.clear();
        self.focused_field = ComposeField::To;
        self.sending = false;
    }

    pub fn next_field(&mut self) {
        self.focused_field = match self.focused_field {
            ComposeField::To => ComposeField::Subject,
            ComposeField::Subject => ComposeField::Body,
            ComposeField::Body => ComposeField::Send,
            ComposeField::Send => ComposeField::To,
        };
    }

    pub fn prev_field(&mut self) {
        self.focused_field = match self.focused_field {
            ComposeField::To => ComposeField::Send,
            ComposeField::Subject => ComposeField::To,
            ComposeField::Body => ComposeField::Subject,
            ComposeField::Send => ComposeField::Body,
        };
    }

    /// The input under focus; `None` on the Send button.
    pub fn focused_input(&mut self) -> Option<&mut TextField> {
        match self.focused_field {
            ComposeField::To => Some(&mut self.to),
            ComposeField::Subject => Some(&mut self.subject),
            ComposeField::Body => Some(&mut self.body),
            ComposeField::Send => None,
        }
    }
}

impl Default for ComposeState {
    fn default() -> Self {
        Self::new()
    }
}

/// A modal message box; any key dismisses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

pub struct AppState {
    pub page: Page,
    pub home_selection: usize,
    pub compose_state: ComposeState,
    pub inbox: Vec<InboxEntry>,
    pub selected_message: usize,
    pub message_state: ListState,
    pub loading_inbox: bool,
    pub inbox_status: String,
    pub show_detail: bool,
    pub notice: Option<Notice>,
    pub inbox_limit: u32,
}

impl AppState {
    pub fn new(inbox_limit: u32) -> Self {
        Self {
            page: Page::Home,
            home_selection: 0,
            compose_state: ComposeState::new(),
            inbox: Vec::new(),
            selected_message: 0,
            message_state: ListState::default(),
            loading_inbox: false,
            inbox_status: String::new(),
            show_detail: false,
            notice: None,
            inbox_limit,
        }
    }

    /// Switches page. Returns true when the inbox should be (re)loaded.
    pub fn show_page(&mut self, page: Page) -> bool {
        self.page = page;
        self.show_detail = false;
        page == Page::Inbox && self.begin_inbox_refresh()
    }

    /// Marks a load as started; false if one is already running.
    pub fn begin_inbox_refresh(&mut self) -> bool {
        if self.loading_inbox {
            return false;
        }
        self.loading_inbox = true;
        self.show_detail = false;
        self.inbox.clear();
        self.update_message_state();
        self.inbox_status = "Loading emails...".to_string();
        true
    }

    pub fn apply_inbox(&mut self, entries: Vec<InboxEntry>) {
        self.loading_inbox = false;
        self.inbox_status = if entries.is_empty() {
            "No messages found (or failed to load).".to_string()
        } else {
            format!("Showing {} messages", entries.len())
        };
        self.inbox = entries;
        self.selected_message = 0;
        self.update_message_state();
    }

    pub fn selected_entry(&self) -> Option<&InboxEntry> {
        self.inbox.get(self.selected_message)
    }

    pub fn move_down(&mut self) {
        match self.page {
            Page::Home => {
                self.home_selection = (self.home_selection + 1).min(HOME_MENU.len() - 1);
            }
            Page::Inbox if self.selected_message + 1 < self.inbox.len() => {
                self.selected_message += 1;
                self.update_message_state();
            }
            _ => {}
        }
    }

    pub fn move_up(&mut self) {
        match self.page {
            Page::Home => self.home_selection = self.home_selection.saturating_sub(1),
            Page::Inbox => {
                self.selected_message = self.selected_message.saturating_sub(1);
                self.update_message_state();
            }
            Page::Compose => {}
        }
    }

    pub fn update_message_state(&mut self) {
        if self.inbox.is_empty() {
            self.message_state.select(None);
        } else {
            self.message_state.select(Some(self.selected_message));
        }
    }

    /// Validates the compose form the way the send button does and marks
    /// the form as sending.
    pub fn start_sending(&mut self) -> Option<OutboundMessage> {
        if self.compose_state.sending {
            return None;
        }
        match OutboundMessage::new(
            self.compose_state.to.value(),
            self.compose_state.subject.value().trim(),
            self.compose_state.body.value().trim(),
        ) {
            Ok(message) => {
                self.compose_state.sending = true;
                Some(message)
            }
            Err(reason) => {
                self.set_notice(Notice::Error(reason));
                None
            }
        }
    }

    pub fn finish_sending(&mut self, result: Result<(), String>) {
        self.compose_state.sending = false;
        match result {
            Ok(()) => {
                self.compose_state.clear();
                self.set_notice(Notice::Info("Email sent successfully.".to_string()));
            }
            Err(reason) => {
                self.set_notice(Notice::Error(format!("Email could not be sent:\n{reason}")));
            }
        }
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    /// Shown when a background call needs the user to sign in again.
    pub fn show_consent_prompt(&mut self, url: &str) {
        self.set_notice(Notice::Info(format!(
            "Sign-in required. Open this URL in a browser to continue:\n\n{url}"
        )));
    }
}
