use crate::state::{AppState, ComposeField, Notice, Page, TextField, HOME_MENU};
use chrono::{DateTime, Local};
use ratatui::{prelude::*, widgets::*};

const NAVY_BG: Color = Color::Rgb(0x0B, 0x12, 0x20);
const NAVY_PANEL: Color = Color::Rgb(0x0F, 0x1A, 0x2B);
const NAVY_ACCENT: Color = Color::Rgb(0x1D, 0x4E, 0xD8);
const NAVY_TEXT: Color = Color::Rgb(0xE5, 0xE7, 0xEB);
const NAVY_MUTED: Color = Color::Rgb(0x9C, 0xA3, 0xAF);
const NAVY_BORDER: Color = Color::Rgb(0x1F, 0x2A, 0x44);
const ENTRY_BG: Color = Color::Rgb(0x0B, 0x16, 0x28);
const ERROR_RED: Color = Color::Rgb(0xF8, 0x71, 0x71);

// Helper function to format email date
fn format_email_date(date_str: &str) -> String {
    if let Ok(dt_fixed) = DateTime::parse_from_rfc2822(date_str) {
        let dt_local = dt_fixed.with_timezone(&Local);
        if dt_local.date_naive() == Local::now().date_naive() {
            dt_local.format("%-I:%M%P").to_string()
        } else {
            dt_local.format("%b %-d, %Y").to_string()
        }
    } else {
        date_str.to_string()
    }
}

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(NAVY_BORDER))
        .title(Span::styled(
            title,
            Style::default().fg(NAVY_TEXT).add_modifier(Modifier::BOLD),
        ))
        .style(Style::default().bg(NAVY_PANEL).fg(NAVY_TEXT))
        .padding(Padding::horizontal(1))
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(NAVY_ACCENT).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(NAVY_BORDER)
    }
}

pub fn draw_ui(f: &mut Frame, state: &mut AppState) {
    let area = f.size();
    f.render_widget(Block::default().style(Style::default().bg(NAVY_BG)), area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let (title, tagline) = match state.page {
        Page::Home => ("My Mails", "Compose and manage your messages"),
        Page::Compose => ("Compose", "Write your email below"),
        Page::Inbox => ("Inbox", "Your latest messages"),
    };
    draw_header(f, chunks[0], title, tagline);

    match state.page {
        Page::Home => draw_home(f, chunks[1], state),
        Page::Compose => draw_compose(f, chunks[1], state),
        Page::Inbox => draw_inbox(f, chunks[1], state),
    }
    draw_help_bar(f, chunks[2], state.page);

    if state.page == Page::Inbox && state.show_detail {
        draw_detail_popup(f, state);
    }
    if let Some(notice) = &state.notice {
        draw_notice_popup(f, notice);
    }
}

fn draw_header(f: &mut Frame, area: Rect, title: &str, tagline: &str) {
    let text = vec![
        Line::from(Span::styled(
            title,
            Style::default().fg(NAVY_TEXT).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(tagline, Style::default().fg(NAVY_MUTED))),
    ];
    let header = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(NAVY_BORDER))
            .style(Style::default().bg(NAVY_PANEL))
            .padding(Padding::horizontal(1)),
    );
    f.render_widget(header, area);
}

fn draw_home(f: &mut Frame, area: Rect, state: &AppState) {
    let block = panel("");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(""));
    for (i, (label, _)) in HOME_MENU.iter().enumerate() {
        let style = if i == state.home_selection {
            Style::default()
                .bg(NAVY_ACCENT)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().bg(NAVY_BORDER).fg(NAVY_TEXT)
        };
        lines.push(Line::from(Span::styled(format!("  {label:<14}"), style)));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        Local::now().format("%H:%M:%S").to_string(),
        Style::default().fg(NAVY_TEXT).add_modifier(Modifier::BOLD),
    )));

    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_input(f: &mut Frame, area: Rect, title: &str, field: &TextField, focused: bool, wrap: bool) {
    let mut paragraph = Paragraph::new(field.value())
        .style(Style::default().bg(ENTRY_BG).fg(NAVY_TEXT))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(focus_style(focused)),
        );
    if wrap {
        paragraph = paragraph.wrap(Wrap { trim: false });
    }
    f.render_widget(paragraph, area);

    if focused {
        let (x, y) = cursor_position(area, field.cursor_line_col());
        f.set_cursor(x, y);
    }
}

/// Terminal cell for a (column, line) cursor inside a bordered input,
/// clamped to the input's inner area.
fn cursor_position(area: Rect, (col, line): (usize, usize)) -> (u16, u16) {
    let offset = |n: usize| u16::try_from(n).unwrap_or(u16::MAX);
    let x = area
        .x
        .saturating_add(1)
        .saturating_add(offset(col))
        .min(area.right().saturating_sub(2));
    let y = area
        .y
        .saturating_add(1)
        .saturating_add(offset(line))
        .min(area.bottom().saturating_sub(2));
    (x, y)
}

fn draw_compose(f: &mut Frame, area: Rect, state: &AppState) {
    let block = panel("");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(inner);

    let compose = &state.compose_state;
    let focused = compose.focused_field;
    draw_input(f, chunks[0], "To", &compose.to, focused == ComposeField::To, false);
    draw_input(f, chunks[1], "Subject", &compose.subject, focused == ComposeField::Subject, false);
    draw_input(f, chunks[2], "Message", &compose.body, focused == ComposeField::Body, true);

    let send_text = if compose.sending {
        "Sending..."
    } else {
        "[ Send ]"
    };
    let send_style = if focused == ComposeField::Send {
        Style::default()
            .bg(NAVY_ACCENT)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(NAVY_TEXT)
    };
    let send_button = Paragraph::new(send_text)
        .style(send_style)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focus_style(focused == ComposeField::Send)),
        );
    f.render_widget(send_button, chunks[3]);
}

fn draw_inbox(f: &mut Frame, area: Rect, state: &mut AppState) {
    let block = panel("");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    f.render_widget(
        Paragraph::new(state.inbox_status.as_str()).style(Style::default().fg(NAVY_MUTED)),
        chunks[0],
    );

    let items: Vec<ListItem> = state
        .inbox
        .iter()
        .map(|entry| {
            let sender = if entry.from.is_empty() {
                "Unknown"
            } else {
                entry.from.as_str()
            };
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(
                        sender.to_string(),
                        Style::default().fg(NAVY_TEXT).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("  "),
                    Span::styled(format_email_date(&entry.date), Style::default().fg(NAVY_MUTED)),
                ]),
                Line::from(Span::styled(entry.subject.clone(), Style::default().fg(NAVY_TEXT))),
                Line::from(Span::styled(entry.snippet.clone(), Style::default().fg(NAVY_MUTED))),
                Line::from(""),
            ])
            .style(Style::default().bg(ENTRY_BG))
        })
        .collect();

    let list = List::new(items)
        .highlight_style(Style::default().bg(NAVY_BORDER))
        .highlight_symbol("▌ ");
    f.render_stateful_widget(list, chunks[1], &mut state.message_state);
}

fn draw_help_bar(f: &mut Frame, area: Rect, page: Page) {
    let help = match page {
        Page::Home => "↑/↓: Select | Enter: Open | c: Compose | i: Inbox | q: Quit",
        Page::Compose => "Tab/Shift+Tab: Field | Enter: Send (on Send) | Ctrl+S: Send | Ctrl+L: Inbox | Esc: Back",
        Page::Inbox => "↑/↓: Select | Enter: Open | r: Refresh | c: Compose | Esc: Back",
    };
    f.render_widget(
        Paragraph::new(help)
            .style(Style::default().fg(NAVY_MUTED).bg(NAVY_BG))
            .alignment(Alignment::Center),
        area,
    );
}

fn draw_detail_popup(f: &mut Frame, state: &AppState) {
    let Some(entry) = state.selected_entry() else {
        return;
    };
    let area = centered_rect(70, 50, f.size());
    let text = vec![
        Line::from(Span::styled(
            entry.from.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format_email_date(&entry.date),
            Style::default().fg(NAVY_MUTED),
        )),
        Line::from(""),
        Line::from(entry.subject.clone()),
        Line::from(""),
        Line::from(entry.snippet.clone()),
    ];
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(text)
            .wrap(Wrap { trim: true })
            .block(panel("Message").padding(Padding::uniform(1))),
        area,
    );
}

fn draw_notice_popup(f: &mut Frame, notice: &Notice) {
    let (title, message, color) = match notice {
        Notice::Info(message) => ("Success", message, NAVY_ACCENT),
        Notice::Error(message) => ("Error", message, ERROR_RED),
    };
    // Sign-in URLs run to several hundred characters
    let area = if message.len() > 120 {
        centered_rect(80, 60, f.size())
    } else {
        centered_rect(50, 30, f.size())
    };
    let mut lines: Vec<Line> = message.lines().map(Line::from).collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Press any key to continue",
        Style::default().fg(NAVY_MUTED),
    )));

    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .alignment(Alignment::Center)
            .block(
                panel(title)
                    .border_style(Style::default().fg(color))
                    .padding(Padding::uniform(1)),
            ),
        area,
    );
}

// Helper function to create a centered rectangle
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
