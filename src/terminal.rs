use crossterm::{execute, terminal};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, stdout, Stdout};

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

pub fn setup_terminal() -> Result<Tui, Box<dyn std::error::Error>> {
    terminal::enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, terminal::EnterAlternateScreen)?;
    let mut tui = Terminal::new(CrosstermBackend::new(stdout))?;
    tui.clear()?;
    Ok(tui)
}

pub fn cleanup_terminal(tui: &mut Tui) -> io::Result<()> {
    terminal::disable_raw_mode()?;
    execute!(tui.backend_mut(), terminal::LeaveAlternateScreen)?;
    tui.show_cursor()
}

/// Leaves raw mode before a panic message is printed, so it stays readable.
pub fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = terminal::disable_raw_mode();
        let _ = execute!(io::stdout(), terminal::LeaveAlternateScreen);
        previous(info);
    }));
}
