//! Terminal user interface (TUI)
//!
//! Draws the supplier invoice pages with ratatui and feeds crossterm key events into
//! their table pages.

pub mod app;
pub mod components;
pub mod ui;

pub use app::{App, InputMode};

use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use tracing::{error, info};

use crate::config::Config;
use crate::database::Database;
use crate::models::User;
use crate::storage::Storage;

/// Take over the terminal, run the application until it quits, then restore the terminal
pub async fn run_tui(config: Config, storage: &Storage, database: Database, user: User) -> Result<()> {
    let mut app = App::new(config, database, user)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    info!("Starting main application loop");
    let result = app.run(&mut terminal, storage).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    match &result {
        Ok(()) => info!("TUI exited successfully"),
        Err(e) => error!("TUI encountered an error: {}", e),
    }
    result
}
