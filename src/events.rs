use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};

use crate::app::App;

/// Where the `e` key writes the dashboard state.
pub const EXPORT_PATH: &str = "gpuwatch_export.json";

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    match key.code {
        // Quit
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

        // GPU selection
        KeyCode::Char('n') | KeyCode::Char(']') | KeyCode::Tab => app.select_next_gpu(),
        KeyCode::Char('p') | KeyCode::Char('[') | KeyCode::BackTab => app.select_prev_gpu(),

        // Card focus
        KeyCode::Left | KeyCode::Char('h') => app.focus_prev(),
        KeyCode::Right | KeyCode::Char('l') => app.focus_next(),
        KeyCode::Up | KeyCode::Char('k') => app.focus_up(),
        KeyCode::Down | KeyCode::Char('j') => app.focus_down(),

        // Reload
        KeyCode::Char('r') => app.request_refresh(),

        // Help
        KeyCode::Char('?') => app.toggle_help(),

        // Export
        KeyCode::Char('e') => {
            let export_path = PathBuf::from(EXPORT_PATH);
            match app.export_state(&export_path) {
                Ok(()) => {
                    app.set_status_message(format!("Exported to {}", export_path.display()));
                }
                Err(e) => {
                    app.set_status_message(format!("Export failed: {}", e));
                }
            }
        }

        _ => {}
    }
}
