//! Common UI components.
//!
//! This module contains the header bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::Gate;

/// Render the header bar.
///
/// Displays: selected GPU, model, node and the number of discovered GPUs.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = Span::styled(" GPUWATCH ", Style::default().add_modifier(Modifier::BOLD));

    let line = match app.selection.gate() {
        Gate::Loading => Line::from(vec![title, Span::raw("│ Discovering GPUs...")]),
        Gate::Unavailable => Line::from(vec![
            title,
            Span::raw("│ "),
            Span::styled("No GPU available", Style::default().fg(app.theme.critical)),
        ]),
        Gate::Open => {
            let uuid = app.selection.selected_uuid().unwrap_or_default();
            let info = app.selection.selected();
            let model = info
                .and_then(|g| g.model_name.as_deref())
                .unwrap_or("unknown model");
            let node = info.and_then(|g| g.node_name.as_deref()).unwrap_or("unknown node");
            let count = app.selection.device_list().len();
            let position = app
                .selection
                .device_list()
                .iter()
                .position(|g| g.uuid == uuid)
                .map(|p| p + 1)
                .unwrap_or(0);

            Line::from(vec![
                title,
                Span::raw("│ "),
                Span::styled(uuid.to_string(), Style::default().fg(app.theme.highlight)),
                Span::raw(format!(" │ {} │ {} │ ", model, node)),
                Span::styled(
                    format!("{}/{}", position, count),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(" GPUs"),
            ])
        }
    };

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the status bar at the bottom.
///
/// Shows the source, the last transport error if any, and available controls.
/// Temporary status messages take precedence.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    // Check for temporary status message first
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = "n/p:GPU ←↓↑→:focus r:reload e:export ?:help q:quit";
    let status = match app.load_error {
        Some(ref err) => format!(" Error: {} | {}", err, controls),
        None => format!(" {} | {}", app.source_description(), controls),
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the dashboard.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from(vec![Span::styled(
            " GPU",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  n / ]     Next GPU"),
        Line::from("  p / [     Previous GPU"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Cards",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  ←/→ h/l   Move focus"),
        Line::from("  ↑/↓ k/j   Move focus by row"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " General",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  r         Poll now"),
        Line::from("  e         Export to JSON"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    // Center the help overlay - responsive to terminal size
    let help_width = 36u16.min(area.width.saturating_sub(4));
    let help_height = 21u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    // Clear the area behind the help
    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
