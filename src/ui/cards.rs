//! Metric card grid.
//!
//! Each card shows a gauge of `normalized_percent` labelled with the current
//! value, the domain maximum, and a sparkline of the series scaled to that
//! maximum. Absent values render as placeholders, never as zero.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use gpuwatch_types::{MetricViewModel, TimeSeries};

use crate::app::{App, GRID_COLUMNS};
use crate::data::humanize::humanize;
use crate::data::MetricCard;

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

pub const LOADING_TEXT: &str = "Loading…";
pub const UNAVAILABLE_TEXT: &str = "Not available";

/// Render every card in a grid of [`GRID_COLUMNS`] columns.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    if app.cards.is_empty() {
        return;
    }

    let rows = app.cards.len().div_ceil(GRID_COLUMNS);
    let row_areas = Layout::vertical(vec![Constraint::Ratio(1, rows as u32); rows]).split(area);

    for (row, chunk) in app.cards.chunks(GRID_COLUMNS).enumerate() {
        let cells = Layout::horizontal(vec![Constraint::Ratio(1, GRID_COLUMNS as u32); GRID_COLUMNS])
            .split(row_areas[row]);
        for (column, card) in chunk.iter().enumerate() {
            let index = row * GRID_COLUMNS + column;
            render_card(frame, app, card, index == app.focused, cells[column]);
        }
    }
}

fn render_card(frame: &mut Frame, app: &App, card: &MetricCard, focused: bool, area: Rect) {
    let border_style = if focused {
        app.theme.focused
    } else {
        Style::default().fg(app.theme.border)
    };
    let block = Block::default()
        .title(Span::styled(format!(" {} ", card.spec.title), app.theme.header))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(border_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let view = &card.view;
    if let Some(text) = placeholder(view) {
        let paragraph = Paragraph::new(text)
            .style(app.theme.placeholder)
            .alignment(Alignment::Center);
        let middle = Rect {
            y: inner.y + inner.height / 2,
            height: inner.height.min(1),
            ..inner
        };
        frame.render_widget(paragraph, middle);
        return;
    }

    let chunks = Layout::vertical([
        Constraint::Length(1), // Gauge
        Constraint::Length(1), // Domain
        Constraint::Min(1),    // Sparkline
    ])
    .split(inner);

    let label = view
        .current_value
        .as_ref()
        .map(|v| v.string.clone())
        .unwrap_or_else(|| "-".to_string());
    let gauge = match view.normalized_percent {
        Some(percent) => Gauge::default()
            .gauge_style(Style::default().fg(app.theme.gauge_color(percent)))
            .ratio((percent / 100.0).clamp(0.0, 1.0))
            .label(Span::styled(label, Style::default().add_modifier(Modifier::BOLD))),
        None => Gauge::default()
            .gauge_style(app.theme.placeholder)
            .ratio(0.0)
            .label(label),
    };
    frame.render_widget(gauge.use_unicode(true), chunks[0]);

    let domain = if view.domain_max > 0.0 {
        let max = humanize(view.domain_max, card.spec.unit, card.spec.explicit_unit.as_deref());
        format!("max {}", max.string)
    } else {
        "max -".to_string()
    };
    frame.render_widget(
        Paragraph::new(domain).style(Style::default().add_modifier(Modifier::DIM)),
        chunks[1],
    );

    let trend = sparkline(&view.series, view.domain_max, chunks[2].width as usize);
    let bottom = Rect {
        y: chunks[2].y + chunks[2].height.saturating_sub(1),
        height: chunks[2].height.min(1),
        ..chunks[2]
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            trend,
            Style::default().fg(app.theme.trend),
        ))),
        bottom,
    );
}

/// Placeholder text for a card that has nothing to plot.
pub fn placeholder(view: &MetricViewModel) -> Option<&'static str> {
    if view.loading {
        Some(LOADING_TEXT)
    } else if view.error {
        Some(UNAVAILABLE_TEXT)
    } else {
        None
    }
}

/// Render the newest `width` samples as block characters scaled to `domain_max`.
///
/// Falls back to the series peak when the domain is unknown.
pub fn sparkline(series: &TimeSeries, domain_max: f64, width: usize) -> String {
    let scale = if domain_max > 0.0 {
        domain_max
    } else {
        match series.peak() {
            Some(peak) if peak > 0.0 => peak,
            _ => return String::new(),
        }
    };

    let skip = series.len().saturating_sub(width);
    series
        .values()
        .skip(skip)
        .map(|v| {
            let level = ((v / scale).clamp(0.0, 1.0) * 7.0).round() as usize;
            SPARKLINE_CHARS[level.min(7)]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpuwatch_types::Sample;

    fn series(values: &[f64]) -> TimeSeries {
        TimeSeries::from_samples(
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| Sample::new(i as i64 * 60, v))
                .collect(),
        )
    }

    #[test]
    fn test_sparkline_scales_to_domain() {
        assert_eq!(sparkline(&series(&[0.0, 50.0, 100.0]), 100.0, 10), "▁▅█");
    }

    #[test]
    fn test_sparkline_clamps_overshoot() {
        assert_eq!(sparkline(&series(&[150.0, -10.0]), 100.0, 10), "█▁");
    }

    #[test]
    fn test_sparkline_keeps_newest() {
        assert_eq!(sparkline(&series(&[100.0, 0.0, 0.0]), 100.0, 2), "▁▁");
    }

    #[test]
    fn test_sparkline_without_domain() {
        assert_eq!(sparkline(&series(&[1.0, 2.0]), 0.0, 10), "▅█");
        assert_eq!(sparkline(&series(&[0.0]), 0.0, 10), "");
        assert_eq!(sparkline(&TimeSeries::new(), 100.0, 10), "");
    }

    #[test]
    fn test_placeholder() {
        assert_eq!(placeholder(&MetricViewModel::loading(100.0)), Some(LOADING_TEXT));
        assert_eq!(
            placeholder(&MetricViewModel::unavailable(100.0)),
            Some(UNAVAILABLE_TEXT)
        );
        assert_eq!(placeholder(&MetricViewModel::default()), None);
    }
}
