use std::error::Error;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::models::OfficePart;

/// Parse `#rrggbb` into a terminal color. Anything else maps to gray.
pub(crate) fn hex_color(hex: &str) -> Color {
    let digits = hex.trim_start_matches('#');
    if digits.len() != 6 {
        return Color::Gray;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
    match (channel(0..2), channel(2..4), channel(4..6)) {
        (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
        _ => Color::Gray,
    }
}

/// Office-part label drawn on its category color.
pub(crate) fn office_part_badge(part: &OfficePart) -> Span<'static> {
    Span::styled(
        format!(" {} ", part.label()),
        Style::default()
            .fg(Color::Black)
            .bg(hex_color(part.color_hex())),
    )
}

/// Checkbox row for a detail view toggle.
pub(crate) fn toggle_line(key: &str, label: &str, enabled: bool) -> Line<'static> {
    let checkbox = if enabled { "[x]" } else { "[ ]" };
    let style = if enabled {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Gray)
    };
    Line::from(vec![
        Span::styled(format!("{checkbox} "), style),
        Span::raw(label.to_string()),
        Span::styled(format!(" ({key})"), Style::default().fg(Color::DarkGray)),
    ])
}

/// Footer line of `[key] label` pairs.
pub(crate) fn key_hints(hints: &[(&str, String)]) -> Line<'static> {
    let key_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (index, (key, label)) in hints.iter().enumerate() {
        let separator = if index + 1 < hints.len() { "   " } else { "" };
        spans.push(Span::styled(format!("[{key}]"), key_style));
        spans.push(Span::raw(format!(" {label}{separator}")));
    }
    Line::from(spans)
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for popups.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant message from a chained error.
pub(crate) fn surface_error(err: &(dyn Error + 'static)) -> String {
    let mut current = err;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ExportError;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(hex_color("#ff0000"), Color::Rgb(255, 0, 0));
        assert_eq!(hex_color("#cccccc"), Color::Rgb(204, 204, 204));
        assert_eq!(hex_color("red"), Color::Gray);
        assert_eq!(hex_color("#zzzzzz"), Color::Gray);
    }

    #[test]
    fn surfaces_innermost_cause() {
        let err = ExportError::Write {
            path: "/tmp/x.gabc".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        };
        assert_eq!(surface_error(&err), "read-only");
    }

    #[test]
    fn key_hints_alternate_keys_and_labels() {
        let line = key_hints(&[("q", "quit".to_string()), ("f", "search".to_string())]);
        let text: String = line.spans.iter().map(|span| span.content.as_ref()).collect();
        assert_eq!(text, "[q] quit   [f] search");
    }
}
