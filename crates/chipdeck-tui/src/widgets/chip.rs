//! Chip widget for TUI.
//!
//! A resolved [`ChipView`] becomes a single line:
//!
//! ```text
//! (* [!] 21.5 °C ^ · Kitchen)
//!  |  |   |          `-- secondary
//!  |  |   `-- primary with an inline icon
//!  |  `-- badge
//!  `-- icon
//! ```

use chipdeck_core::{ChipView, Segment};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

use super::badge::render_badge;
use super::color::parse_color;
use super::icon::icon_to_str;
use crate::colors;

const PICTURE_GLYPH: &str = "[pic]";
const SEPARATOR: &str = " · ";
const ELLIPSIS: char = '…';

/// Leading integer of a `max_width` value (`"120px"` -> 120).
///
/// Values that do not start with a digit (`"auto"`, `"-3"`) yield `None`.
#[must_use]
pub fn max_width_cells(max_width: &str) -> Option<usize> {
    let trimmed = max_width.trim();
    let digits = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..digits].parse().ok()
}

/// Render scanned text. Icons use their own color, text uses `style`.
#[must_use]
pub fn render_segments(segments: &[Segment], style: Style) -> Vec<Span<'static>> {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Text { text } => Span::styled(text.clone(), style),
            Segment::Icon { name, color } => {
                let fg = color
                    .as_deref()
                    .and_then(parse_color)
                    .or(style.fg)
                    .unwrap_or(colors::PRIMARY);
                Span::styled(icon_to_str(name).to_string(), style.fg(fg))
            }
        })
        .collect()
}

/// Render a chip as `(icon badge primary · secondary)`.
///
/// Text is capped at the chip's `max_width` in cells when it has a leading
/// integer. Clickable chips get bold delimiters.
#[must_use]
pub fn render_chip_view(view: &ChipView) -> Line<'static> {
    let frame = if view.clickable {
        Style::default()
            .fg(colors::OUTLINE)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(colors::OUTLINE)
    };

    let mut head: Vec<Span<'static>> = Vec::new();
    if let Some(icon) = &view.icon {
        head.push(Span::styled(
            icon_to_str(icon).to_string(),
            icon_style(view),
        ));
    } else if view.picture.is_some() {
        head.push(Span::styled(PICTURE_GLYPH, Style::default().fg(colors::SUBTEXT)));
    }
    if let Some(badge) = &view.badge {
        head.push(render_badge(badge));
    }

    let mut text = render_segments(&view.primary, Style::default().fg(colors::ON_SURFACE));
    if !view.secondary.is_empty() {
        if !text.is_empty() {
            text.push(Span::styled(SEPARATOR, Style::default().fg(colors::OUTLINE)));
        }
        text.extend(render_segments(
            &view.secondary,
            Style::default().fg(colors::SUBTEXT),
        ));
    }
    if let Some(cells) = view.max_width.as_deref().and_then(max_width_cells) {
        text = truncate(text, cells);
    }

    let mut spans = vec![Span::styled("(", frame)];
    let has_head = !head.is_empty();
    spans.extend(head);
    if has_head && !text.is_empty() {
        spans.push(Span::raw(" "));
    }
    spans.extend(text);
    spans.push(Span::styled(")", frame));
    Line::from(spans)
}

fn icon_style(view: &ChipView) -> Style {
    let mut style = Style::default().fg(
        view.icon_color
            .as_deref()
            .and_then(parse_color)
            .unwrap_or(colors::PRIMARY),
    );
    if let Some(bg) = view.icon_background.as_deref().and_then(parse_color) {
        style = style.bg(bg);
    }
    style
}

/// Keep at most `cells` characters, ending with an ellipsis when cut.
fn truncate(spans: Vec<Span<'static>>, cells: usize) -> Vec<Span<'static>> {
    let total: usize = spans.iter().map(|span| span.content.chars().count()).sum();
    if total <= cells {
        return spans;
    }

    let mut budget = cells.saturating_sub(1);
    let mut kept = Vec::new();
    let mut last_style = Style::default();
    for span in spans {
        if budget == 0 {
            break;
        }
        last_style = span.style;
        let len = span.content.chars().count();
        if len <= budget {
            budget -= len;
            kept.push(span);
        } else {
            let cut: String = span.content.chars().take(budget).collect();
            kept.push(Span::styled(cut, span.style));
            budget = 0;
        }
    }
    if cells > 0 {
        kept.push(Span::styled(ELLIPSIS.to_string(), last_style));
    }
    kept
}
