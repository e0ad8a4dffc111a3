//! Badge widget for TUI.
//!
//! A badge is a small icon drawn over the chip icon, optionally tinted.
//!
//! ASCII representation: `[!]`

use chipdeck_core::BadgeView;
use ratatui::{
    style::{Color, Style},
    text::Span,
};

use super::color::parse_color;
use super::icon::icon_to_str;
use crate::colors;

const DEFAULT_COLOR: Color = colors::SECONDARY;

/// Renders a badge as `[glyph]`, tinted with its color when it parses.
#[must_use]
pub fn render_badge(badge: &BadgeView) -> Span<'static> {
    if badge.icon.trim().is_empty() {
        return Span::raw("");
    }
    let color = badge
        .color
        .as_deref()
        .and_then(parse_color)
        .unwrap_or(DEFAULT_COLOR);
    Span::styled(
        format!("[{}]", icon_to_str(&badge.icon)),
        Style::default().fg(color),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn badge(icon: &str, color: Option<&str>) -> BadgeView {
        BadgeView {
            icon: icon.to_string(),
            color: color.map(str::to_string),
        }
    }

    #[test]
    fn test_badge_glyph() {
        let span = render_badge(&badge("mdi:alert", None));
        assert_eq!(span.content, "[!]");
        assert_eq!(span.style.fg, Some(DEFAULT_COLOR));
    }

    #[test]
    fn test_badge_color() {
        let span = render_badge(&badge("mdi:check", Some("#00ff00")));
        assert_eq!(span.content, "[+]");
        assert_eq!(span.style.fg, Some(Color::Rgb(0, 255, 0)));
    }

    #[test]
    fn test_badge_unparsed_color_uses_default() {
        let span = render_badge(&badge("mdi:check", Some("var(--green)")));
        assert_eq!(span.style.fg, Some(DEFAULT_COLOR));
    }

    #[test]
    fn test_empty_badge() {
        assert_eq!(render_badge(&badge(" ", None)).content, "");
    }
}
