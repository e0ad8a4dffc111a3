//! Color parsing utilities for TUI widgets.
//!
//! Chip colors come from dashboard configs, so besides hex values the
//! dashboard's named palette is understood.

use ratatui::style::Color;

/// Parse a chip color into a ratatui Color.
///
/// Supports:
/// - 6-digit hex: "#FF5500"
/// - 3-digit shorthand: "#F50" (expands to #FF5500)
/// - named dashboard colors: "red", "amber", "light-blue", ...
///
/// Returns None for anything else (CSS variables, rgb() and so on).
#[must_use]
pub fn parse_color(color: &str) -> Option<Color> {
    let color = color.trim();
    if color.starts_with('#') {
        return parse_hex_color(color);
    }
    named_color(&color.to_ascii_lowercase())
}

fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }

    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
            Some(Color::Rgb(r, g, b))
        }
        _ => None,
    }
}

fn named_color(name: &str) -> Option<Color> {
    let (r, g, b) = match name {
        "primary" => (0x03, 0xa9, 0xf4),
        "accent" => (0xff, 0x98, 0x00),
        "red" => (0xf4, 0x43, 0x36),
        "pink" => (0xe9, 0x1e, 0x63),
        "purple" => (0x92, 0x6b, 0xc7),
        "deep-purple" => (0x6e, 0x41, 0xab),
        "indigo" => (0x3f, 0x51, 0xb5),
        "blue" => (0x21, 0x96, 0xf3),
        "light-blue" => (0x03, 0xa9, 0xf4),
        "cyan" => (0x00, 0xbc, 0xd4),
        "teal" => (0x00, 0x96, 0x88),
        "green" => (0x4c, 0xaf, 0x50),
        "light-green" => (0x8b, 0xc3, 0x4a),
        "lime" => (0xcd, 0xdc, 0x39),
        "yellow" => (0xff, 0xeb, 0x3b),
        "amber" => (0xff, 0xc1, 0x07),
        "orange" => (0xff, 0x98, 0x00),
        "deep-orange" => (0xff, 0x6f, 0x22),
        "brown" => (0x79, 0x55, 0x48),
        "light-grey" => (0xbd, 0xbd, 0xbd),
        "grey" => (0x9e, 0x9e, 0x9e),
        "dark-grey" => (0x60, 0x60, 0x60),
        "blue-grey" => (0x60, 0x7d, 0x8b),
        "black" => (0x00, 0x00, 0x00),
        "white" => (0xff, 0xff, 0xff),
        _ => return None,
    };
    Some(Color::Rgb(r, g, b))
}
