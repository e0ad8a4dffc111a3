//! Icon name to display string mapping.
//!
//! Chip icons are Material Design Icons names (`mdi:lightbulb`). The
//! terminal has no icon font, so common names map to short glyphs.

const ICON_SET_PREFIX: &str = "mdi:";

/// Convert an icon name to a display string.
///
/// The `mdi:` prefix is optional. Unknown icons come back as their bare
/// name.
#[must_use]
pub fn icon_to_str(icon: &str) -> &str {
    let name = icon.strip_prefix(ICON_SET_PREFIX).unwrap_or(icon);
    match name {
        "lightbulb" | "lightbulb-on" | "lamp" => "*",
        "lightbulb-off" | "lightbulb-outline" => "o",
        "fire" | "flash" => "^",
        "thermometer" => "T",
        "water" | "water-percent" => "~",
        "weather-sunny" => "O",
        "weather-night" => "C",
        "weather-cloudy" | "weather-partly-cloudy" => "&",
        "weather-rainy" | "weather-pouring" => "//",
        "home" | "home-outline" => "H",
        "account" | "account-circle" => "@",
        "lock" => "L",
        "lock-open" | "lock-open-variant" => "U",
        "door-open" => "]",
        "door-closed" | "door" => "|",
        "power" | "power-plug" => "P",
        "battery" => "B",
        "wifi" => "W",
        "bell" | "bell-ring" => "!",
        "music" | "music-note" => "~",
        "play" => ">",
        "pause" => "||",
        "stop" => "[]",
        "check" | "check-circle" => "+",
        "close" | "close-circle" => "x",
        "alert" | "alert-circle" => "!",
        "information" | "information-outline" => "i",
        "cog" => "#",
        _ => name,
    }
}
