//! Inline icon markup.
//!
//! Chip text may embed icons as bracketed tokens:
//!
//! ```text
//! Hello [mdi:fire]!            -> "Hello ", icon mdi:fire, "!"
//! [mdi:fire color:#ff0000]     -> icon mdi:fire tinted #ff0000
//! ```
//!
//! A token is only recognised when its colon sits exactly four characters
//! after the opening bracket (a three-letter icon set such as `mdi`).
//! Anything else is passed through as literal text.

use chipdeck_types::Segment;

const COLOR_MARKER: &str = " color:";

/// Characters between `[` and `:` in a valid token, bracket included.
const PREFIX_CHARS: usize = 4;

/// Split text into literal and icon segments.
///
/// Never fails: malformed tokens come back as text. Empty text segments are
/// not emitted and adjacent text segments are not merged.
#[must_use]
pub fn parse_inline_icons(content: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut index = 0;

    while let Some(offset) = content[index..].find('[') {
        let bracket = index + offset;

        match scan_token(content, bracket) {
            Some(token) => {
                push_text(&mut segments, &content[index..bracket]);
                segments.push(token.segment);
                index = token.end;
            }
            None => {
                push_text(&mut segments, &content[index..=bracket]);
                index = bracket + 1;
            }
        }
    }

    push_text(&mut segments, &content[index..]);
    segments
}

/// Flatten segments back to plain text, dropping icons.
#[must_use]
pub fn plain_text(segments: &[Segment]) -> String {
    segments
        .iter()
        .filter_map(|segment| match segment {
            Segment::Text { text } => Some(text.as_str()),
            Segment::Icon { .. } => None,
        })
        .collect()
}

struct Token {
    segment: Segment,
    /// Byte index just past the closing bracket
    end: usize,
}

/// Try to read an icon token starting at the `[` at byte index `bracket`.
fn scan_token(content: &str, bracket: usize) -> Option<Token> {
    let colon = bracket + content[bracket..].find(':')?;
    if content[bracket..colon].chars().count() != PREFIX_CHARS {
        return None;
    }

    let close = colon + content[colon..].find(']')?;
    let marker = content[colon..]
        .find(COLOR_MARKER)
        .map(|offset| colon + offset)
        .filter(|marker| *marker < close);

    let segment = match marker {
        Some(marker) => Segment::icon(
            &content[bracket + 1..marker],
            Some(content[marker + COLOR_MARKER.len()..close].to_string()),
        ),
        None => Segment::icon(&content[bracket + 1..close], None),
    };

    Some(Token {
        segment,
        end: close + 1,
    })
}

fn push_text(segments: &mut Vec<Segment>, text: &str) {
    if !text.is_empty() {
        segments.push(Segment::text(text));
    }
}
