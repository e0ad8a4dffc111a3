#![no_main]

use chipdeck_types::Segment;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Scanning must never panic and must never produce empty text segments
    if let Ok(s) = std::str::from_utf8(data) {
        for segment in chipdeck_core::markup::parse_inline_icons(s) {
            if let Segment::Text { text } = segment {
                assert!(!text.is_empty());
            }
        }
    }
});
