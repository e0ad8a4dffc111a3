#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Any config that parses must also hash
    if let Ok(s) = std::str::from_utf8(data)
        && let Ok(config) = serde_json::from_str::<chipdeck_types::ChipConfig>(s)
    {
        let _ = chipdeck_core::ConfigHash::of(&config);
    }
});
