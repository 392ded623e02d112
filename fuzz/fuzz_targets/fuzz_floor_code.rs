#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(code) = elevator_config::parse_floor_code(data) {
        let t = data.trim();
        let hex = t.starts_with("0x") || t.starts_with("0X");
        assert!(hex || t.parse::<u8>() == Ok(code));
    }
});
