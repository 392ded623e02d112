use elevator_config::load_toml;
use rstest::rstest;

const BASE: &str = r#"
[motion]
min_height_mm = 50
max_height_mm = 600
setpoint_tolerance_mm = 5
gain = 8.0
dampener = 1.0
diff_max_mm = 500

[[floors]]
code = 0x05
setpoint_mm = 100
label = "Floor 1"

[[floors]]
code = 0x06
setpoint_mm = 300
label = "Floor 2"

[[floors]]
code = 0x07
setpoint_mm = 500
label = "Floor 3"
"#;

#[test]
fn accepts_minimal_config_with_defaults() {
    let cfg = load_toml(BASE).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.motion.floor_margin_mm, 10);
    assert_eq!(cfg.motion.max_drive, 1023);
    assert_eq!(cfg.bus.tx_id, 0x101);
    assert_eq!(cfg.timer.transmit_interval_ms, 1000);
    assert_eq!(cfg.sensor.settle_ms, 100);
    assert_eq!(cfg.floors[1].code, 0x06);
}

#[test]
fn missing_floors_is_a_parse_error() {
    let toml = r#"
[motion]
min_height_mm = 50
max_height_mm = 600
setpoint_tolerance_mm = 5
gain = 8.0
dampener = 1.0
diff_max_mm = 500
"#;
    assert!(load_toml(toml).is_err());
}

#[rstest]
#[case("[timer]\ntransmit_interval_ms = 0\n", "transmit_interval_ms must be >= 1")]
#[case("[bus]\ntx_id = 0x800\n", "tx_id must fit in 11 bits")]
#[case("[bus]\naccept_mask = 0x7F0\n", "accept_mask requires bus.accept_id")]
#[case("[bus]\nmax_rx_per_cycle = 0\n", "max_rx_per_cycle must be >= 1")]
#[case("[sim]\nmm_per_level = -1.0\n", "mm_per_level must be finite")]
fn rejects_bad_sections(#[case] extra: &str, #[case] needle: &str) {
    let toml = format!("{BASE}\n{extra}");
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    assert!(format!("{err}").contains(needle), "unexpected error: {err}");
}

#[rstest]
#[case("min_height_mm = 50", "min_height_mm = 700", "min_height_mm must be <")]
#[case("gain = 8.0", "gain = 0.0", "motion.gain must be")]
#[case("diff_max_mm = 500", "diff_max_mm = 0", "diff_max_mm must be >= 1")]
#[case("code = 0x06", "code = 0x05", "is duplicated")]
#[case("code = 0x07", "code = 0x00", "must be non-zero")]
#[case("setpoint_mm = 500", "setpoint_mm = 900", "is outside")]
fn rejects_bad_motion_and_floors(#[case] from: &str, #[case] to: &str, #[case] needle: &str) {
    let toml = BASE.replacen(from, to, 1);
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    assert!(format!("{err}").contains(needle), "unexpected error: {err}");
}

#[test]
fn rejects_unknown_default_floor() {
    let toml = BASE.replacen("diff_max_mm = 500", "diff_max_mm = 500\ndefault_floor = 0x09", 1);
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    assert!(format!("{err}").contains("default_floor 0x09"));
}
