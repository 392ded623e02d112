//! Human-readable error descriptions and structured JSON error formatting.

use elevator_core::error::{BuildError, ElevatorError};

fn find_elevator_error(err: &eyre::Report) -> Option<&ElevatorError> {
    err.chain().find_map(|e| e.downcast_ref::<ElevatorError>())
}

fn find_build_error(err: &eyre::Report) -> Option<&BuildError> {
    err.chain().find_map(|e| e.downcast_ref::<BuildError>())
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = find_build_error(err) {
        return match be {
            BuildError::MissingSensor => {
                "What happened: No distance sensor was provided to the controller.\nLikely causes: The sensor failed to initialize or was not wired into the builder.\nHow to fix: Ensure the sensor is created successfully and passed via with_sensor(...).".to_string()
            }
            BuildError::MissingMotor => {
                "What happened: No motor driver was provided to the controller.\nLikely causes: The DAC failed to initialize or was not wired into the builder.\nHow to fix: Ensure the motor driver is created successfully and passed via with_motor(...).".to_string()
            }
            BuildError::MissingBus => {
                "What happened: No bus transport was provided to the controller.\nLikely causes: The CAN transport failed to initialize or was not wired into the builder.\nHow to fix: Ensure the transport is created successfully and passed via with_bus(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML or floors CSV.\nHow to fix: Edit the config file, then rerun. See etc/elevator.toml for a sample."
            ),
        };
    }

    if let Some(ee) = find_elevator_error(err) {
        return match ee {
            ElevatorError::Timeout => "What happened: Distance sensor read timed out.\nLikely causes: Sensor not powered, I2C wiring fault, or the car is outside the sensor's field of view.\nHow to fix: Check sensor power and I2C wiring, then rerun self-check.".to_string(),
            ElevatorError::Sensor(msg) => format!(
                "What happened: Distance sensor error ({msg}).\nLikely causes: Sensor not started, I2C bus errors, or a faulty module.\nHow to fix: Check the sensor wiring and address; rerun with --log-level=debug."
            ),
            ElevatorError::Motor(msg) => format!(
                "What happened: Motor drive write failed ({msg}).\nLikely causes: DAC not present on the I2C bus or wrong address.\nHow to fix: Verify the DAC address and wiring; the car will not move until writes succeed."
            ),
            ElevatorError::Bus(msg) => format!(
                "What happened: CAN bus error ({msg}).\nLikely causes: No other node acknowledging frames, wrong bitrate, or a full transmit buffer.\nHow to fix: Check bus termination and bitrate; status frames are retried on the next tick."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from config loading
    let msg = err.to_string();
    let root = err.root_cause().to_string();
    let lower = format!("{msg} {root}").to_ascii_lowercase();

    if lower.contains("floors csv must have headers") {
        return "Invalid headers in floors CSV. Expected 'code,setpoint_mm,label'.".to_string();
    }

    if lower.contains("reading config") {
        return format!(
            "What happened: Could not read the config file ({root}).\nLikely causes: Wrong --config path or missing permissions.\nHow to fix: Pass --config with the path to a readable TOML file."
        );
    }

    if lower.contains("invalid configuration") || lower.contains("parsing config") {
        return format!(
            "What happened: Configuration is invalid or incomplete ({root}).\nLikely causes: Missing [motion] keys, an empty [[floors]] table, or out-of-range values.\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Map typed errors to stable exit codes; everything else returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if find_build_error(err).is_some() {
        return 2;
    }
    match find_elevator_error(err) {
        Some(ElevatorError::Sensor(_) | ElevatorError::Timeout) => 3,
        Some(ElevatorError::Motor(_)) => 4,
        Some(ElevatorError::Bus(_)) => 5,
        Some(ElevatorError::Display(_)) => 6,
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if find_build_error(err).is_some() {
        return "Build";
    }
    match find_elevator_error(err) {
        Some(ElevatorError::Sensor(_)) => "Sensor",
        Some(ElevatorError::Timeout) => "Timeout",
        Some(ElevatorError::Motor(_)) => "Motor",
        Some(ElevatorError::Bus(_)) => "Bus",
        Some(ElevatorError::Display(_)) => "Display",
        Some(ElevatorError::Config(_)) => "Config",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;
    json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
