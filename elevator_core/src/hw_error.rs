//! Maps `Box<dyn Error>` from trait boundaries to typed `ElevatorError`.
//!
//! The traits in `elevator_traits` use `Box<dyn Error + Send + Sync>`; this
//! module converts those to our typed error enum, with an optional
//! feature-gated path for `elevator_hardware::HwError` downcasting.

use crate::error::ElevatorError;

/// Which collaborator produced the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsystem {
    Sensor,
    Motor,
    Display,
    Bus,
}

/// Map a trait-boundary error to a typed `ElevatorError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(source: Subsystem, e: &(dyn std::error::Error + 'static)) -> ElevatorError {
    #[cfg(feature = "hardware-errors")]
    {
        use elevator_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match (source, hw) {
                (Subsystem::Sensor, HwError::Timeout) => ElevatorError::Timeout,
                (_, HwError::Bus(msg)) => ElevatorError::Bus(msg.clone()),
                (source, other) => wrap(source, other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if source == Subsystem::Sensor && s.to_lowercase().contains("timeout") {
        ElevatorError::Timeout
    } else {
        wrap(source, s)
    }
}

fn wrap(source: Subsystem, msg: String) -> ElevatorError {
    match source {
        Subsystem::Sensor => ElevatorError::Sensor(msg),
        Subsystem::Motor => ElevatorError::Motor(msg),
        Subsystem::Display => ElevatorError::Display(msg),
        Subsystem::Bus => ElevatorError::Bus(msg),
    }
}
