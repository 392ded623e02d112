//! Per-cycle reports returned by the controller.

use crate::error::ElevatorError;
use crate::floor::{CurrentFloor, FloorCode};
use crate::motion::MotionSample;

/// What the event dispatcher did during one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventReport {
    /// Frames drained from the bus this cycle.
    pub frames_received: usize,
    /// Floor requests that changed (or re-confirmed) the setpoint, in arrival order.
    pub accepted: Vec<FloorCode>,
    /// Frames that were unknown, empty, remote or filtered.
    pub ignored: usize,
    /// Status byte sent, when a transmit was serviced and succeeded.
    pub transmitted: Option<u8>,
    pub transmit_failed: bool,
    pub errors: Vec<ElevatorError>,
}

/// Full outcome of one control cycle. Errors are collected, never raised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// 1-based cycle number.
    pub cycle: u64,
    pub events: EventReport,
    pub motion: MotionSample,
    pub setpoint_mm: u16,
    pub floor: CurrentFloor,
    /// Every collaborator error seen in this cycle, in order of occurrence.
    pub errors: Vec<ElevatorError>,
}

impl CycleReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
