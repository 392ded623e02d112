//! The elevator car control cycle (`ElevatorController`).
//!
//! Each cycle runs in a fixed order: service a pending receive, service a
//! pending transmit, take one motion step, then re-estimate the current floor.
//! Collaborator failures are logged and collected into the `CycleReport`;
//! nothing in the cycle is fatal.

use std::sync::Arc;

use eyre::WrapErr;

use elevator_traits::{BusTransport, Clock, Display, DistanceSensor, Frame, MotorDriver};

use crate::error::{ElevatorError, Result};
use crate::flags::{EventFlags, EventSignals};
use crate::floor::{CurrentFloor, FloorCode, FloorEntry, FloorTable, estimate};
use crate::hw_error::{Subsystem, map_hw_error};
use crate::motion::{MotionController, MotionSample};
use crate::protocol::{AcceptanceFilter, Command, classify, status_frame};
use crate::status::{CycleReport, EventReport};

pub struct ElevatorController<S, M, D, B>
where
    S: DistanceSensor,
    M: MotorDriver,
    D: Display,
    B: BusTransport,
{
    pub(crate) sensor: S,
    pub(crate) motor: M,
    pub(crate) display: D,
    pub(crate) bus: B,
    pub(crate) table: FloorTable,
    pub(crate) motion: MotionController,
    pub(crate) band_mm: u16,
    pub(crate) tx_id: u16,
    pub(crate) filter: Option<AcceptanceFilter>,
    pub(crate) max_rx_per_cycle: usize,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) flags: Arc<EventFlags>,

    pub(crate) destination: FloorCode,
    pub(crate) setpoint_mm: u16,
    pub(crate) current_floor: CurrentFloor,
    pub(crate) last_distance_mm: Option<u16>,
    pub(crate) last_drive: i16,
    pub(crate) cycles: u64,
}

impl<S, M, D, B> core::fmt::Debug for ElevatorController<S, M, D, B>
where
    S: DistanceSensor,
    M: MotorDriver,
    D: Display,
    B: BusTransport,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ElevatorController")
            .field("destination", &self.destination)
            .field("setpoint_mm", &self.setpoint_mm)
            .field("current_floor", &self.current_floor)
            .field("last_distance_mm", &self.last_distance_mm)
            .field("last_drive", &self.last_drive)
            .field("cycles", &self.cycles)
            .finish()
    }
}

impl<S, M, D, B> ElevatorController<S, M, D, B>
where
    S: DistanceSensor,
    M: MotorDriver,
    D: Display,
    B: BusTransport,
{
    /// Handle for raising receive/transmit events from other threads.
    pub fn signals(&self) -> EventSignals {
        EventSignals::from_flags(Arc::clone(&self.flags))
    }

    pub fn setpoint_mm(&self) -> u16 {
        self.setpoint_mm
    }

    /// Floor the car is currently commanded to.
    pub fn destination(&self) -> Option<&FloorEntry> {
        self.table.get(self.destination)
    }

    pub fn current_floor(&self) -> CurrentFloor {
        self.current_floor
    }

    pub fn last_distance_mm(&self) -> Option<u16> {
        self.last_distance_mm
    }

    pub fn last_drive(&self) -> i16 {
        self.last_drive
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn table(&self) -> &FloorTable {
        &self.table
    }

    pub fn motion(&self) -> &MotionController {
        &self.motion
    }

    /// Show the destination label. Call once before the first cycle.
    pub fn begin(&mut self) {
        let label = self
            .destination()
            .map(|e| e.label.clone())
            .unwrap_or_default();
        if let Err(e) = self.display.show_floor_label(&label) {
            let err = map_hw_error(Subsystem::Display, &*e);
            tracing::warn!(error = %err, "display init failed; continuing without label");
        }
        tracing::info!(
            floor = %self.destination,
            setpoint_mm = self.setpoint_mm,
            "controller ready"
        );
    }

    /// Apply a floor-request payload byte.
    ///
    /// Known codes move the setpoint and update the display label; unknown
    /// bytes leave all state untouched.
    pub fn apply_command(&mut self, payload: u8) -> Option<FloorCode> {
        let Some(entry) = self.table.interpret(payload) else {
            tracing::debug!(payload, "unknown floor code ignored");
            return None;
        };
        let (code, setpoint_mm, label) = (entry.code, entry.setpoint_mm, entry.label.clone());
        self.destination = code;
        self.setpoint_mm = setpoint_mm;
        tracing::info!(floor = %code, setpoint_mm, "floor request accepted");
        if let Err(e) = self.display.show_floor_label(&label) {
            let err = map_hw_error(Subsystem::Display, &*e);
            tracing::warn!(error = %err, "display label update failed");
        }
        Some(code)
    }

    fn handle_frame(&mut self, frame: &Frame, report: &mut EventReport) {
        tracing::info!(frame = %frame, "frame received");
        match classify(&self.table, self.filter.as_ref(), frame) {
            Command::GoTo(entry) => {
                let payload = entry.code.byte();
                if let Some(code) = self.apply_command(payload) {
                    report.accepted.push(code);
                }
            }
            Command::Unknown(b) => {
                tracing::debug!(payload = b, "unknown floor code ignored");
                report.ignored += 1;
            }
            Command::RemoteRequest => {
                tracing::debug!("remote request frame ignored");
                report.ignored += 1;
            }
            Command::Empty => {
                tracing::debug!("empty data frame ignored");
                report.ignored += 1;
            }
            Command::Filtered => {
                tracing::trace!(id = frame.id.value(), "frame rejected by acceptance filter");
                report.ignored += 1;
            }
        }
    }

    fn drain_receive(&mut self, report: &mut EventReport) {
        for _ in 0..self.max_rx_per_cycle {
            match self.bus.receive() {
                Ok(Some(frame)) => {
                    report.frames_received += 1;
                    self.handle_frame(&frame, report);
                }
                Ok(None) => return,
                Err(e) => {
                    let err = map_hw_error(Subsystem::Bus, &*e);
                    tracing::warn!(error = %err, "bus receive failed");
                    report.errors.push(err);
                    return;
                }
            }
        }
        // Budget exhausted; more frames may be waiting.
        self.flags.receive.raise();
    }

    /// Send the current floor code as a one-byte status frame.
    fn transmit_status(&mut self, report: &mut EventReport) {
        let frame = status_frame(self.tx_id, self.current_floor);
        let byte = self.current_floor.wire_byte();
        match self.bus.send(&frame) {
            Ok(()) => {
                tracing::debug!(floor = %self.current_floor, "status sent");
                report.transmitted = Some(byte);
            }
            Err(e) => {
                let err = map_hw_error(Subsystem::Bus, &*e);
                tracing::warn!(error = %err, "status transmit failed");
                report.transmit_failed = true;
                report.errors.push(err);
            }
        }
    }

    /// Consume pending receive and transmit events, receive first.
    pub fn service_events(&mut self) -> EventReport {
        let mut report = EventReport::default();
        if self.flags.receive.take() {
            self.drain_receive(&mut report);
        }
        if self.flags.transmit.take() {
            self.transmit_status(&mut report);
        }
        report
    }

    /// Sample the sensor once, drive the motor and refresh the distance readout.
    pub fn step_motion(&mut self) -> (MotionSample, Vec<ElevatorError>) {
        let sample = self
            .motion
            .step(&mut self.sensor, &*self.clock, self.setpoint_mm);
        let mut errors = Vec::new();
        if let Some(e) = &sample.error {
            errors.push(e.clone());
        }

        if let Err(e) = self.motor.set_drive_level(sample.drive) {
            let err = map_hw_error(Subsystem::Motor, &*e);
            tracing::warn!(error = %err, drive = sample.drive, "drive write failed");
            errors.push(err);
        }
        self.last_drive = sample.drive;

        if sample.in_range
            && let Some(d) = sample.distance_mm
        {
            self.last_distance_mm = Some(d);
            if let Err(e) = self.display.show_distance(d) {
                let err = map_hw_error(Subsystem::Display, &*e);
                tracing::debug!(error = %err, "distance readout failed");
                errors.push(err);
            }
        }
        (sample, errors)
    }

    fn reestimate_floor(&mut self, sample: &MotionSample) {
        if !sample.in_range {
            return;
        }
        let Some(d) = sample.distance_mm else {
            return;
        };
        let next = estimate(&self.table, d, self.current_floor, self.band_mm);
        if next != self.current_floor {
            tracing::info!(floor = %next, distance_mm = d, "current floor changed");
            self.current_floor = next;
        }
    }

    /// One control cycle: receive, transmit, motion, floor estimation.
    pub fn run_cycle(&mut self) -> CycleReport {
        self.cycles += 1;
        let events = self.service_events();
        let (motion, motion_errors) = self.step_motion();
        self.reestimate_floor(&motion);

        let mut errors = events.errors.clone();
        errors.extend(motion_errors);
        CycleReport {
            cycle: self.cycles,
            events,
            motion,
            setpoint_mm: self.setpoint_mm,
            floor: self.current_floor,
            errors,
        }
    }

    /// Command zero drive.
    pub fn stop_motor(&mut self) -> Result<()> {
        self.last_drive = 0;
        self.motor
            .set_drive_level(0)
            .map_err(|e| eyre::Report::new(map_hw_error(Subsystem::Motor, &*e)))
            .wrap_err("stopping motor")
    }
}
