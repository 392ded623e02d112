//! Damped proportional drive toward the floor setpoint.

use std::time::Duration;

use elevator_traits::{Clock, DistanceSensor};

use crate::acquisition::Acquisition;
use crate::config::{MotionCfg, SensorCfg};
use crate::error::ElevatorError;

/// Pure shaping function from (distance, setpoint) to a drive level.
///
/// `shaped = diff * gain * exp(-decay * |diff|)` with `decay = dampener / diff_max_mm`,
/// clamped to `±max_drive`, then negated so that a car above its target drives down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DampingProfile {
    min_mm: u16,
    max_mm: u16,
    tolerance_mm: u16,
    gain: f32,
    decay: f32,
    max_drive: i32,
}

impl DampingProfile {
    pub fn new(cfg: &MotionCfg) -> Self {
        Self {
            min_mm: cfg.min_height_mm,
            max_mm: cfg.max_height_mm,
            tolerance_mm: cfg.setpoint_tolerance_mm,
            gain: cfg.gain,
            decay: cfg.dampener / f32::from(cfg.diff_max_mm.max(1)),
            max_drive: i32::from(cfg.max_drive),
        }
    }

    pub fn decay_per_mm(&self) -> f32 {
        self.decay
    }

    pub fn max_drive(&self) -> i16 {
        // Builder validation keeps max_drive within i16.
        i16::try_from(self.max_drive).unwrap_or(i16::MAX)
    }

    /// Valid readings lie in `[min, max]` inclusive.
    pub fn in_range(&self, distance_mm: u16) -> bool {
        (self.min_mm..=self.max_mm).contains(&distance_mm)
    }

    pub fn drive_for(&self, distance_mm: u16, setpoint_mm: u16) -> i16 {
        if !self.in_range(distance_mm) {
            return 0;
        }
        let diff = i32::from(distance_mm) - i32::from(setpoint_mm);
        if diff.unsigned_abs() <= u32::from(self.tolerance_mm) {
            return 0;
        }
        let d = diff as f32;
        let shaped = d * self.gain * (-self.decay * d.abs()).exp();
        let limit = self.max_drive as f32;
        // Truncation toward zero; `as` saturates so NaN cannot escape.
        let capped = shaped.clamp(-limit, limit) as i32;
        let drive = (-capped).clamp(-self.max_drive, self.max_drive);
        i16::try_from(drive).unwrap_or(0)
    }
}

/// Outcome of one motion step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MotionSample {
    /// Raw reading, if the sensor produced one.
    pub distance_mm: Option<u16>,
    /// Whether the reading was inside the valid height range.
    pub in_range: bool,
    pub drive: i16,
    pub error: Option<ElevatorError>,
}

/// Samples the sensor once per step and computes the drive.
#[derive(Debug, Clone)]
pub struct MotionController {
    profile: DampingProfile,
    settle: Duration,
}

impl MotionController {
    pub fn new(motion: &MotionCfg, sensor: &SensorCfg) -> Self {
        Self {
            profile: DampingProfile::new(motion),
            settle: Duration::from_millis(sensor.settle_ms),
        }
    }

    pub fn profile(&self) -> &DampingProfile {
        &self.profile
    }

    /// Read the distance inside a scoped ranging session and derive the drive.
    ///
    /// A failed start or read yields drive 0 with the error attached; the
    /// sensor is stopped either way.
    pub fn step<S: DistanceSensor + ?Sized>(
        &self,
        sensor: &mut S,
        clock: &dyn Clock,
        setpoint_mm: u16,
    ) -> MotionSample {
        let reading = Acquisition::begin(sensor).and_then(|mut acq| {
            let d = acq.read()?;
            if !self.settle.is_zero() {
                clock.sleep(self.settle);
            }
            Ok(d)
        });

        match reading {
            Ok(distance_mm) => {
                let in_range = self.profile.in_range(distance_mm);
                let drive = self.profile.drive_for(distance_mm, setpoint_mm);
                if !in_range {
                    tracing::debug!(distance_mm, "distance out of range");
                }
                tracing::trace!(distance_mm, setpoint_mm, drive, "motion step");
                MotionSample {
                    distance_mm: Some(distance_mm),
                    in_range,
                    drive,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "distance read failed");
                MotionSample {
                    distance_mm: None,
                    in_range: false,
                    drive: 0,
                    error: Some(e),
                }
            }
        }
    }
}
