//! Scoped sensor ranging session.

use elevator_traits::DistanceSensor;

use crate::error::ElevatorError;
use crate::hw_error::{Subsystem, map_hw_error};

/// Keeps the sensor ranging for its lifetime and stops it on drop,
/// including when the read in between fails.
pub struct Acquisition<'a, S: DistanceSensor + ?Sized> {
    sensor: &'a mut S,
}

impl<'a, S: DistanceSensor + ?Sized> Acquisition<'a, S> {
    /// Start a ranging session.
    pub fn begin(sensor: &'a mut S) -> Result<Self, ElevatorError> {
        match sensor.start() {
            Ok(()) => Ok(Self { sensor }),
            Err(e) => {
                let err = map_hw_error(Subsystem::Sensor, &*e);
                // Leave the sensor idle even if start partially succeeded.
                if let Err(e) = sensor.stop() {
                    tracing::debug!(error = %e, "sensor stop after failed start");
                }
                Err(err)
            }
        }
    }

    pub fn read(&mut self) -> Result<u16, ElevatorError> {
        self.sensor
            .distance()
            .map_err(|e| map_hw_error(Subsystem::Sensor, &*e))
    }
}

impl<S: DistanceSensor + ?Sized> Drop for Acquisition<'_, S> {
    fn drop(&mut self) {
        if let Err(e) = self.sensor.stop() {
            tracing::warn!(error = %e, "sensor stop failed");
        }
    }
}
