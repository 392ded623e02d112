//! Collaborator seams for the elevator car controller.
//!
//! Every piece of hardware the control core touches sits behind one of these
//! traits. Errors cross the boundary as `Box<dyn Error + Send + Sync>`; the core
//! maps them to its own typed error.

pub mod clock;
pub mod frame;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use frame::{Frame, FrameId, FrameKind};

/// Time-of-flight style distance sensor measuring car height in millimetres.
pub trait DistanceSensor {
    /// Begin a ranging session.
    fn start(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// End a ranging session.
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// Latest distance in millimetres.
    fn distance(&mut self) -> Result<u16, Box<dyn std::error::Error + Send + Sync>>;
}

/// Motor drive output (DAC). Positive levels raise the car.
pub trait MotorDriver {
    fn set_drive_level(&mut self, level: i16)
    -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Car-side display showing the destination label and the live distance.
pub trait Display {
    fn show_floor_label(&mut self, label: &str)
    -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn show_distance(&mut self, mm: u16) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// CAN transport. `receive` returns `Ok(None)` when no frame is buffered.
pub trait BusTransport {
    fn send(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn receive(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: DistanceSensor + ?Sized> DistanceSensor for Box<T> {
    fn start(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).start()
    }
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).stop()
    }
    fn distance(&mut self) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        (**self).distance()
    }
}

impl<T: MotorDriver + ?Sized> MotorDriver for Box<T> {
    fn set_drive_level(
        &mut self,
        level: i16,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_drive_level(level)
    }
}

impl<T: Display + ?Sized> Display for Box<T> {
    fn show_floor_label(
        &mut self,
        label: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).show_floor_label(label)
    }
    fn show_distance(&mut self, mm: u16) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).show_distance(mm)
    }
}

impl<T: BusTransport + ?Sized> BusTransport for Box<T> {
    fn send(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).send(frame)
    }
    fn receive(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error + Send + Sync>> {
        (**self).receive()
    }
}
