//! Collaborator implementations: a simulated car for host runs and tests, and
//! real chip drivers behind the `hardware` feature.
pub mod error;
pub mod sim;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod mcp4725;

pub use sim::{SimulatedBus, SimulatedCar, SimulatedDac, SimulatedDisplay, SimulatedSensor};
