#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Elevator car control core (hardware-agnostic).
//!
//! All hardware goes through the `elevator_traits` collaborator traits:
//! `DistanceSensor`, `MotorDriver`, `Display` and `BusTransport`.
//!
//! ## Architecture
//!
//! - **Floors**: data-driven `FloorTable` and the sticky `estimate` (`floor`)
//! - **Events**: `StickyFlag`-backed receive/transmit signals (`flags`, `ticker`)
//! - **Motion**: damped proportional drive with a scoped sensor session (`motion`)
//! - **Protocol**: one-byte floor request/status frames with acceptance filtering (`protocol`)
//! - **Control**: the fixed-order cycle (`controller`) and the run loop (`runner`)
//!
//! ## Cycle order
//!
//! receive → transmit → motion step → floor re-estimation. No step in a cycle
//! is fatal; collaborator errors are logged and returned in the `CycleReport`.

pub mod acquisition;
pub mod builder;
pub mod config;
pub mod controller;
pub mod conversions;
pub mod error;
pub mod flags;
pub mod floor;
pub mod hw_error;
pub mod mocks;
pub mod motion;
pub mod protocol;
pub mod runner;
pub mod status;
pub mod ticker;

pub use builder::{Controller, ControllerBuilder, Missing, Set, build_controller};
pub use config::{BusCfg, MotionCfg, SensorCfg, TimerCfg};
pub use controller::ElevatorController;
pub use error::{BuildError, ElevatorError, Result};
pub use flags::{EventFlags, EventSignals, StickyFlag};
pub use floor::{CurrentFloor, FloorCode, FloorEntry, FloorTable, estimate};
pub use motion::{DampingProfile, MotionController, MotionSample};
pub use runner::{RunParams, RunSummary, StopReason, run, run_with};
pub use status::{CycleReport, EventReport};
pub use ticker::Ticker;
