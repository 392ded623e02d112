//! Type-state builder for `Controller` and generic `build_controller` constructor.
//!
//! The builder enforces at compile time that the sensor, motor and bus are
//! provided before `build()` is available. `try_build()` is always available
//! for dynamic checks. The display is optional and defaults to `NoDisplay`.

use std::marker::PhantomData;
use std::sync::Arc;

use elevator_traits::{BusTransport, Clock, Display, DistanceSensor, MonotonicClock, MotorDriver};

use crate::config::{BusCfg, MotionCfg, SensorCfg};
use crate::controller::ElevatorController;
use crate::error::{BuildError, Result};
use crate::flags::EventFlags;
use crate::floor::{CurrentFloor, FloorTable};
use crate::mocks::NoDisplay;
use crate::motion::MotionController;
use crate::protocol::AcceptanceFilter;

/// Dynamically dispatched controller produced by `ControllerBuilder`.
pub type Controller = ElevatorController<
    Box<dyn DistanceSensor>,
    Box<dyn MotorDriver>,
    Box<dyn Display>,
    Box<dyn BusTransport>,
>;

pub struct Missing;
pub struct Set;

/// Builder for `Controller`. All settings are validated on `build()`.
pub struct ControllerBuilder<S, M, B> {
    sensor: Option<Box<dyn DistanceSensor>>,
    motor: Option<Box<dyn MotorDriver>>,
    bus: Option<Box<dyn BusTransport>>,
    display: Option<Box<dyn Display>>,
    motion: Option<MotionCfg>,
    bus_cfg: Option<BusCfg>,
    sensor_cfg: Option<SensorCfg>,
    floors: Option<FloorTable>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    _s: PhantomData<S>,
    _m: PhantomData<M>,
    _b: PhantomData<B>,
}

impl Default for ControllerBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            sensor: None,
            motor: None,
            bus: None,
            display: None,
            motion: None,
            bus_cfg: None,
            sensor_cfg: None,
            floors: None,
            clock: None,
            _s: PhantomData,
            _m: PhantomData,
            _b: PhantomData,
        }
    }
}

impl Controller {
    pub fn builder() -> ControllerBuilder<Missing, Missing, Missing> {
        ControllerBuilder::default()
    }
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

/// Validate settings and construct an `ElevatorController`.
///
/// Shared by `ControllerBuilder::try_build()` and `build_controller()`.
#[allow(clippy::too_many_arguments)]
fn validate_and_build<S, M, D, B>(
    sensor: S,
    motor: M,
    display: D,
    bus: B,
    motion: MotionCfg,
    bus_cfg: BusCfg,
    sensor_cfg: SensorCfg,
    floors: FloorTable,
    clock: Option<Box<dyn Clock + Send + Sync>>,
) -> Result<ElevatorController<S, M, D, B>>
where
    S: DistanceSensor,
    M: MotorDriver,
    D: Display,
    B: BusTransport,
{
    if motion.min_height_mm >= motion.max_height_mm {
        return Err(invalid("min_height_mm must be < max_height_mm"));
    }
    if !motion.gain.is_finite() || motion.gain <= 0.0 {
        return Err(invalid("gain must be finite and > 0"));
    }
    if !motion.dampener.is_finite() || motion.dampener < 0.0 {
        return Err(invalid("dampener must be finite and >= 0"));
    }
    if motion.diff_max_mm == 0 {
        return Err(invalid("diff_max_mm must be >= 1"));
    }
    if motion.max_drive == 0 || i16::try_from(motion.max_drive).is_err() {
        return Err(invalid("max_drive must be in [1, 32767]"));
    }
    let range = motion.min_height_mm..=motion.max_height_mm;
    if floors
        .entries()
        .iter()
        .any(|e| !range.contains(&e.setpoint_mm))
    {
        return Err(invalid("floor setpoint outside the valid height range"));
    }
    if bus_cfg.tx_id > 0x7FF {
        return Err(invalid("tx_id must fit in 11 bits"));
    }
    if bus_cfg.accept_id.is_some_and(|id| id > 0x7FF) {
        return Err(invalid("accept_id must fit in 11 bits"));
    }
    if bus_cfg.max_rx_per_cycle == 0 {
        return Err(invalid("max_rx_per_cycle must be >= 1"));
    }

    let clock: Arc<dyn Clock + Send + Sync> = match clock {
        Some(b) => Arc::from(b),
        None => Arc::new(MonotonicClock::new()),
    };
    let filter = bus_cfg.accept_id.map(|id| AcceptanceFilter {
        id,
        mask: bus_cfg.accept_mask,
    });
    let start = floors.default_entry();
    let (destination, setpoint_mm) = (start.code, start.setpoint_mm);

    Ok(ElevatorController {
        sensor,
        motor,
        display,
        bus,
        motion: MotionController::new(&motion, &sensor_cfg),
        band_mm: motion.floor_band_mm(),
        table: floors,
        tx_id: bus_cfg.tx_id,
        filter,
        max_rx_per_cycle: bus_cfg.max_rx_per_cycle,
        clock,
        flags: Arc::new(EventFlags::default()),
        destination,
        setpoint_mm,
        current_floor: CurrentFloor::Unknown,
        last_distance_mm: None,
        last_drive: 0,
        cycles: 0,
    })
}

impl<S, M, B> ControllerBuilder<S, M, B> {
    /// Fallible build available in any type-state; reports the first missing piece.
    pub fn try_build(self) -> Result<Controller> {
        let sensor = self
            .sensor
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSensor))?;
        let motor = self
            .motor
            .ok_or_else(|| eyre::Report::new(BuildError::MissingMotor))?;
        let bus = self
            .bus
            .ok_or_else(|| eyre::Report::new(BuildError::MissingBus))?;
        let display = self.display.unwrap_or_else(|| Box::new(NoDisplay));

        validate_and_build(
            sensor,
            motor,
            display,
            bus,
            self.motion.unwrap_or_default(),
            self.bus_cfg.unwrap_or_default(),
            self.sensor_cfg.unwrap_or_default(),
            self.floors.unwrap_or_default(),
            self.clock,
        )
    }
}

/// Chainable setters that do not affect type-state.
impl<S, M, B> ControllerBuilder<S, M, B> {
    pub fn with_display(mut self, display: impl Display + 'static) -> Self {
        self.display = Some(Box::new(display));
        self
    }
    pub fn with_motion(mut self, motion: MotionCfg) -> Self {
        self.motion = Some(motion);
        self
    }
    pub fn with_bus_cfg(mut self, bus_cfg: BusCfg) -> Self {
        self.bus_cfg = Some(bus_cfg);
        self
    }
    pub fn with_sensor_cfg(mut self, sensor_cfg: SensorCfg) -> Self {
        self.sensor_cfg = Some(sensor_cfg);
        self
    }
    pub fn with_floors(mut self, floors: FloorTable) -> Self {
        self.floors = Some(floors);
        self
    }
    /// Provide a custom clock implementation; defaults to `MonotonicClock`.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
}

// Setters that advance type-state
impl<M, B> ControllerBuilder<Missing, M, B> {
    pub fn with_sensor(
        self,
        sensor: impl DistanceSensor + 'static,
    ) -> ControllerBuilder<Set, M, B> {
        ControllerBuilder {
            sensor: Some(Box::new(sensor)),
            motor: self.motor,
            bus: self.bus,
            display: self.display,
            motion: self.motion,
            bus_cfg: self.bus_cfg,
            sensor_cfg: self.sensor_cfg,
            floors: self.floors,
            clock: self.clock,
            _s: PhantomData,
            _m: PhantomData,
            _b: PhantomData,
        }
    }
}

impl<S, B> ControllerBuilder<S, Missing, B> {
    pub fn with_motor(self, motor: impl MotorDriver + 'static) -> ControllerBuilder<S, Set, B> {
        ControllerBuilder {
            sensor: self.sensor,
            motor: Some(Box::new(motor)),
            bus: self.bus,
            display: self.display,
            motion: self.motion,
            bus_cfg: self.bus_cfg,
            sensor_cfg: self.sensor_cfg,
            floors: self.floors,
            clock: self.clock,
            _s: PhantomData,
            _m: PhantomData,
            _b: PhantomData,
        }
    }
}

impl<S, M> ControllerBuilder<S, M, Missing> {
    pub fn with_bus(self, bus: impl BusTransport + 'static) -> ControllerBuilder<S, M, Set> {
        ControllerBuilder {
            sensor: self.sensor,
            motor: self.motor,
            bus: Some(Box::new(bus)),
            display: self.display,
            motion: self.motion,
            bus_cfg: self.bus_cfg,
            sensor_cfg: self.sensor_cfg,
            floors: self.floors,
            clock: self.clock,
            _s: PhantomData,
            _m: PhantomData,
            _b: PhantomData,
        }
    }
}

impl ControllerBuilder<Set, Set, Set> {
    /// Validate and build. Only available once sensor, motor and bus are set.
    pub fn build(self) -> Result<Controller> {
        self.try_build()
    }
}

/// Build a statically dispatched controller from concrete collaborators.
///
/// Delegates to the shared `validate_and_build`.
#[allow(clippy::too_many_arguments)]
pub fn build_controller<S, M, D, B>(
    sensor: S,
    motor: M,
    display: D,
    bus: B,
    motion: MotionCfg,
    bus_cfg: BusCfg,
    sensor_cfg: SensorCfg,
    floors: FloorTable,
    clock: Option<Box<dyn Clock + Send + Sync>>,
) -> Result<ElevatorController<S, M, D, B>>
where
    S: DistanceSensor,
    M: MotorDriver,
    D: Display,
    B: BusTransport,
{
    validate_and_build(
        sensor, motor, display, bus, motion, bus_cfg, sensor_cfg, floors, clock,
    )
}
