//! `From` implementations bridging `elevator_config` types to core runtime types.

use crate::config::{BusCfg, MotionCfg, SensorCfg, TimerCfg};
use crate::error::BuildError;
use crate::floor::{FloorCode, FloorEntry, FloorTable};

impl From<&elevator_config::Motion> for MotionCfg {
    fn from(c: &elevator_config::Motion) -> Self {
        Self {
            min_height_mm: c.min_height_mm,
            max_height_mm: c.max_height_mm,
            setpoint_tolerance_mm: c.setpoint_tolerance_mm,
            floor_margin_mm: c.floor_margin_mm,
            gain: c.gain,
            dampener: c.dampener,
            diff_max_mm: c.diff_max_mm,
            max_drive: c.max_drive,
        }
    }
}

impl From<&elevator_config::Bus> for BusCfg {
    fn from(c: &elevator_config::Bus) -> Self {
        Self {
            tx_id: c.tx_id,
            accept_id: c.accept_id,
            accept_mask: c.accept_mask.unwrap_or(0x7FF),
            max_rx_per_cycle: c.max_rx_per_cycle,
        }
    }
}

impl From<&elevator_config::Timer> for TimerCfg {
    fn from(c: &elevator_config::Timer) -> Self {
        Self {
            transmit_interval_ms: c.transmit_interval_ms,
        }
    }
}

impl From<&elevator_config::Sensor> for SensorCfg {
    fn from(c: &elevator_config::Sensor) -> Self {
        Self {
            settle_ms: c.settle_ms,
        }
    }
}

impl From<&elevator_config::FloorRow> for FloorEntry {
    fn from(r: &elevator_config::FloorRow) -> Self {
        FloorEntry::new(r.code, r.setpoint_mm, r.label.clone())
    }
}

/// Floor table from the `[[floors]]` rows, honouring `motion.default_floor`.
impl TryFrom<&elevator_config::Config> for FloorTable {
    type Error = BuildError;

    fn try_from(c: &elevator_config::Config) -> Result<Self, Self::Error> {
        let table = FloorTable::new(c.floors.iter().map(FloorEntry::from).collect())?;
        match c.motion.default_floor {
            Some(code) => table.with_default(FloorCode(code)),
            None => Ok(table),
        }
    }
}
