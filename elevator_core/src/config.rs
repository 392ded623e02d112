//! Runtime configuration for the controller core.
//!
//! These are separate from the TOML-deserialized structs in `elevator_config`;
//! see `conversions` for the mapping.

/// Motion and floor-estimation parameters.
#[derive(Debug, Clone)]
pub struct MotionCfg {
    /// Lowest valid reading in mm (inclusive).
    pub min_height_mm: u16,
    /// Highest valid reading in mm (inclusive).
    pub max_height_mm: u16,
    /// Differences within this many mm produce no drive.
    pub setpoint_tolerance_mm: u16,
    /// Extra band around a setpoint used only for floor estimation.
    pub floor_margin_mm: u16,
    /// Linear gain applied to the difference.
    pub gain: f32,
    /// Damping strength; the exponential decay rate is `dampener / diff_max_mm`.
    pub dampener: f32,
    pub diff_max_mm: u16,
    /// Symmetric clamp for the drive command.
    pub max_drive: u16,
}

impl Default for MotionCfg {
    fn default() -> Self {
        Self {
            min_height_mm: 50,
            max_height_mm: 600,
            setpoint_tolerance_mm: 5,
            floor_margin_mm: 10,
            gain: 8.0,
            dampener: 1.0,
            diff_max_mm: 500,
            max_drive: 1023,
        }
    }
}

impl MotionCfg {
    /// Half-width of the band used by the floor estimator.
    pub fn floor_band_mm(&self) -> u16 {
        self.setpoint_tolerance_mm
            .saturating_add(self.floor_margin_mm)
    }
}

/// Bus addressing and receive limits.
#[derive(Debug, Clone)]
pub struct BusCfg {
    /// Standard identifier used for outgoing status frames.
    pub tx_id: u16,
    /// When set, only standard frames matching `accept_id` under `accept_mask` are processed.
    pub accept_id: Option<u16>,
    pub accept_mask: u16,
    /// Upper bound on frames drained per serviced receive event.
    pub max_rx_per_cycle: usize,
}

impl Default for BusCfg {
    fn default() -> Self {
        Self {
            tx_id: 0x101,
            accept_id: None,
            accept_mask: 0x7FF,
            max_rx_per_cycle: 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TimerCfg {
    pub transmit_interval_ms: u64,
}

impl Default for TimerCfg {
    fn default() -> Self {
        Self {
            transmit_interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SensorCfg {
    /// Time the sensor is kept ranging after a read, via the injected clock.
    pub settle_ms: u64,
}

impl Default for SensorCfg {
    fn default() -> Self {
        Self { settle_ms: 100 }
    }
}
