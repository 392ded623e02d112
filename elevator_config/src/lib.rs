#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and floor-table parsing for the elevator controller.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The floor table may be overridden from a CSV file with strict headers.
use serde::Deserialize;

/// One row of the floor table.
///
/// TOML:
/// [[floors]]
/// code = 0x05
/// setpoint_mm = 100
/// label = "Floor 1"
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct FloorRow {
    pub code: u8,
    pub setpoint_mm: u16,
    pub label: String,
}

#[derive(Debug, Deserialize)]
pub struct Motion {
    /// Readings below this are out of range (drive forced to 0).
    pub min_height_mm: u16,
    /// Readings above this are out of range (drive forced to 0).
    pub max_height_mm: u16,
    /// Dead-band around the setpoint.
    pub setpoint_tolerance_mm: u16,
    /// Extra band on top of the tolerance when deciding which floor the car is at.
    #[serde(default = "default_floor_margin_mm")]
    pub floor_margin_mm: u16,
    /// Drive gain `A` in `d * A * exp(-a * |d|)`.
    pub gain: f32,
    /// Numerator of the decay rate `a = dampener / diff_max_mm`.
    pub dampener: f32,
    /// Denominator of the decay rate.
    pub diff_max_mm: u16,
    /// Largest drive magnitude the DAC accepts.
    #[serde(default = "default_max_drive")]
    pub max_drive: u16,
    /// Floor code the car targets at power-up (defaults to the first floor).
    #[serde(default)]
    pub default_floor: Option<u8>,
}

fn default_floor_margin_mm() -> u16 {
    10
}

fn default_max_drive() -> u16 {
    1023
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Bus {
    /// Identifier used for floor-status frames.
    pub tx_id: u16,
    /// Accept only standard ids matching `accept_id` under `accept_mask`.
    pub accept_id: Option<u16>,
    pub accept_mask: Option<u16>,
    /// Informational; the transport owns bit timing.
    pub bitrate_kbps: u32,
    /// Upper bound on frames drained per serviced receive event.
    pub max_rx_per_cycle: usize,
}

impl Default for Bus {
    fn default() -> Self {
        Self {
            tx_id: 0x101,
            accept_id: None,
            accept_mask: None,
            bitrate_kbps: 125,
            max_rx_per_cycle: 4,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Timer {
    /// Floor-status broadcast period.
    pub transmit_interval_ms: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self {
            transmit_interval_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Sensor {
    /// Settling delay inside each ranging session.
    pub settle_ms: u64,
}

impl Default for Sensor {
    fn default() -> Self {
        Self { settle_ms: 100 }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Sim {
    /// Initial car height; defaults to the default floor's setpoint.
    pub start_mm: Option<u16>,
    /// Car travel per cycle for each unit of drive level.
    pub mm_per_level: f32,
}

impl Default for Sim {
    fn default() -> Self {
        Self {
            start_mm: None,
            mm_per_level: 0.02,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub motion: Motion,
    pub floors: Vec<FloorRow>,
    #[serde(default)]
    pub bus: Bus,
    #[serde(default)]
    pub timer: Timer,
    #[serde(default)]
    pub sensor: Sensor,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub sim: Sim,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Parse a floor code written either as decimal (`6`) or hex (`0x06`).
pub fn parse_floor_code(s: &str) -> eyre::Result<u8> {
    let t = s.trim();
    let parsed = match t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => t.parse::<u8>(),
    };
    parsed.map_err(|e| eyre::eyre!("invalid floor code {t:?}: {e}"))
}

#[derive(Debug, Deserialize)]
struct FloorCsvRow {
    code: String,
    setpoint_mm: u16,
    label: String,
}

/// Load a floor table from CSV.
///
/// Expected headers:
/// code,setpoint_mm,label
///
/// Example:
/// code,setpoint_mm,label
/// 0x05,100,Floor 1
/// 0x06,300,Floor 2
pub fn load_floors_csv(path: &std::path::Path) -> eyre::Result<Vec<FloorRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open floors CSV {:?}: {}", path, e))?;

    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["code", "setpoint_mm", "label"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "floors CSV must have headers 'code,setpoint_mm,label', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<FloorCsvRow>().enumerate() {
        let row = rec.map_err(|e| eyre::eyre!("invalid CSV row {}: {}", idx + 2, e))?;
        rows.push(FloorRow {
            code: parse_floor_code(&row.code)?,
            setpoint_mm: row.setpoint_mm,
            label: row.label,
        });
    }
    if rows.is_empty() {
        eyre::bail!("floors CSV {:?} contains no floors", path);
    }
    Ok(rows)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Motion
        let m = &self.motion;
        if m.min_height_mm >= m.max_height_mm {
            eyre::bail!("motion.min_height_mm must be < motion.max_height_mm");
        }
        if !m.gain.is_finite() || m.gain <= 0.0 {
            eyre::bail!("motion.gain must be finite and > 0");
        }
        if !m.dampener.is_finite() || m.dampener < 0.0 {
            eyre::bail!("motion.dampener must be finite and >= 0");
        }
        if m.diff_max_mm == 0 {
            eyre::bail!("motion.diff_max_mm must be >= 1");
        }
        if m.max_drive == 0 || m.max_drive > i16::MAX as u16 {
            eyre::bail!("motion.max_drive must be in [1, 32767]");
        }

        // Floors
        validate_floors(
            &self.floors,
            m.min_height_mm,
            m.max_height_mm,
            m.default_floor,
        )?;

        // Bus
        if self.bus.tx_id > 0x7FF {
            eyre::bail!("bus.tx_id must fit in 11 bits (<= 0x7FF)");
        }
        if let Some(id) = self.bus.accept_id
            && id > 0x7FF
        {
            eyre::bail!("bus.accept_id must fit in 11 bits (<= 0x7FF)");
        }
        if self.bus.accept_mask.is_some() && self.bus.accept_id.is_none() {
            eyre::bail!("bus.accept_mask requires bus.accept_id");
        }
        if self.bus.max_rx_per_cycle == 0 {
            eyre::bail!("bus.max_rx_per_cycle must be >= 1");
        }

        // Timer
        if self.timer.transmit_interval_ms == 0 {
            eyre::bail!("timer.transmit_interval_ms must be >= 1");
        }
        if self.timer.transmit_interval_ms > 60 * 60 * 1000 {
            eyre::bail!("timer.transmit_interval_ms is unreasonably large (>1h)");
        }

        // Sensor
        if self.sensor.settle_ms > 10_000 {
            eyre::bail!("sensor.settle_ms is unreasonably large (>10s)");
        }

        // Sim
        if !self.sim.mm_per_level.is_finite() || self.sim.mm_per_level < 0.0 {
            eyre::bail!("sim.mm_per_level must be finite and >= 0");
        }

        Ok(())
    }
}

/// Check a floor table against the valid measurement band.
pub fn validate_floors(
    floors: &[FloorRow],
    min_height_mm: u16,
    max_height_mm: u16,
    default_floor: Option<u8>,
) -> eyre::Result<()> {
    if floors.is_empty() {
        eyre::bail!("floors must contain at least one entry");
    }
    for (i, f) in floors.iter().enumerate() {
        if f.code == 0 {
            eyre::bail!("floors[{i}].code must be non-zero (0x00 means unknown floor)");
        }
        if f.label.trim().is_empty() {
            eyre::bail!("floors[{i}].label must not be empty");
        }
        if !(min_height_mm..=max_height_mm).contains(&f.setpoint_mm) {
            eyre::bail!(
                "floors[{i}].setpoint_mm {} is outside [{min_height_mm}, {max_height_mm}]",
                f.setpoint_mm
            );
        }
        if floors[..i].iter().any(|p| p.code == f.code) {
            eyre::bail!("floors[{i}].code 0x{:02X} is duplicated", f.code);
        }
    }
    if let Some(code) = default_floor
        && !floors.iter().any(|f| f.code == code)
    {
        eyre::bail!("motion.default_floor 0x{code:02X} is not in the floor table");
    }
    Ok(())
}
