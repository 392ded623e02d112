//! MCP4725 12-bit DAC driving the motor controller's analog speed input.
//!
//! The drive level is bipolar: mid-scale is stop, the upper half raises the
//! car and the lower half lowers it.
use rppal::i2c::I2c;
use tracing::trace;

use crate::error::{HwError, Result};

pub const DEFAULT_ADDRESS: u16 = 0x62;
const MID_SCALE: i32 = 2048;
const FULL_SCALE: i32 = 4095;

pub struct Mcp4725Dac {
    i2c: I2c,
    max_drive: u16,
}

impl Mcp4725Dac {
    pub fn new(bus: u8, address: u16, max_drive: u16) -> Result<Self> {
        let mut i2c = I2c::with_bus(bus).map_err(|e| HwError::I2c(e.to_string()))?;
        i2c.set_slave_address(address)
            .map_err(|e| HwError::I2c(e.to_string()))?;
        Ok(Self {
            i2c,
            max_drive: max_drive.max(1),
        })
    }

    fn write_code(&mut self, code: u16) -> Result<()> {
        // Fast-mode write: upper nibble of the first byte is the command (0b00).
        let bytes = [((code >> 8) & 0x0F) as u8, (code & 0xFF) as u8];
        self.i2c
            .write(&bytes)
            .map_err(|e| HwError::I2c(e.to_string()))?;
        trace!(code, "mcp4725 write");
        Ok(())
    }
}

/// Map a signed drive level onto the 12-bit output range.
pub fn code_for_level(level: i16, max_drive: u16) -> u16 {
    let max = i32::from(max_drive.max(1));
    let level = i32::from(level).clamp(-max, max);
    let span = FULL_SCALE - MID_SCALE;
    (MID_SCALE + level * span / max).clamp(0, FULL_SCALE) as u16
}

impl elevator_traits::MotorDriver for Mcp4725Dac {
    fn set_drive_level(
        &mut self,
        level: i16,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let code = code_for_level(level, self.max_drive);
        self.write_code(code)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::code_for_level;

    #[test]
    fn stop_is_mid_scale_and_extremes_hit_rails() {
        assert_eq!(code_for_level(0, 1023), 2048);
        assert_eq!(code_for_level(1023, 1023), 4095);
        assert_eq!(code_for_level(-1023, 1023), 1);
        assert_eq!(code_for_level(i16::MAX, 1023), 4095);
    }
}
