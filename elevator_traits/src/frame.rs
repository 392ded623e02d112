//! CAN frame envelope shared by the controller and bus transports.

use std::fmt;

/// Packed-id flag marking a 29-bit identifier (MCP2515 driver convention).
pub const RAW_EXTENDED_FLAG: u32 = 0x8000_0000;
/// Packed-id flag marking a remote request frame.
pub const RAW_REMOTE_FLAG: u32 = 0x4000_0000;

const STANDARD_ID_MASK: u32 = 0x7FF;
const EXTENDED_ID_MASK: u32 = 0x1FFF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameId {
    /// 11-bit identifier.
    Standard(u16),
    /// 29-bit identifier.
    Extended(u32),
}

impl FrameId {
    /// Build a standard id, masking to 11 bits.
    pub fn standard(id: u16) -> Self {
        FrameId::Standard(id & STANDARD_ID_MASK as u16)
    }

    /// Build an extended id, masking to 29 bits.
    pub fn extended(id: u32) -> Self {
        FrameId::Extended(id & EXTENDED_ID_MASK)
    }

    pub fn value(self) -> u32 {
        match self {
            FrameId::Standard(id) => u32::from(id),
            FrameId::Extended(id) => id,
        }
    }

    pub fn is_extended(self) -> bool {
        matches!(self, FrameId::Extended(_))
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameId::Standard(id) => write!(f, "Standard ID: 0x{id:03X}"),
            FrameId::Extended(id) => write!(f, "Extended ID: 0x{id:08X}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameKind {
    Data(Vec<u8>),
    /// Remote request: asks for data, carries only a length code.
    Remote { dlc: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub id: FrameId,
    pub kind: FrameKind,
}

impl Frame {
    pub fn data(id: FrameId, payload: impl Into<Vec<u8>>) -> Self {
        let mut payload = payload.into();
        payload.truncate(8);
        Self {
            id,
            kind: FrameKind::Data(payload),
        }
    }

    pub fn remote(id: FrameId, dlc: u8) -> Self {
        Self {
            id,
            kind: FrameKind::Remote { dlc: dlc.min(8) },
        }
    }

    /// Decode a frame from a packed driver id and its data bytes.
    ///
    /// Bit 31 selects the extended format and bit 30 marks a remote request;
    /// the remaining bits hold the identifier.
    pub fn from_raw(raw_id: u32, data: &[u8]) -> Self {
        let id = if raw_id & RAW_EXTENDED_FLAG != 0 {
            FrameId::extended(raw_id)
        } else {
            FrameId::standard((raw_id & STANDARD_ID_MASK) as u16)
        };
        if raw_id & RAW_REMOTE_FLAG != 0 {
            Frame::remote(id, data.len() as u8)
        } else {
            Frame::data(id, data)
        }
    }

    /// Data bytes, or `None` for a remote request.
    pub fn payload(&self) -> Option<&[u8]> {
        match &self.kind {
            FrameKind::Data(bytes) => Some(bytes),
            FrameKind::Remote { .. } => None,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.kind, FrameKind::Remote { .. })
    }

    pub fn dlc(&self) -> u8 {
        match &self.kind {
            FrameKind::Data(bytes) => bytes.len() as u8,
            FrameKind::Remote { dlc } => *dlc,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} DLC: {} Data:", self.id, self.dlc())?;
        match &self.kind {
            FrameKind::Remote { .. } => write!(f, " REMOTE REQUEST FRAME"),
            FrameKind::Data(bytes) => {
                for b in bytes {
                    write!(f, " 0x{b:02X}")?;
                }
                Ok(())
            }
        }
    }
}
