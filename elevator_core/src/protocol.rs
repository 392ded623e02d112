//! Floor command protocol: classifying received frames and building status frames.

use elevator_traits::{Frame, FrameId, FrameKind};

use crate::floor::{CurrentFloor, FloorEntry, FloorTable};

/// Standard-ID acceptance filter, mirroring a CAN controller mask/filter pair.
///
/// A frame is accepted when `id & mask == filter & mask`. Extended frames are
/// rejected because the controller runs in standard-ID mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptanceFilter {
    pub id: u16,
    pub mask: u16,
}

impl AcceptanceFilter {
    pub fn accepts(&self, id: FrameId) -> bool {
        match id {
            FrameId::Standard(v) => v & self.mask == self.id & self.mask,
            FrameId::Extended(_) => false,
        }
    }
}

/// What a received frame means to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'t> {
    /// Known floor request.
    GoTo(&'t FloorEntry),
    /// Data frame whose first byte is not in the floor table.
    Unknown(u8),
    /// Remote transmission request; carries no payload.
    RemoteRequest,
    /// Data frame with no bytes.
    Empty,
    /// Dropped by the acceptance filter.
    Filtered,
}

/// Interpret one frame against the floor table.
pub fn classify<'t>(
    table: &'t FloorTable,
    filter: Option<&AcceptanceFilter>,
    frame: &Frame,
) -> Command<'t> {
    if let Some(f) = filter
        && !f.accepts(frame.id)
    {
        return Command::Filtered;
    }
    match &frame.kind {
        FrameKind::Remote { .. } => Command::RemoteRequest,
        FrameKind::Data(bytes) => match bytes.first() {
            None => Command::Empty,
            Some(&b) => table.interpret(b).map_or(Command::Unknown(b), Command::GoTo),
        },
    }
}

/// One-byte status frame carrying the current floor code.
pub fn status_frame(tx_id: u16, floor: CurrentFloor) -> Frame {
    Frame::data(FrameId::standard(tx_id), vec![floor.wire_byte()])
}
