//! Event flags raised from other threads and consumed by the control cycle.
//!
//! Each flag is a single `AtomicBool`: raising is idempotent and `take()`
//! observes-and-clears in one step, so an event raised while the cycle is
//! servicing the previous one is not lost.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct StickyFlag(AtomicBool);

impl StickyFlag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Clear the flag and report whether it was set.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// The two pending-event flags owned by a controller.
#[derive(Debug, Default)]
pub struct EventFlags {
    pub receive: StickyFlag,
    pub transmit: StickyFlag,
}

/// Cloneable handle for raising controller events from interrupt-like contexts.
#[derive(Debug, Clone, Default)]
pub struct EventSignals {
    flags: Arc<EventFlags>,
}

impl EventSignals {
    pub(crate) fn from_flags(flags: Arc<EventFlags>) -> Self {
        Self { flags }
    }

    /// A frame is waiting in the bus receive path.
    pub fn signal_receive_pending(&self) {
        self.flags.receive.raise();
    }

    /// The periodic status transmit is due.
    pub fn signal_transmit_pending(&self) {
        self.flags.transmit.raise();
    }

    pub fn receive_pending(&self) -> bool {
        self.flags.receive.is_raised()
    }

    pub fn transmit_pending(&self) -> bool {
        self.flags.transmit.is_raised()
    }
}
