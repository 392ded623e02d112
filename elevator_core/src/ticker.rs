//! Periodic transmit timer.
//!
//! Spawns one thread that raises the transmit-pending signal on every tick of
//! a crossbeam `tick` channel. The thread is stopped and joined on drop.

use crossbeam_channel as xch;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::flags::EventSignals;

pub struct Ticker {
    /// Dropping the sender disconnects the stop channel and ends the thread.
    stop_tx: Option<xch::Sender<()>>,
    ticks: Arc<AtomicU64>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl Ticker {
    pub fn spawn(interval: Duration, signals: EventSignals) -> Self {
        let (stop_tx, stop_rx) = xch::bounded::<()>(0);
        let ticks = Arc::new(AtomicU64::new(0));
        let ticks_clone = Arc::clone(&ticks);
        let period = interval.max(Duration::from_millis(1));

        let join_handle = std::thread::spawn(move || {
            let tick = xch::tick(period);
            loop {
                xch::select! {
                    recv(tick) -> _ => {
                        signals.signal_transmit_pending();
                        ticks_clone.fetch_add(1, Ordering::Relaxed);
                    }
                    recv(stop_rx) -> _ => break,
                }
            }
            tracing::trace!("ticker thread exiting cleanly");
        });

        Self {
            stop_tx: Some(stop_tx),
            ticks,
            join_handle: Some(join_handle),
        }
    }

    /// Number of transmit ticks raised so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        drop(self.stop_tx.take());
        if let Some(handle) = self.join_handle.take()
            && let Err(e) = handle.join()
        {
            tracing::warn!(?e, "ticker thread panicked during shutdown");
        }
    }
}
