use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use elevator_traits::{BusTransport, Display, DistanceSensor, MotorDriver};
use eyre::WrapErr;

use crate::config::TimerCfg;
use crate::controller::ElevatorController;
use crate::error::{ElevatorError, Result};
use crate::floor::CurrentFloor;
use crate::status::CycleReport;
use crate::ticker::Ticker;

/// How long to run and how often to broadcast status.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub transmit_interval: Duration,
    /// Stop after this many cycles; `None` runs until shutdown.
    pub max_cycles: Option<u64>,
}

impl RunParams {
    pub fn new(timer: &TimerCfg, max_cycles: Option<u64>) -> Self {
        Self {
            transmit_interval: Duration::from_millis(timer.transmit_interval_ms),
            max_cycles,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopReason {
    #[default]
    CycleLimit,
    Shutdown,
}

/// Wall-clock cost of a control cycle, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleLatency {
    pub min_us: u64,
    pub max_us: u64,
    pub mean_us: u64,
}

/// Totals gathered over a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub stopped_by: StopReason,
    pub floor: CurrentFloor,
    pub setpoint_mm: u16,
    pub last_distance_mm: Option<u16>,
    pub commands_accepted: u64,
    pub frames_ignored: u64,
    pub status_sent: u64,
    pub status_failed: u64,
    pub sensor_faults: u64,
    pub errors: u64,
    pub latency: Option<CycleLatency>,
}

#[derive(Default)]
struct Tally {
    summary: RunSummary,
    min_us: Option<u64>,
    max_us: u64,
    total_us: u128,
}

impl Tally {
    fn record(&mut self, report: &CycleReport, elapsed: Duration) {
        let s = &mut self.summary;
        s.cycles = report.cycle;
        s.commands_accepted += report.events.accepted.len() as u64;
        s.frames_ignored += report.events.ignored as u64;
        s.status_sent += u64::from(report.events.transmitted.is_some());
        s.status_failed += u64::from(report.events.transmit_failed);
        s.sensor_faults += u64::from(matches!(
            report.motion.error,
            Some(ElevatorError::Sensor(_) | ElevatorError::Timeout)
        ));
        s.errors += report.errors.len() as u64;

        let us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.min_us = Some(self.min_us.map_or(us, |m| m.min(us)));
        self.max_us = self.max_us.max(us);
        self.total_us += u128::from(us);
    }

    fn finish(mut self, stopped_by: StopReason) -> RunSummary {
        let n = self.summary.cycles;
        if let Some(min_us) = self.min_us
            && n > 0
        {
            self.summary.latency = Some(CycleLatency {
                min_us,
                max_us: self.max_us,
                mean_us: u64::try_from(self.total_us / u128::from(n)).unwrap_or(u64::MAX),
            });
        }
        self.summary.stopped_by = stopped_by;
        self.summary
    }
}

/// Run the control loop until `shutdown` is set or the cycle limit is reached.
pub fn run<S, M, D, B>(
    controller: &mut ElevatorController<S, M, D, B>,
    params: &RunParams,
    shutdown: &AtomicBool,
) -> Result<RunSummary>
where
    S: DistanceSensor,
    M: MotorDriver,
    D: Display,
    B: BusTransport,
{
    run_with(controller, params, shutdown, |_| {})
}

/// Like `run`, calling `observe` after every cycle.
pub fn run_with<S, M, D, B, F>(
    controller: &mut ElevatorController<S, M, D, B>,
    params: &RunParams,
    shutdown: &AtomicBool,
    mut observe: F,
) -> Result<RunSummary>
where
    S: DistanceSensor,
    M: MotorDriver,
    D: Display,
    B: BusTransport,
    F: FnMut(&CycleReport),
{
    controller.begin();
    let ticker = Ticker::spawn(params.transmit_interval, controller.signals());
    tracing::info!(
        transmit_interval_ms = params.transmit_interval.as_millis() as u64,
        max_cycles = ?params.max_cycles,
        "control loop start"
    );

    let mut tally = Tally::default();
    let stopped_by = loop {
        if shutdown.load(Ordering::Relaxed) {
            break StopReason::Shutdown;
        }
        if params.max_cycles.is_some_and(|max| controller.cycles() >= max) {
            break StopReason::CycleLimit;
        }
        let t0 = Instant::now();
        let report = controller.run_cycle();
        tally.record(&report, t0.elapsed());
        if !report.is_clean() {
            tracing::debug!(
                cycle = report.cycle,
                errors = report.errors.len(),
                "cycle finished with errors"
            );
        }
        observe(&report);
    };
    drop(ticker);

    let mut summary = tally.finish(stopped_by);
    summary.floor = controller.current_floor();
    summary.setpoint_mm = controller.setpoint_mm();
    summary.last_distance_mm = controller.last_distance_mm();
    tracing::info!(
        cycles = summary.cycles,
        floor = %summary.floor,
        setpoint_mm = summary.setpoint_mm,
        reason = ?summary.stopped_by,
        "control loop stopped"
    );

    controller.stop_motor().wrap_err("leaving the control loop")?;
    Ok(summary)
}
