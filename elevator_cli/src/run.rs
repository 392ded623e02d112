//! Controller assembly against the simulated car, plus the run/self-check/floors commands.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use elevator_core::runner::{self, RunParams, RunSummary};
use elevator_core::{Controller, CurrentFloor, FloorTable, TimerCfg};
use elevator_hardware::SimulatedCar;
use elevator_traits::{Frame, FrameId, MotorDriver};
use eyre::WrapErr;
use serde_json::json;

/// Options of the `run` subcommand.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOpts {
    pub cycles: Option<u64>,
    pub request: Option<u8>,
    pub start_mm: Option<u16>,
    pub stats: bool,
}

/// Pick the motor driver: the MCP4725 DAC on hardware builds, the sim DAC otherwise.
///
/// A DAC that fails to open is logged and replaced by the sim DAC so the
/// loop still runs.
fn make_motor(car: &SimulatedCar, _cfg: &elevator_config::Config) -> Box<dyn MotorDriver> {
    #[cfg(all(feature = "hardware", target_os = "linux"))]
    {
        use elevator_hardware::mcp4725::{DEFAULT_ADDRESS, Mcp4725Dac};
        match Mcp4725Dac::new(1, DEFAULT_ADDRESS, _cfg.motion.max_drive) {
            Ok(dac) => {
                tracing::info!(address = DEFAULT_ADDRESS, "MCP4725 DAC enabled");
                return Box::new(dac);
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to open DAC; continuing with simulated drive");
            }
        }
    }
    Box::new(car.dac())
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| v == "1")
}

/// Build the simulated car and a controller wired to it.
pub fn assemble(
    cfg: &elevator_config::Config,
    start_mm: Option<u16>,
) -> eyre::Result<(SimulatedCar, Controller)> {
    let floors = FloorTable::try_from(cfg).map_err(eyre::Report::new)?;
    let start = start_mm
        .or(cfg.sim.start_mm)
        .unwrap_or(floors.default_entry().setpoint_mm);
    let car = SimulatedCar::new(start, cfg.sim.mm_per_level);
    // Fault injection hooks for tests and demos.
    car.set_sensor_fault(env_flag("ELEVATOR_SIM_SENSOR_FAULT"));
    car.set_send_fault(env_flag("ELEVATOR_SIM_SEND_FAULT"));

    let ctl = Controller::builder()
        .with_sensor(car.sensor())
        .with_motor(make_motor(&car, cfg))
        .with_bus(car.bus())
        .with_display(car.display())
        .with_motion((&cfg.motion).into())
        .with_bus_cfg((&cfg.bus).into())
        .with_sensor_cfg((&cfg.sensor).into())
        .with_floors(floors)
        .build()
        .wrap_err("building controller")?;

    let signals = ctl.signals();
    car.on_bus_pending(move || signals.signal_receive_pending());
    tracing::debug!(start_mm = start, "simulated car ready");
    Ok((car, ctl))
}

fn floor_label(ctl: &Controller, floor: CurrentFloor) -> String {
    floor
        .code()
        .and_then(|c| ctl.table().get(c))
        .map_or_else(|| "unknown".to_string(), |e| e.label.clone())
}

pub fn run_sim(cfg: &elevator_config::Config, opts: RunOpts, json: bool) -> eyre::Result<()> {
    let (car, mut ctl) = assemble(cfg, opts.start_mm)?;

    if let Some(code) = opts.request {
        // Address the request so a configured acceptance filter lets it through.
        let id = cfg.bus.accept_id.unwrap_or(0x100);
        car.inject(Frame::data(FrameId::standard(id), vec![code]));
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&shutdown);
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
            tracing::warn!(error = %e, "failed to install Ctrl-C handler");
        }
    }

    let params = RunParams::new(&TimerCfg::from(&cfg.timer), opts.cycles);
    let summary = runner::run(&mut ctl, &params, &shutdown)?;

    let label = floor_label(&ctl, summary.floor);
    let destination = ctl
        .destination()
        .map(|e| e.label.clone())
        .unwrap_or_default();
    if json {
        println!("{}", summary_json(&summary, &label, &destination, car.position_mm()));
    } else {
        println!("Stopped after {} cycles ({:?})", summary.cycles, summary.stopped_by);
        println!("Current floor: {label} ({})", summary.floor);
        println!("Destination: {destination} ({} mm)", summary.setpoint_mm);
        match summary.last_distance_mm {
            Some(d) => println!("Last distance: {d} mm"),
            None => println!("Last distance: n/a"),
        }
        println!(
            "Status frames: {} sent, {} failed",
            summary.status_sent, summary.status_failed
        );
    }
    if opts.stats {
        print_stats(&summary);
    }
    Ok(())
}

fn summary_json(s: &RunSummary, label: &str, destination: &str, position_mm: f32) -> String {
    json!({
        "cycles": s.cycles,
        "stopped_by": format!("{:?}", s.stopped_by),
        "floor": s.floor.code().map(|c| c.byte()),
        "floor_label": label,
        "destination": destination,
        "setpoint_mm": s.setpoint_mm,
        "last_distance_mm": s.last_distance_mm,
        "position_mm": position_mm,
        "commands_accepted": s.commands_accepted,
        "frames_ignored": s.frames_ignored,
        "status_sent": s.status_sent,
        "status_failed": s.status_failed,
        "sensor_faults": s.sensor_faults,
        "errors": s.errors,
    })
    .to_string()
}

/// Print latency stats to stderr.
fn print_stats(s: &RunSummary) {
    eprintln!("\n--- Elevator Stats ---");
    eprintln!("Cycles: {}", s.cycles);
    match s.latency {
        Some(l) => eprintln!(
            "Cycle latency min/avg/max (us): {} / {} / {}",
            l.min_us, l.mean_us, l.max_us
        ),
        None => eprintln!("Cycle latency: n/a"),
    }
    eprintln!("Floor requests accepted: {}", s.commands_accepted);
    eprintln!("Frames ignored: {}", s.frames_ignored);
    eprintln!("Sensor faults: {}", s.sensor_faults);
    eprintln!("----------------------\n");
}

/// Build the controller, run one cycle, and fail on any collaborator error.
pub fn self_check(cfg: &elevator_config::Config, json: bool) -> eyre::Result<()> {
    let (_car, mut ctl) = assemble(cfg, None)?;
    ctl.begin();
    let report = ctl.run_cycle();
    ctl.stop_motor()?;
    if let Some(e) = report.errors.first() {
        return Err(eyre::Report::new(e.clone()).wrap_err("self-check cycle reported a fault"));
    }
    let distance = report.motion.distance_mm;
    if json {
        println!(
            "{}",
            json!({
                "ok": true,
                "distance_mm": distance,
                "in_range": report.motion.in_range,
                "floor": report.floor.code().map(|c| c.byte()),
            })
        );
    } else {
        match distance {
            Some(d) => println!("self-check ok: distance {d} mm, floor {}", report.floor),
            None => println!("self-check ok"),
        }
    }
    Ok(())
}

pub fn print_floors(cfg: &elevator_config::Config, json: bool) -> eyre::Result<()> {
    let table = FloorTable::try_from(cfg).map_err(eyre::Report::new)?;
    let default = table.default_entry().code;
    if json {
        let rows: Vec<_> = table
            .entries()
            .iter()
            .map(|e| {
                json!({
                    "code": e.code.byte(),
                    "setpoint_mm": e.setpoint_mm,
                    "label": e.label,
                    "default": e.code == default,
                })
            })
            .collect();
        println!("{}", serde_json::Value::Array(rows));
    } else {
        for e in table.entries() {
            let mark = if e.code == default { '*' } else { ' ' };
            println!("{mark} {}  {:>5} mm  {}", e.code, e.setpoint_mm, e.label);
        }
    }
    Ok(())
}
