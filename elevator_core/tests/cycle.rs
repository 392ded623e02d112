use std::cell::RefCell;
use std::collections::VecDeque;
use std::error::Error;
use std::rc::Rc;
use std::time::Duration;

use elevator_core::floor::{FLOOR1, FLOOR1_SP, FLOOR2, FLOOR2_SP, FLOOR3, FLOOR3_SP};
use elevator_core::{
    BusCfg, CurrentFloor, ElevatorController, ElevatorError, FloorTable, MotionCfg, SensorCfg,
    build_controller,
};
use elevator_traits::{
    BusTransport, Display, DistanceSensor, Frame, FrameId, ManualClock, MotorDriver,
};
use rstest::rstest;

#[derive(Default)]
struct Log {
    events: Vec<&'static str>,
    starts: u32,
    stops: u32,
    drives: Vec<i16>,
    labels: Vec<String>,
    distances: Vec<u16>,
    sent: Vec<Frame>,
}

type Shared = Rc<RefCell<Log>>;

/// Sensor replaying a script; the last reading repeats once the script runs out.
struct SeqSensor {
    log: Shared,
    script: VecDeque<Result<u16, &'static str>>,
    last: u16,
}

impl DistanceSensor for SeqSensor {
    fn start(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut log = self.log.borrow_mut();
        log.starts += 1;
        log.events.push("start");
        Ok(())
    }
    fn stop(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut log = self.log.borrow_mut();
        log.stops += 1;
        log.events.push("stop");
        Ok(())
    }
    fn distance(&mut self) -> Result<u16, Box<dyn Error + Send + Sync>> {
        match self.script.pop_front() {
            Some(Ok(mm)) => {
                self.last = mm;
                Ok(mm)
            }
            Some(Err(msg)) => Err(msg.into()),
            None => Ok(self.last),
        }
    }
}

struct SpyMotor(Shared);
impl MotorDriver for SpyMotor {
    fn set_drive_level(&mut self, level: i16) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.0.borrow_mut().drives.push(level);
        Ok(())
    }
}

struct SpyDisplay(Shared);
impl Display for SpyDisplay {
    fn show_floor_label(&mut self, label: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.0.borrow_mut().labels.push(label.to_string());
        Ok(())
    }
    fn show_distance(&mut self, mm: u16) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.0.borrow_mut().distances.push(mm);
        Ok(())
    }
}

#[derive(Default)]
struct BusState {
    inbox: VecDeque<Frame>,
    fail_send: bool,
    fail_receive: bool,
}

struct QueueBus {
    log: Shared,
    state: Rc<RefCell<BusState>>,
}

impl BusTransport for QueueBus {
    fn send(&mut self, frame: &Frame) -> Result<(), Box<dyn Error + Send + Sync>> {
        if self.state.borrow().fail_send {
            return Err("transmit buffer full".into());
        }
        self.log.borrow_mut().sent.push(frame.clone());
        Ok(())
    }
    fn receive(&mut self) -> Result<Option<Frame>, Box<dyn Error + Send + Sync>> {
        self.log.borrow_mut().events.push("receive");
        let mut st = self.state.borrow_mut();
        if st.fail_receive {
            return Err("rx overflow".into());
        }
        Ok(st.inbox.pop_front())
    }
}

struct Rig {
    log: Shared,
    bus: Rc<RefCell<BusState>>,
    clock: ManualClock,
    ctl: ElevatorController<SeqSensor, SpyMotor, SpyDisplay, QueueBus>,
}

impl Rig {
    fn push(&self, frame: Frame) {
        self.bus.borrow_mut().inbox.push_back(frame);
        self.ctl.signals().signal_receive_pending();
    }
    fn request(&self, payload: u8) {
        self.push(Frame::data(FrameId::standard(0x100), vec![payload]));
    }
}

fn rig_with(
    script: &[Result<u16, &'static str>],
    bus_cfg: BusCfg,
    sensor_cfg: SensorCfg,
    floors: FloorTable,
) -> Rig {
    let log: Shared = Rc::default();
    let bus = Rc::new(RefCell::new(BusState::default()));
    let clock = ManualClock::new();
    let mut ctl = build_controller(
        SeqSensor {
            log: log.clone(),
            script: script.iter().copied().collect(),
            last: 0,
        },
        SpyMotor(log.clone()),
        SpyDisplay(log.clone()),
        QueueBus {
            log: log.clone(),
            state: bus.clone(),
        },
        MotionCfg::default(),
        bus_cfg,
        sensor_cfg,
        floors,
        Some(Box::new(clock.clone())),
    )
    .expect("build controller");
    ctl.begin();
    Rig {
        log,
        bus,
        clock,
        ctl,
    }
}

fn rig(script: &[Result<u16, &'static str>]) -> Rig {
    rig_with(
        script,
        BusCfg::default(),
        SensorCfg { settle_ms: 0 },
        FloorTable::default(),
    )
}

#[rstest]
fn begin_shows_default_floor_label() {
    let r = rig(&[Ok(FLOOR1_SP)]);
    assert_eq!(r.log.borrow().labels, vec!["Floor 1".to_string()]);
    assert_eq!(r.ctl.setpoint_mm(), FLOOR1_SP);
    assert_eq!(r.ctl.current_floor(), CurrentFloor::Unknown);
}

#[rstest]
fn at_floor_one_setpoint_drives_zero_and_reports_floor_one() {
    let mut r = rig(&[Ok(FLOOR1_SP)]);
    let report = r.ctl.run_cycle();
    assert_eq!(report.motion.drive, 0);
    assert_eq!(report.floor, CurrentFloor::At(FLOOR1));
    assert_eq!(r.log.borrow().drives, vec![0]);
    assert_eq!(r.log.borrow().distances, vec![FLOOR1_SP]);
    assert!(report.is_clean());
}

#[rstest]
fn floor_two_request_moves_setpoint_label_and_drive_reference() {
    let mut r = rig(&[Ok(FLOOR1_SP), Ok(FLOOR2_SP)]);
    r.request(FLOOR2.byte());

    let report = r.ctl.run_cycle();
    assert_eq!(report.events.accepted, vec![FLOOR2]);
    assert_eq!(r.ctl.setpoint_mm(), FLOOR2_SP);
    assert_eq!(r.log.borrow().labels.last().map(String::as_str), Some("Floor 2"));
    // Car 200 mm below the new target: drive saturates upward.
    assert_eq!(report.motion.drive, 1023);
    assert_eq!(report.floor, CurrentFloor::At(FLOOR1));

    let report = r.ctl.run_cycle();
    assert_eq!(report.motion.drive, 0);
    assert_eq!(report.floor, CurrentFloor::At(FLOOR2));
}

#[rstest]
fn unknown_code_changes_nothing() {
    let mut r = rig(&[Ok(FLOOR1_SP)]);
    r.ctl.run_cycle();
    r.request(0xFF);

    let report = r.ctl.run_cycle();
    assert!(report.events.accepted.is_empty());
    assert_eq!(report.events.ignored, 1);
    assert_eq!(r.ctl.setpoint_mm(), FLOOR1_SP);
    assert_eq!(r.log.borrow().labels, vec!["Floor 1".to_string()]);
    assert_eq!(r.ctl.current_floor(), CurrentFloor::At(FLOOR1));
    assert_eq!(r.ctl.apply_command(0xFF), None);
}

#[rstest]
#[case::below_min(49)]
#[case::above_max(601)]
fn out_of_range_reading_forces_zero_drive(#[case] mm: u16) {
    let mut r = rig(&[Ok(mm)]);
    let report = r.ctl.run_cycle();
    assert_eq!(report.motion.drive, 0);
    assert!(!report.motion.in_range);
    assert_eq!(report.floor, CurrentFloor::Unknown);
    assert!(r.log.borrow().distances.is_empty());
    assert_eq!(r.ctl.last_distance_mm(), None);
}

#[rstest]
fn large_positive_difference_drives_full_down() {
    let mut r = rig(&[Ok(600)]);
    let report = r.ctl.run_cycle();
    assert_eq!(report.motion.drive, -1023);
}

#[rstest]
fn failed_read_still_stops_sensor_and_keeps_floor() {
    let mut r = rig(&[Ok(FLOOR1_SP), Err("i2c nak")]);
    r.ctl.run_cycle();
    let report = r.ctl.run_cycle();

    assert_eq!(report.motion.drive, 0);
    assert_eq!(report.motion.distance_mm, None);
    assert_eq!(
        report.motion.error,
        Some(ElevatorError::Sensor("i2c nak".into()))
    );
    assert_eq!(report.floor, CurrentFloor::At(FLOOR1));
    let log = r.log.borrow();
    assert_eq!(log.starts, 2);
    assert_eq!(log.stops, 2);
    assert_eq!(log.drives, vec![0, 0]);
}

#[rstest]
fn timeout_read_maps_to_timeout() {
    let mut r = rig(&[Err("ranging timeout")]);
    let report = r.ctl.run_cycle();
    assert_eq!(report.errors, vec![ElevatorError::Timeout]);
}

#[rstest]
fn receive_is_serviced_before_motion() {
    let mut r = rig(&[Ok(FLOOR1_SP)]);
    r.request(FLOOR3.byte());
    r.ctl.run_cycle();
    let log = r.log.borrow();
    let rx = log.events.iter().position(|e| *e == "receive").unwrap();
    let start = log.events.iter().position(|e| *e == "start").unwrap();
    assert!(rx < start);
    assert_eq!(r.ctl.setpoint_mm(), FLOOR3_SP);
}

#[rstest]
fn transmit_flag_is_consumed_once() {
    let mut r = rig(&[Ok(FLOOR1_SP)]);
    r.ctl.signals().signal_transmit_pending();
    r.ctl.signals().signal_transmit_pending();
    r.ctl.run_cycle();
    r.ctl.run_cycle();
    assert_eq!(r.log.borrow().sent.len(), 1);
}

#[rstest]
fn status_carries_current_floor_byte() {
    let mut r = rig(&[Ok(FLOOR1_SP)]);
    r.ctl.signals().signal_transmit_pending();
    let first = r.ctl.run_cycle();
    // Transmit runs before estimation, so the first status is "unknown".
    assert_eq!(first.events.transmitted, Some(0x00));

    r.ctl.signals().signal_transmit_pending();
    let second = r.ctl.run_cycle();
    assert_eq!(second.events.transmitted, Some(FLOOR1.byte()));

    let log = r.log.borrow();
    assert!(log.sent.iter().all(|f| f.id == FrameId::standard(0x101)));
    assert_eq!(log.sent[1].payload(), Some(&[0x05][..]));
}

#[rstest]
fn remote_frame_does_not_change_setpoint() {
    let mut r = rig(&[Ok(FLOOR1_SP)]);
    r.push(Frame::remote(FrameId::standard(0x100), 1));
    let report = r.ctl.run_cycle();
    assert_eq!(report.events.frames_received, 1);
    assert_eq!(report.events.ignored, 1);
    assert_eq!(r.ctl.setpoint_mm(), FLOOR1_SP);
}

#[rstest]
fn empty_frame_is_ignored() {
    let mut r = rig(&[Ok(FLOOR1_SP)]);
    r.push(Frame::data(FrameId::standard(0x100), Vec::new()));
    let report = r.ctl.run_cycle();
    assert_eq!(report.events.ignored, 1);
    assert_eq!(r.ctl.setpoint_mm(), FLOOR1_SP);
}

#[rstest]
fn send_failure_is_reported_and_cycle_continues() {
    let mut r = rig(&[Ok(FLOOR2_SP)]);
    r.bus.borrow_mut().fail_send = true;
    r.ctl.signals().signal_transmit_pending();

    let report = r.ctl.run_cycle();
    assert!(report.events.transmit_failed);
    assert_eq!(report.events.transmitted, None);
    assert!(matches!(report.errors.as_slice(), [ElevatorError::Bus(_)]));
    assert_eq!(r.log.borrow().drives.len(), 1);
    assert_eq!(report.floor, CurrentFloor::At(FLOOR2));
}

#[rstest]
fn receive_failure_is_reported_and_cycle_continues() {
    let mut r = rig(&[Ok(FLOOR1_SP)]);
    r.bus.borrow_mut().fail_receive = true;
    r.ctl.signals().signal_receive_pending();
    let report = r.ctl.run_cycle();
    assert_eq!(report.errors, vec![ElevatorError::Bus("rx overflow".into())]);
    assert_eq!(report.floor, CurrentFloor::At(FLOOR1));
}

#[rstest]
fn drain_is_bounded_per_cycle_and_resumes_next_cycle() {
    let mut r = rig(&[Ok(FLOOR1_SP)]);
    for code in [0x06, 0x07, 0x06, 0x07, 0x06, 0x05] {
        r.request(code);
    }
    let first = r.ctl.run_cycle();
    assert_eq!(first.events.frames_received, 4);
    assert_eq!(r.ctl.setpoint_mm(), FLOOR3_SP);

    let second = r.ctl.run_cycle();
    assert_eq!(second.events.frames_received, 2);
    assert_eq!(r.ctl.setpoint_mm(), FLOOR1_SP);

    let third = r.ctl.run_cycle();
    assert_eq!(third.events.frames_received, 0);
}

#[rstest]
#[case::matching_id(0x100, true)]
#[case::other_id(0x200, false)]
fn acceptance_filter_drops_foreign_ids(#[case] id: u16, #[case] accepted: bool) {
    let bus_cfg = BusCfg {
        accept_id: Some(0x100),
        ..BusCfg::default()
    };
    let mut r = rig_with(
        &[Ok(FLOOR1_SP)],
        bus_cfg,
        SensorCfg { settle_ms: 0 },
        FloorTable::default(),
    );
    r.push(Frame::data(FrameId::standard(id), vec![FLOOR2.byte()]));
    r.ctl.run_cycle();
    let expected = if accepted { FLOOR2_SP } else { FLOOR1_SP };
    assert_eq!(r.ctl.setpoint_mm(), expected);
}

#[rstest]
fn settle_time_uses_injected_clock() {
    let mut r = rig_with(
        &[Ok(FLOOR1_SP)],
        BusCfg::default(),
        SensorCfg { settle_ms: 100 },
        FloorTable::default(),
    );
    r.ctl.run_cycle();
    r.ctl.run_cycle();
    assert_eq!(r.clock.elapsed(), Duration::from_millis(200));
}

#[rstest]
fn configured_default_floor_sets_initial_setpoint() {
    let floors = FloorTable::default().with_default(FLOOR3).unwrap();
    let r = rig_with(
        &[Ok(FLOOR3_SP)],
        BusCfg::default(),
        SensorCfg { settle_ms: 0 },
        floors,
    );
    assert_eq!(r.ctl.setpoint_mm(), FLOOR3_SP);
    assert_eq!(r.log.borrow().labels, vec!["Floor 3".to_string()]);
}

#[rstest]
fn stop_motor_commands_zero() {
    let mut r = rig(&[Ok(600)]);
    r.ctl.run_cycle();
    r.ctl.stop_motor().unwrap();
    assert_eq!(r.log.borrow().drives, vec![-1023, 0]);
    assert_eq!(r.ctl.last_drive(), 0);
}
