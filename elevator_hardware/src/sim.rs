//! Simulated elevator car.
//!
//! A single `SimulatedCar` owns the shared physical state; the sensor, DAC,
//! display and bus handles it hands out all observe the same car. Each drive
//! command moves the car by `level * mm_per_level` millimetres.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use elevator_traits::{BusTransport, DistanceSensor, Display, Frame, MotorDriver};

use crate::error::HwError;

type PendingSignal = Box<dyn Fn() + Send + Sync>;

struct CarState {
    position_mm: Cell<f32>,
    mm_per_level: f32,
    last_drive: Cell<i16>,
    ranging: Cell<bool>,
    sessions: Cell<u32>,
    sensor_fault: Cell<bool>,
    label: RefCell<Option<String>>,
    shown_distance: Cell<Option<u16>>,
    inbox: RefCell<VecDeque<Frame>>,
    sent: RefCell<Vec<Frame>>,
    send_fault: Cell<bool>,
    on_pending: RefCell<Option<PendingSignal>>,
}

/// Handle to the simulated car; clones share state.
#[derive(Clone)]
pub struct SimulatedCar {
    state: Rc<CarState>,
}

impl SimulatedCar {
    pub fn new(start_mm: u16, mm_per_level: f32) -> Self {
        SimulatedCar {
            state: Rc::new(CarState {
                position_mm: Cell::new(f32::from(start_mm)),
                mm_per_level,
                last_drive: Cell::new(0),
                ranging: Cell::new(false),
                sessions: Cell::new(0),
                sensor_fault: Cell::new(false),
                label: RefCell::new(None),
                shown_distance: Cell::new(None),
                inbox: RefCell::new(VecDeque::new()),
                sent: RefCell::new(Vec::new()),
                send_fault: Cell::new(false),
                on_pending: RefCell::new(None),
            }),
        }
    }

    pub fn sensor(&self) -> SimulatedSensor {
        SimulatedSensor { car: self.clone() }
    }

    pub fn dac(&self) -> SimulatedDac {
        SimulatedDac { car: self.clone() }
    }

    pub fn display(&self) -> SimulatedDisplay {
        SimulatedDisplay { car: self.clone() }
    }

    pub fn bus(&self) -> SimulatedBus {
        SimulatedBus { car: self.clone() }
    }

    /// Register the callback raised whenever a frame lands in the inbox.
    pub fn on_bus_pending(&self, f: impl Fn() + Send + Sync + 'static) {
        *self.state.on_pending.borrow_mut() = Some(Box::new(f));
    }

    /// Queue a frame as if another node had sent it.
    pub fn inject(&self, frame: Frame) {
        tracing::debug!(frame = %frame, "sim bus inject");
        self.state.inbox.borrow_mut().push_back(frame);
        if let Some(signal) = self.state.on_pending.borrow().as_ref() {
            signal();
        }
    }

    pub fn position_mm(&self) -> f32 {
        self.state.position_mm.get()
    }

    pub fn set_position_mm(&self, mm: f32) {
        self.state.position_mm.set(mm);
    }

    pub fn last_drive(&self) -> i16 {
        self.state.last_drive.get()
    }

    /// Number of completed ranging sessions (start followed by stop).
    pub fn ranging_sessions(&self) -> u32 {
        self.state.sessions.get()
    }

    pub fn is_ranging(&self) -> bool {
        self.state.ranging.get()
    }

    pub fn set_sensor_fault(&self, fault: bool) {
        self.state.sensor_fault.set(fault);
    }

    pub fn set_send_fault(&self, fault: bool) {
        self.state.send_fault.set(fault);
    }

    pub fn label(&self) -> Option<String> {
        self.state.label.borrow().clone()
    }

    pub fn shown_distance(&self) -> Option<u16> {
        self.state.shown_distance.get()
    }

    pub fn sent_frames(&self) -> Vec<Frame> {
        self.state.sent.borrow().clone()
    }
}

pub struct SimulatedSensor {
    car: SimulatedCar,
}

impl DistanceSensor for SimulatedSensor {
    fn start(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.car.state.ranging.set(true);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.car.state.ranging.replace(false) {
            let s = &self.car.state.sessions;
            s.set(s.get().saturating_add(1));
        }
        Ok(())
    }

    fn distance(&mut self) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        if !self.car.state.ranging.get() {
            return Err(Box::new(HwError::NotStarted));
        }
        if self.car.state.sensor_fault.get() {
            return Err(Box::new(HwError::Timeout));
        }
        let mm = self.car.position_mm().round().clamp(0.0, f32::from(u16::MAX)) as u16;
        tracing::trace!(distance_mm = mm, "sim sensor sample");
        Ok(mm)
    }
}

pub struct SimulatedDac {
    car: SimulatedCar,
}

impl MotorDriver for SimulatedDac {
    fn set_drive_level(
        &mut self,
        level: i16,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let st = &self.car.state;
        st.last_drive.set(level);
        let moved = f32::from(level) * st.mm_per_level;
        st.position_mm.set((st.position_mm.get() + moved).max(0.0));
        Ok(())
    }
}

pub struct SimulatedDisplay {
    car: SimulatedCar,
}

impl Display for SimulatedDisplay {
    fn show_floor_label(
        &mut self,
        label: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!(label, "display floor label");
        *self.car.state.label.borrow_mut() = Some(label.to_string());
        Ok(())
    }

    fn show_distance(&mut self, mm: u16) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.car.state.shown_distance.set(Some(mm));
        Ok(())
    }
}

pub struct SimulatedBus {
    car: SimulatedCar,
}

impl BusTransport for SimulatedBus {
    fn send(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.car.state.send_fault.get() {
            return Err(Box::new(HwError::Bus("transmit buffer full".into())));
        }
        self.car.state.sent.borrow_mut().push(frame.clone());
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.car.state.inbox.borrow_mut().pop_front())
    }
}
