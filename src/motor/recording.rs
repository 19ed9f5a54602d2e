// In-memory devices that record every write
//
// Used by the audit command and the tests. Clones share one log, so a handle kept by the caller
// sees everything the motor wrote after taking ownership of its own clone.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use super::error::BusResult;
use super::limits::LimitDirection;
use super::phoenix::{TalonDemand, TalonDevice, TalonFaults, TalonParam, TalonSignal};
use super::rev::{SparkDevice, SparkFault, SparkParam, SparkReference, SparkSignal};
use crate::config::NOMINAL_BATTERY_VOLTAGE;

#[derive(Debug, Default)]
struct TalonLog {
    params: Vec<TalonParam>,
    demands: Vec<TalonDemand>,
    signals: HashMap<TalonSignal, f64>,
    switches: HashMap<LimitDirection, bool>,
    faults: TalonFaults,
}

#[derive(Debug, Clone)]
pub struct RecordingTalon {
    id: u8,
    log: Rc<RefCell<TalonLog>>,
}

impl RecordingTalon {
    /// A device on `id` reporting a 12 V bus
    pub fn new(id: u8) -> Self {
        let talon = Self {
            id,
            log: Rc::default(),
        };
        talon.set_signal(TalonSignal::BusVoltage, NOMINAL_BATTERY_VOLTAGE);
        talon
    }

    pub fn params(&self) -> Vec<TalonParam> {
        self.log.borrow().params.clone()
    }

    pub fn demands(&self) -> Vec<TalonDemand> {
        self.log.borrow().demands.clone()
    }

    pub fn last_demand(&self) -> Option<TalonDemand> {
        self.log.borrow().demands.last().copied()
    }

    /// Forget recorded writes, keeping signals and switch states
    pub fn clear(&self) {
        let mut log = self.log.borrow_mut();
        log.params.clear();
        log.demands.clear();
    }

    pub fn set_signal(&self, signal: TalonSignal, value: f64) {
        self.log.borrow_mut().signals.insert(signal, value);
    }

    pub fn set_limit_switch_closed(&self, direction: LimitDirection, closed: bool) {
        self.log.borrow_mut().switches.insert(direction, closed);
    }

    pub fn set_faults(&self, faults: TalonFaults) {
        self.log.borrow_mut().faults = faults;
    }
}

impl TalonDevice for RecordingTalon {
    fn device_id(&self) -> u8 {
        self.id
    }

    fn configure(&mut self, param: TalonParam) -> BusResult<()> {
        debug!("Talon {}: {:?}", self.id, param);
        let mut log = self.log.borrow_mut();
        if let TalonParam::SelectedSensorPosition(position) = param {
            log.signals.insert(TalonSignal::SensorPosition, position);
        }
        log.params.push(param);
        Ok(())
    }

    fn set(&mut self, demand: TalonDemand) -> BusResult<()> {
        self.log.borrow_mut().demands.push(demand);
        Ok(())
    }

    fn read(&self, signal: TalonSignal) -> BusResult<f64> {
        Ok(self.log.borrow().signals.get(&signal).copied().unwrap_or(0.0))
    }

    fn limit_switch_closed(&self, direction: LimitDirection) -> BusResult<bool> {
        Ok(self.log.borrow().switches.get(&direction).copied().unwrap_or(false))
    }

    fn faults(&self) -> BusResult<TalonFaults> {
        Ok(self.log.borrow().faults)
    }
}

#[derive(Debug, Default)]
struct SparkLog {
    params: Vec<SparkParam>,
    references: Vec<SparkReference>,
    signals: HashMap<SparkSignal, f64>,
    switches: HashMap<(u8, LimitDirection), bool>,
    faults: HashMap<SparkFault, bool>,
}

#[derive(Debug, Clone)]
pub struct RecordingSpark {
    id: u8,
    log: Rc<RefCell<SparkLog>>,
}

impl RecordingSpark {
    pub fn new(id: u8) -> Self {
        let spark = Self {
            id,
            log: Rc::default(),
        };
        spark.set_signal(SparkSignal::BusVoltage, NOMINAL_BATTERY_VOLTAGE);
        spark
    }

    pub fn params(&self) -> Vec<SparkParam> {
        self.log.borrow().params.clone()
    }

    pub fn references(&self) -> Vec<SparkReference> {
        self.log.borrow().references.clone()
    }

    pub fn last_reference(&self) -> Option<SparkReference> {
        self.log.borrow().references.last().copied()
    }

    pub fn clear(&self) {
        let mut log = self.log.borrow_mut();
        log.params.clear();
        log.references.clear();
    }

    pub fn set_signal(&self, signal: SparkSignal, value: f64) {
        self.log.borrow_mut().signals.insert(signal, value);
    }

    /// Pressed state of the switch on controller `source`
    pub fn set_limit_switch_pressed(&self, source: u8, direction: LimitDirection, pressed: bool) {
        self.log
            .borrow_mut()
            .switches
            .insert((source, direction), pressed);
    }

    pub fn set_fault(&self, fault: SparkFault, active: bool) {
        self.log.borrow_mut().faults.insert(fault, active);
    }
}

impl SparkDevice for RecordingSpark {
    fn device_id(&self) -> u8 {
        self.id
    }

    fn configure(&mut self, param: SparkParam) -> BusResult<()> {
        debug!("SPARK MAX {}: {:?}", self.id, param);
        let mut log = self.log.borrow_mut();
        if let SparkParam::EncoderPosition(position) = param {
            log.signals.insert(SparkSignal::Position, position);
        }
        log.params.push(param);
        Ok(())
    }

    fn set_reference(&mut self, reference: SparkReference) -> BusResult<()> {
        self.log.borrow_mut().references.push(reference);
        Ok(())
    }

    fn read(&self, signal: SparkSignal) -> BusResult<f64> {
        Ok(self.log.borrow().signals.get(&signal).copied().unwrap_or(0.0))
    }

    fn limit_switch_pressed(&self, source: u8, direction: LimitDirection) -> BusResult<bool> {
        Ok(self
            .log
            .borrow()
            .switches
            .get(&(source, direction))
            .copied()
            .unwrap_or(false))
    }

    fn fault(&self, fault: SparkFault) -> BusResult<bool> {
        Ok(self.log.borrow().faults.get(&fault).copied().unwrap_or(false))
    }
}
