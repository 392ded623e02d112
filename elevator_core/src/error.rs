use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ElevatorError {
    #[error("sensor error: {0}")]
    Sensor(String),
    #[error("timeout waiting for distance sensor")]
    Timeout,
    #[error("motor error: {0}")]
    Motor(String),
    #[error("display error: {0}")]
    Display(String),
    #[error("bus error: {0}")]
    Bus(String),
    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing distance sensor")]
    MissingSensor,
    #[error("missing motor driver")]
    MissingMotor,
    #[error("missing bus transport")]
    MissingBus,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
