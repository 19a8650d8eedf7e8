use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RallyError {
    #[error("gps error: {0}")]
    Gps(String),
    #[error("gps fault: {0}")]
    GpsFault(String),
    #[error("timeout waiting for gps")]
    Timeout,
    #[error("no usable gps fix")]
    NoFix,
    #[error("cancelled")]
    Cancelled,
    #[error("{0}")]
    InvalidInstruction(String),
    #[error("cannot derive instruction: {0}")]
    DegenerateInstruction(&'static str),
    #[error("calibration failed: {0}")]
    Calibration(String),
    #[error("{0}")]
    Input(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("could not save calibration: {0}")]
    Persist(String),
}

pub type Result<T> = std::result::Result<T, RallyError>;
