use thiserror::Error;

#[derive(Debug, Error)]
pub enum GpsError {
    #[error("cannot connect to gpsd at {0}")]
    Connect(String),
    #[error("gps read timeout")]
    Timeout,
    #[error("gpsd protocol error: {0}")]
    Protocol(String),
    #[error("malformed gps data: {0}")]
    Parse(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GpsError>;
