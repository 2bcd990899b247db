use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("serial error: {0}")]
    Serial(String),
    #[error("timeout waiting for serial transmitter")]
    Timeout,
    #[error("configuration error: {0}")]
    Config(String),
    #[error("framing error: {0}")]
    Frame(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing serial port")]
    MissingPort,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
