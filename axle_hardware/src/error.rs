use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("uart error: {0}")]
    Uart(String),
    #[error("serial transmit timeout after {sent} of {total} bytes")]
    TransmitTimeout { sent: usize, total: usize },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
