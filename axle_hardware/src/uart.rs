use std::time::Duration;

use rppal::uart::{Parity, Uart};

use axle_traits::{BoxError, SerialPort};

use crate::error::{HwError, Result};
use crate::util::write_all_with_timeout;

const POLL_INTERVAL: Duration = Duration::from_micros(100);

/// 8N1 UART in non-blocking mode. Writes wait for the transmitter for at most
/// `write_timeout` per message.
pub struct UartSerial {
    uart: Uart,
    write_timeout: Duration,
}

impl UartSerial {
    pub fn open(device: Option<&str>, baud: u32, write_timeout: Duration) -> Result<Self> {
        let mut uart = match device {
            Some(path) => Uart::with_path(path, baud, Parity::None, 8, 1),
            None => Uart::new(baud, Parity::None, 8, 1),
        }
        .map_err(|e| HwError::Uart(e.to_string()))?;
        uart.set_read_mode(0, Duration::ZERO)
            .map_err(|e| HwError::Uart(e.to_string()))?;
        uart.set_write_mode(false)
            .map_err(|e| HwError::Uart(e.to_string()))?;
        tracing::info!(baud, device = device.unwrap_or("primary"), "uart opened");
        Ok(Self {
            uart,
            write_timeout,
        })
    }
}

impl SerialPort for UartSerial {
    fn write_all(&mut self, bytes: &[u8]) -> std::result::Result<(), BoxError> {
        let uart = &mut self.uart;
        write_all_with_timeout(
            |chunk| uart.write(chunk).map_err(|e| HwError::Uart(e.to_string())),
            bytes,
            self.write_timeout,
            POLL_INTERVAL,
        )?;
        Ok(())
    }

    fn read_byte(&mut self) -> std::result::Result<Option<u8>, BoxError> {
        let mut buf = [0u8; 1];
        let n = self
            .uart
            .read(&mut buf)
            .map_err(|e| HwError::Uart(e.to_string()))?;
        Ok((n == 1).then_some(buf[0]))
    }
}
