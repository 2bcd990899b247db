use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Push `bytes` through a non-blocking `write` until all of them are accepted,
/// or fail once `timeout` has elapsed without the transmitter draining.
/// A `write` that accepts nothing counts as "transmitter busy" and sleeps for
/// `poll_interval` before retrying.
pub fn write_all_with_timeout(
    mut write: impl FnMut(&[u8]) -> Result<usize>,
    bytes: &[u8],
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    let mut sent = 0usize;
    while sent < bytes.len() {
        let n = write(&bytes[sent..])?;
        sent += n;
        if n == 0 && sent < bytes.len() {
            if Instant::now() >= deadline {
                return Err(HwError::TransmitTimeout {
                    sent,
                    total: bytes.len(),
                });
            }
            std::thread::sleep(poll_interval);
        }
    }
    Ok(())
}
