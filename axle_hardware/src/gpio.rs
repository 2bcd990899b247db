use rppal::gpio::{Gpio, InputPin, Level};

use axle_traits::{BoxError, CellInput, ControlInput, ControlLines};

use crate::error::{HwError, Result};

/// Cell input on a Raspberry Pi GPIO. The barrier pulls the line to `blocked_level`
/// while a wheel is in the beam.
pub struct GpioCell {
    pin: InputPin,
    blocked_level: Level,
}

impl GpioCell {
    pub fn new(pin: u8, active_low: bool) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let pin = gpio
            .get(pin)
            .map_err(|e| HwError::Gpio(e.to_string()))?
            .into_input_pullup();
        let blocked_level = if active_low { Level::Low } else { Level::High };
        Ok(Self { pin, blocked_level })
    }
}

impl CellInput for GpioCell {
    fn is_blocked(&mut self) -> std::result::Result<bool, BoxError> {
        Ok(self.pin.read() == self.blocked_level)
    }
}

/// Arm and (optional) wake inputs. Both are active high with pull-downs.
pub struct GpioLines {
    arm: InputPin,
    wake: Option<InputPin>,
}

impl GpioLines {
    pub fn new(arm_pin: u8, wake_pin: Option<u8>) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let arm = gpio
            .get(arm_pin)
            .map_err(|e| HwError::Gpio(e.to_string()))?
            .into_input_pulldown();
        let wake = match wake_pin {
            Some(p) => Some(
                gpio.get(p)
                    .map_err(|e| HwError::Gpio(e.to_string()))?
                    .into_input_pulldown(),
            ),
            None => None,
        };
        Ok(Self { arm, wake })
    }
}

impl ControlInput for GpioLines {
    fn lines(&mut self) -> std::result::Result<ControlLines, BoxError> {
        let arm = self.arm.is_high();
        // Without a wake line the device stays awake
        let wake = self.wake.as_ref().is_none_or(|p| p.is_high());
        Ok(ControlLines { arm, wake })
    }
}
