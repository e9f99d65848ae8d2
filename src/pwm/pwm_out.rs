use esp_idf_svc::{
    hal::{gpio::AnyIOPin, ledc::*, peripheral, prelude::*},
    sys::ESP_FAIL,
};

use crate::utils::peripherals::{Peripheral, PeripheralError};

const DUTY_RESOLUTION: Resolution = Resolution::Bits10;

/// Enums the different errors possible when working with the pwm output
#[derive(Debug)]
pub enum PwmOutError {
    ErrorSettingOutput,
    InvalidArg,
    InvalidFrequencyOrDuty,
    InvalidPeripheral(PeripheralError),
}

/// Driver for one pwm channel, keeping the period/pulse contract in
/// nanoseconds. The output frequency is fixed when the channel is
/// acquired; `set_period_and_pulse` maps the requested high-time onto the
/// duty range of the channel.
pub struct PwmOut<'a> {
    driver: LedcDriver<'a>,
}

impl<'a> PwmOut<'a> {
    /// Acquires the pwm channel described by the `channel` and `timer`
    /// tokens, bound to `pin`, with the output frequency `freq_hz`.
    ///
    /// # Errors
    ///
    /// - `PwmOutError::InvalidPeripheral`: If a token does not name a pwm channel or timer of this board
    /// - `PwmOutError::InvalidFrequencyOrDuty`: If the frequency and resolution are not compatible
    /// - `PwmOutError::InvalidArg`: If the underlying driver rejects the configuration
    pub fn new(
        channel: Peripheral,
        timer: Peripheral,
        pin: AnyIOPin,
        freq_hz: u32,
    ) -> Result<PwmOut<'a>, PwmOutError> {
        let config = config::TimerConfig::new()
            .frequency(freq_hz.Hz())
            .resolution(DUTY_RESOLUTION);

        let driver = match timer {
            Peripheral::PWMTimer(0) => {
                Self::create_driver(channel, unsafe { TIMER0::new() }, pin, &config)
            }
            Peripheral::PWMTimer(1) => {
                Self::create_driver(channel, unsafe { TIMER1::new() }, pin, &config)
            }
            Peripheral::PWMTimer(2) => {
                Self::create_driver(channel, unsafe { TIMER2::new() }, pin, &config)
            }
            Peripheral::PWMTimer(3) => {
                Self::create_driver(channel, unsafe { TIMER3::new() }, pin, &config)
            }
            _ => Err(PwmOutError::InvalidPeripheral(PeripheralError::NotAPwmTimer)),
        }?;

        Ok(PwmOut { driver })
    }

    fn create_driver<T: 'a + LedcTimer<SpeedMode = LowSpeed>>(
        channel: Peripheral,
        timer: impl peripheral::Peripheral<P = T> + 'a,
        pin: AnyIOPin,
        config: &config::TimerConfig,
    ) -> Result<LedcDriver<'a>, PwmOutError> {
        let timer_driver = LedcTimerDriver::new(timer, config).map_err(|error| match error.code() {
            ESP_FAIL => PwmOutError::InvalidFrequencyOrDuty,
            _ => PwmOutError::InvalidArg,
        })?;

        match channel {
            Peripheral::PWMChannel(0) => {
                LedcDriver::new(unsafe { CHANNEL0::new() }, timer_driver, pin)
            }
            Peripheral::PWMChannel(1) => {
                LedcDriver::new(unsafe { CHANNEL1::new() }, timer_driver, pin)
            }
            Peripheral::PWMChannel(2) => {
                LedcDriver::new(unsafe { CHANNEL2::new() }, timer_driver, pin)
            }
            Peripheral::PWMChannel(3) => {
                LedcDriver::new(unsafe { CHANNEL3::new() }, timer_driver, pin)
            }
            _ => {
                return Err(PwmOutError::InvalidPeripheral(
                    PeripheralError::NotAPwmChannel,
                ))
            }
        }
        .map_err(|_| PwmOutError::InvalidArg)
    }

    /// Starts driving the pin with the channel output.
    pub fn enable(&mut self) -> Result<(), PwmOutError> {
        self.driver
            .enable()
            .map_err(|_| PwmOutError::ErrorSettingOutput)
    }

    /// Stops driving the pin, leaving it at the idle level.
    pub fn disable(&mut self) -> Result<(), PwmOutError> {
        self.driver
            .disable()
            .map_err(|_| PwmOutError::ErrorSettingOutput)
    }

    /// Programs one pwm cycle: `pulse_ns` of high-time within a period of
    /// `period_ns`. The period must match the frequency the channel was
    /// acquired with; the pulse is what changes between calls.
    ///
    /// # Errors
    ///
    /// - `PwmOutError::InvalidArg`: If `period_ns` is zero
    /// - `PwmOutError::ErrorSettingOutput`: If the duty update is rejected by the driver
    pub fn set_period_and_pulse(
        &mut self,
        period_ns: u32,
        pulse_ns: u32,
    ) -> Result<(), PwmOutError> {
        if period_ns == 0 {
            return Err(PwmOutError::InvalidArg);
        }
        let duty = duty_ticks(self.driver.get_max_duty(), period_ns, pulse_ns);
        self.driver
            .set_duty(duty)
            .map_err(|_| PwmOutError::ErrorSettingOutput)
    }
}

/// Maps an absolute high-time within the period to the tick count the
/// channel resolution allows. The multiply runs in u64 before the divide
/// so no precision is lost. Pulses longer than the period saturate at
/// full duty.
fn duty_ticks(max_duty: u32, period_ns: u32, pulse_ns: u32) -> u32 {
    let ticks = pulse_ns as u64 * max_duty as u64 / period_ns as u64;
    ticks.min(max_duty as u64) as u32
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test0_half_pulse_is_half_of_the_duty_range() {
        assert_eq!(duty_ticks(1023, 1_000_000, 500_000), 511);
    }

    #[test]
    fn test1_zero_pulse_is_zero_duty() {
        assert_eq!(duty_ticks(1023, 1_000_000, 0), 0);
    }

    #[test]
    fn test2_full_pulse_is_max_duty() {
        assert_eq!(duty_ticks(1023, 1_000_000, 1_000_000), 1023);
    }

    #[test]
    fn test3_pulse_longer_than_period_saturates() {
        assert_eq!(duty_ticks(1023, 1_000_000, 2_000_000), 1023);
    }
}
