use crate::{
    breath::BreathError,
    pwm::PwmOutError,
    utils::peripherals::PeripheralError,
};

/// Groups every error the crate can surface, so callers above the driver
/// layer can hold a single type.
#[derive(Debug)]
pub enum PwmBreathError {
    BreathError(BreathError),
    PeripheralError(PeripheralError),
    PwmOutError(PwmOutError),
}

impl From<BreathError> for PwmBreathError {
    fn from(value: BreathError) -> Self {
        PwmBreathError::BreathError(value)
    }
}

impl From<PeripheralError> for PwmBreathError {
    fn from(value: PeripheralError) -> Self {
        PwmBreathError::PeripheralError(value)
    }
}

impl From<PwmOutError> for PwmBreathError {
    fn from(value: PwmOutError) -> Self {
        PwmBreathError::PwmOutError(value)
    }
}
